//! Issue a certificate from an existing CA and check it.
//!
//! ```sh
//! cargo run --example issue -- ca.key ca.pem test.acme.com
//! ```

use certshell::cert::params::{CertificateRequestInfo, DistinguishedName, IssueOptions};
use certshell::issuer::CertificateAuthority;
use certshell::verify::{Verifier, VerifyOptions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let (Some(ca_key), Some(ca_cert)) = (args.next(), args.next()) else {
        eprintln!("usage: issue <ca-key> <ca-cert> [common-name]");
        std::process::exit(2);
    };
    let common_name = args.next().unwrap_or_else(|| "test.acme.com".to_string());

    let ca = CertificateAuthority::new(&ca_key, &ca_cert);

    let subject = DistinguishedName::builder()
        .country("US".to_string())
        .organization("Acme".to_string())
        .common_name(common_name.clone())
        .build();
    let info = CertificateRequestInfo::builder()
        .subject(subject)
        .subject_alt_name(format!("DNS:{common_name}"))
        .build();
    let options = IssueOptions::builder()
        .prefix("demo".to_string())
        .validity_days(825)
        .build();

    let issued = ca.generate_cert_buffer(&info, &options).await?;
    println!("{}", issued.fingerprint);
    println!("subject hash: {}", issued.hash);
    println!("{}", String::from_utf8_lossy(&issued.certificate));

    let verifier = Verifier::new();
    let expires = verifier.check_certificate_expiration(&issued.certificate).await?;
    println!("expires: {expires}");

    let status = verifier
        .verify_certificate_key(
            &issued.certificate,
            &issued.key,
            &VerifyOptions::builder().ca_file(ca_cert.into()).build(),
        )
        .await?;
    println!(
        "verified by CA: {}, key matches: {}",
        status.certificate.as_ref().is_some_and(|c| c.ca_verified),
        status.matches()
    );

    Ok(())
}
