mod util;

use certshell::cert::params::{CertificateRequestInfo, DistinguishedName, IssueOptions};
use certshell::error::CertShellError;
use certshell::issuer::CertificateAuthority;
use certshell::verify::Verifier;
use regex::Regex;
use time::{Duration, OffsetDateTime};

/// Issues the `test.acme.com` certificate and checks the files, fingerprint and hash.
#[tokio::test]
async fn test_generate_cert() {
    let ca = util::generate_ca();
    let out = tempfile::tempdir().unwrap();

    let issued = ca
        .authority
        .generate_cert(&util::acme_request("test.acme.com", None), &util::options_in(out.path()))
        .await
        .unwrap();

    let key = std::fs::read_to_string(issued.key_path()).unwrap();
    let cert = std::fs::read_to_string(issued.certificate_path()).unwrap();
    assert!(key.starts_with("-----BEGIN") && key.contains("PRIVATE KEY-----"));
    assert!(cert.starts_with("-----BEGIN CERTIFICATE-----"));

    let fingerprint_regex = Regex::new(r"^(?i)sha1 Fingerprint=([0-9A-F]{2}:){19}[0-9A-F]{2}$").unwrap();
    let hash_regex = Regex::new(r"^[0-9a-f]{8}$").unwrap();
    assert!(
        fingerprint_regex.is_match(&issued.fingerprint),
        "unexpected fingerprint {:?}",
        issued.fingerprint
    );
    assert!(hash_regex.is_match(&issued.hash), "unexpected hash {:?}", issued.hash);

    let key_name = issued.key_path().file_name().unwrap().to_string_lossy().into_owned();
    let cert_name = issued
        .certificate_path()
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned();
    assert!(key_name.starts_with("test-") && key_name.ends_with(".pem"));
    assert!(cert_name.starts_with("test-cert-") && cert_name.ends_with(".pem"));

    // Only the key and certificate survive the run.
    let mut expected = vec![key_name, cert_name];
    expected.sort();
    assert_eq!(util::files_in(out.path()), expected);

    drop(issued);
    assert!(util::files_in(out.path()).is_empty());
}

#[tokio::test]
async fn test_generate_cert_keep_files() {
    let ca = util::generate_ca();
    let out = tempfile::tempdir().unwrap();
    let options = IssueOptions {
        keep_files: true,
        ..util::options_in(out.path())
    };

    let issued = ca
        .authority
        .generate_cert(&util::acme_request("keep.acme.com", None), &options)
        .await
        .unwrap();
    assert!(issued.key.is_kept());
    assert!(issued.certificate.is_kept());
    drop(issued);

    let files = util::files_in(out.path());
    assert_eq!(files.len(), 5, "unexpected files {files:?}");
    assert_eq!(files.iter().filter(|f| f.ends_with(".cfg")).count(), 1);
    assert_eq!(files.iter().filter(|f| f.ends_with(".ext")).count(), 1);
    assert_eq!(files.iter().filter(|f| f.starts_with("test-csr-")).count(), 1);
    assert_eq!(files.iter().filter(|f| f.starts_with("test-cert-")).count(), 1);
}

#[tokio::test]
async fn test_generate_cert_buffer() {
    let ca = util::generate_ca();
    let out = tempfile::tempdir().unwrap();

    let issued = ca
        .authority
        .generate_cert_buffer(
            &util::acme_request("buffer.acme.com", Some("DNS:buffer.acme.com")),
            &util::options_in(out.path()),
        )
        .await
        .unwrap();

    assert!(issued.certificate.starts_with(b"-----BEGIN CERTIFICATE-----"));
    assert!(issued.key.starts_with(b"-----BEGIN"));
    assert!(!issued.fingerprint.is_empty());
    assert_eq!(issued.hash.len(), 8);
    assert!(util::files_in(out.path()).is_empty());
}

#[tokio::test]
async fn test_default_validity_is_in_future() {
    let ca = util::generate_ca();
    let out = tempfile::tempdir().unwrap();
    let issued = ca
        .authority
        .generate_cert_buffer(&util::acme_request("default.acme.com", None), &util::options_in(out.path()))
        .await
        .unwrap();

    let expiry = Verifier::new()
        .check_certificate_expiration(&issued.certificate)
        .await
        .unwrap();
    assert!(expiry > OffsetDateTime::now_utc());
}

#[tokio::test]
async fn test_validity_days() {
    let ca = util::generate_ca();
    let out = tempfile::tempdir().unwrap();
    let options = IssueOptions {
        validity_days: Some(10),
        ..util::options_in(out.path())
    };
    let issued = ca
        .authority
        .generate_cert_buffer(&util::acme_request("days.acme.com", None), &options)
        .await
        .unwrap();

    let expiry = Verifier::new()
        .check_certificate_expiration(&issued.certificate)
        .await
        .unwrap();
    let expected = OffsetDateTime::now_utc() + Duration::days(10);
    let drift = (expiry.date() - expected.date()).whole_days().abs();
    assert!(drift <= 1, "expiry {expiry} is not ten days out");
}

#[tokio::test]
async fn test_failed_signing_removes_intermediate_files() {
    let ca = util::generate_ca();
    let out = tempfile::tempdir().unwrap();
    let broken = CertificateAuthority::new(ca.dir.path().join("missing.key"), &ca.cert_path);

    let err = broken
        .generate_cert(&util::acme_request("fail.acme.com", None), &util::options_in(out.path()))
        .await
        .unwrap_err();
    assert!(matches!(err, CertShellError::ToolError { .. }), "unexpected error {err:?}");
    assert!(util::files_in(out.path()).is_empty());
}

#[tokio::test]
async fn test_line_break_in_subject_is_rejected() {
    let ca = util::generate_ca();
    let out = tempfile::tempdir().unwrap();
    let info = CertificateRequestInfo::builder()
        .subject(DistinguishedName::from_fields([("CN", "a\nprompt = yes")]))
        .build();

    let err = ca
        .authority
        .generate_cert(&info, &util::options_in(out.path()))
        .await
        .unwrap_err();
    assert!(matches!(err, CertShellError::InvalidInput(_)));
    assert!(util::files_in(out.path()).is_empty());
}

#[tokio::test]
async fn test_missing_openssl_binary() {
    let out = tempfile::tempdir().unwrap();
    let authority = CertificateAuthority::new("ca.key", "ca.pem")
        .with_openssl(certshell::OpenSsl::with_program("/nonexistent/certshell-openssl"));

    let err = authority
        .generate_cert(&util::acme_request("x.acme.com", None), &util::options_in(out.path()))
        .await
        .unwrap_err();
    assert!(matches!(err, CertShellError::SpawnError { .. }));
    assert!(util::files_in(out.path()).is_empty());
}
