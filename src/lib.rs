//! # CertShell - Certificate Issuance and Verification through OpenSSL
//!
//! CertShell issues and checks X.509 certificates and RSA keypairs by driving the
//! `openssl` command-line tool. It writes the small configuration files openssl
//! needs, runs the tool as an async subprocess, and reads its textual output.
//! All cryptography (key generation, signing, verification) is done by openssl.
//!
//! ## Pipelines
//!
//! - **Issuance**: generate an RSA key, write a request config and an
//!   extensions file, create a certificate request, and sign it with a CA.
//! - **Verification**: read a certificate's expiry, verify it against a CA
//!   bundle, check a private key, and compare the moduli of a certificate and
//!   a key.
//!
//! ## Quick Start
//!
//! ### Issuing a Certificate
//!
//! ```rust,no_run
//! use certshell::{
//!     cert::params::{CertificateRequestInfo, DistinguishedName, IssueOptions},
//!     issuer::CertificateAuthority,
//! };
//!
//! # async fn run() -> certshell::error::Result<()> {
//! let ca = CertificateAuthority::new("ca.key", "ca.pem");
//!
//! let subject = DistinguishedName::builder()
//!     .country("US".to_string())
//!     .organization("Acme".to_string())
//!     .common_name("test.acme.com".to_string())
//!     .build();
//!
//! let info = CertificateRequestInfo::builder()
//!     .subject(subject)
//!     .subject_alt_name("DNS:test.acme.com,DNS:www.acme.com".to_string())
//!     .build();
//!
//! let options = IssueOptions::builder()
//!     .prefix("acme".to_string())
//!     .validity_days(90)
//!     .build();
//!
//! let issued = ca.generate_cert_buffer(&info, &options).await?;
//! println!("{}", issued.fingerprint);
//! println!("{}", String::from_utf8_lossy(&issued.certificate));
//! # Ok(())
//! # }
//! ```
//!
//! ### Verifying a Certificate and its Key
//!
//! ```rust,no_run
//! use certshell::verify::{Verifier, VerifyOptions};
//!
//! # async fn run(cert: &[u8], key: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
//! let verifier = Verifier::new();
//! let options = VerifyOptions::builder().ca_file("ca.pem".into()).build();
//!
//! let status = verifier.verify_certificate_key(cert, key, &options).await?;
//! assert!(status.matches());
//!
//! let expires = verifier.check_certificate_expiration(cert).await?;
//! println!("expires {expires}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Temporary Files
//!
//! Every file an issuance run creates is owned by that run. Intermediate files
//! are removed when the run ends, on success and on failure, unless
//! [`IssueOptions::keep_files`](cert::params::IssueOptions) is set. The key and
//! certificate are handed back as [`Artifact`](artifact::Artifact)s that remove
//! themselves when dropped unless kept.
//!
//! ## Configuration
//!
//! The `openssl` binary is looked up on `PATH`. Set `CERTSHELL_OPENSSL` to use
//! another one, or pass an [`OpenSsl`](tool::OpenSsl) handle explicitly.
//!
//! ## Error Handling
//!
//! ```rust,no_run
//! use certshell::{error::CertShellError, verify::Verifier};
//!
//! # async fn run() {
//! match Verifier::new().verify_certificate(b"not a certificate", None).await {
//!     Ok(status) => println!("valid: {}", status.valid),
//!     Err(CertShellError::InvalidCertificate(msg)) => println!("cannot load: {}", msg),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`cert`]: Request config rendering and the individual issuance steps
//! - [`issuer`]: The issuance pipeline run against a CA
//! - [`verify`]: Expiry, certificate, key and modulus checks
//! - [`artifact`]: Temporary file ownership and cleanup
//! - [`tool`]: The openssl subprocess runner
//! - [`output`]: Parsers for openssl's textual output
//! - [`error`]: Error types

pub mod artifact;
pub mod cert;
pub mod error;
pub mod issuer;
pub mod output;
pub mod tool;
pub mod verify;

pub use error::{CertShellError, Result};
pub use issuer::CertificateAuthority;
pub use tool::OpenSsl;
pub use verify::Verifier;
