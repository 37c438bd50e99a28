//! Certificate and key checks delegated to `openssl`.
//!
//! Certificates and keys are passed as PEM bytes on the tool's standard input.
//! Confirming a self-signature is the one check that needs a temporary file,
//! since the certificate then also serves as its own `-CAfile`.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use bon::Builder;
use time::OffsetDateTime;
use tracing::debug;

use crate::artifact::Scratch;
use crate::error::{CertShellError, Result, VerifyCertificateKeyError};
use crate::output;
use crate::tool::{OpenSsl, ToolOutput};

/// Outcome of `openssl verify` for one certificate.
///
/// # Fields
/// * `valid` - The certificate verified, or only its issuer was unavailable.
/// * `ca_verified` - Valid and the chain verified without any error.
/// * `self_signed` - The certificate names itself as issuer and is signed by its own key.
/// * `output` - Raw tool output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateStatus {
    pub valid: bool,
    pub ca_verified: bool,
    pub self_signed: bool,
    pub output: String,
}

/// Outcome of `openssl rsa -check`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyStatus {
    pub valid: bool,
    pub output: String,
}

/// RSA moduli of a certificate and a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModulusComparison {
    pub matches: bool,
    pub certificate_modulus: String,
    pub key_modulus: String,
}

/// Everything [`Verifier::verify_certificate_key`] found out.
///
/// A field is `None` when its step did not run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateKeyStatus {
    pub certificate: Option<CertificateStatus>,
    pub key: Option<KeyStatus>,
    pub moduli: Option<ModulusComparison>,
}

impl CertificateKeyStatus {
    /// Whether the certificate and key share a modulus.
    pub fn matches(&self) -> bool {
        self.moduli.as_ref().is_some_and(|m| m.matches)
    }
}

/// Options for [`Verifier::verify_certificate_key`].
///
/// # Fields
/// * `ca_file` - Trusted certificates passed as `-CAfile`.
/// * `passphrase` - Passphrase of an encrypted private key.
#[derive(Debug, Clone, Default, Builder)]
pub struct VerifyOptions {
    pub ca_file: Option<PathBuf>,
    pub passphrase: Option<String>,
}

/// Runs certificate and key checks through openssl.
#[derive(Debug, Clone)]
pub struct Verifier {
    openssl: OpenSsl,
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Verifier {
    /// Uses the tool picked by [`OpenSsl::from_env`].
    pub fn new() -> Self {
        Self::with_openssl(OpenSsl::from_env())
    }

    pub fn with_openssl(openssl: OpenSsl) -> Self {
        Self { openssl }
    }

    /// Returns the `notAfter` time of a PEM certificate.
    pub async fn check_certificate_expiration(&self, cert: &[u8]) -> Result<OffsetDateTime> {
        let output = self
            .openssl
            .run(&["x509", "-noout", "-enddate"], Some(cert))
            .await?;
        ensure_certificate_loaded(&output)?;
        if !output.success() {
            return Err(output.into_error());
        }
        output::parse_end_date(&output.stdout)
    }

    /// Verifies a PEM certificate, against `ca_file` when given.
    ///
    /// A certificate the tool cannot load is an
    /// [`InvalidCertificate`](CertShellError::InvalidCertificate) error; any
    /// verification failure is reported through the returned status instead.
    pub async fn verify_certificate(
        &self,
        cert: &[u8],
        ca_file: Option<&Path>,
    ) -> Result<CertificateStatus> {
        let mut args = vec![OsStr::new("verify")];
        if let Some(ca_file) = ca_file {
            args.push(OsStr::new("-CAfile"));
            args.push(ca_file.as_os_str());
        }
        let output = self.openssl.run(&args, Some(cert)).await?;
        ensure_certificate_loaded(&output)?;

        let text = output.combined();
        let outcome = output::classify_verify(&text);
        let self_signed = (outcome.self_signed || self.is_self_issued(cert).await?)
            && self.is_signed_by_own_key(cert).await?;
        debug!(
            valid = outcome.valid,
            ca_verified = outcome.ca_verified,
            self_signed,
            "verified certificate"
        );

        Ok(CertificateStatus {
            valid: outcome.valid,
            ca_verified: outcome.ca_verified,
            self_signed,
            output: text,
        })
    }

    /// Checks the consistency of a PEM RSA private key.
    ///
    /// The passphrase is always supplied (empty when `None`) so the tool never
    /// prompts on a terminal.
    pub async fn verify_key(&self, key: &[u8], passphrase: Option<&str>) -> Result<KeyStatus> {
        let passin = passin_arg(passphrase);
        let output = self
            .openssl
            .run(
                &["rsa", "-noout", "-check", "-passin", passin.as_str()],
                Some(key),
            )
            .await?;
        let text = output.combined();

        let check_failed = output::key_check_failed(&text);
        if output::key_load_failed(&text) || (!output.success() && !check_failed) {
            return Err(CertShellError::InvalidKey(text.trim().to_string()));
        }
        debug!(valid = !check_failed, "checked key");

        Ok(KeyStatus {
            valid: !check_failed,
            output: text,
        })
    }

    /// Compares the RSA modulus of a PEM certificate with that of a PEM key.
    pub async fn compare_moduli(
        &self,
        cert: &[u8],
        key: &[u8],
        passphrase: Option<&str>,
    ) -> Result<ModulusComparison> {
        let cert_output = self
            .openssl
            .run(&["x509", "-noout", "-modulus"], Some(cert))
            .await?;
        ensure_certificate_loaded(&cert_output)?;
        if !cert_output.success() {
            return Err(cert_output.into_error());
        }
        let certificate_modulus = output::parse_modulus(&cert_output.stdout)?;

        let passin = passin_arg(passphrase);
        let key_output = self
            .openssl
            .run(
                &["rsa", "-noout", "-modulus", "-passin", passin.as_str()],
                Some(key),
            )
            .await?;
        if !key_output.success() || output::key_load_failed(&key_output.stderr) {
            return Err(CertShellError::InvalidKey(
                key_output.combined().trim().to_string(),
            ));
        }
        let key_modulus = output::parse_modulus(&key_output.stdout)?;

        Ok(ModulusComparison {
            matches: certificate_modulus == key_modulus,
            certificate_modulus,
            key_modulus,
        })
    }

    /// Verifies a certificate, then its key, then that the two belong together.
    ///
    /// Stops at the first error, which is returned together with the statuses
    /// gathered up to that point.
    pub async fn verify_certificate_key(
        &self,
        cert: &[u8],
        key: &[u8],
        options: &VerifyOptions,
    ) -> std::result::Result<CertificateKeyStatus, VerifyCertificateKeyError> {
        let mut status = CertificateKeyStatus::default();
        match self.collect_status(cert, key, options, &mut status).await {
            Ok(()) => Ok(status),
            Err(source) => Err(VerifyCertificateKeyError {
                partial: status,
                source,
            }),
        }
    }

    async fn collect_status(
        &self,
        cert: &[u8],
        key: &[u8],
        options: &VerifyOptions,
        status: &mut CertificateKeyStatus,
    ) -> Result<()> {
        let passphrase = options.passphrase.as_deref();
        status.certificate = Some(
            self.verify_certificate(cert, options.ca_file.as_deref())
                .await?,
        );
        status.key = Some(self.verify_key(key, passphrase).await?);
        status.moduli = Some(self.compare_moduli(cert, key, passphrase).await?);
        Ok(())
    }

    async fn is_self_issued(&self, cert: &[u8]) -> Result<bool> {
        let output = self
            .openssl
            .run(&["x509", "-noout", "-subject", "-issuer"], Some(cert))
            .await?;
        if !output.success() {
            return Ok(false);
        }
        Ok(output::parse_subject_and_issuer(&output.stdout)
            .is_some_and(|(subject, issuer)| subject == issuer))
    }

    /// Verifies `cert` with itself as the only trust anchor, checking the
    /// anchor's signature as well.
    async fn is_signed_by_own_key(&self, cert: &[u8]) -> Result<bool> {
        let mut scratch = Scratch::new("selfsig", false);
        let anchor = scratch.create("", ".pem")?;
        tokio::fs::write(&anchor, cert)
            .await
            .map_err(|e| CertShellError::filesystem(&anchor, e))?;

        let args = [
            OsStr::new("verify"),
            OsStr::new("-check_ss_sig"),
            OsStr::new("-CAfile"),
            anchor.as_os_str(),
        ];
        let output = self.openssl.run(&args, Some(cert)).await?;
        let confirmed = output.success() && output::classify_verify(&output.combined()).ca_verified;
        debug!(confirmed, "checked self-signature");
        Ok(confirmed)
    }
}

fn ensure_certificate_loaded(output: &ToolOutput) -> Result<()> {
    let text = output.combined();
    if output::certificate_load_failed(&text) {
        return Err(CertShellError::InvalidCertificate(text.trim().to_string()));
    }
    Ok(())
}

fn passin_arg(passphrase: Option<&str>) -> String {
    format!("pass:{}", passphrase.unwrap_or_default())
}
