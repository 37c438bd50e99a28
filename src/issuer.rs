use std::path::{Path, PathBuf};

use tracing::info;

use crate::artifact::Scratch;
use crate::cert::params::{CertificateRequestInfo, IssueOptions};
use crate::cert::{
    self, IssuedCertificate, IssuedCertificateBuffer, create_cert_request_config,
    create_extensions_file,
};
use crate::error::Result;
use crate::tool::OpenSsl;

/// A certificate authority whose key and certificate live on disk.
///
/// Issues certificates by driving openssl through the keypair, request
/// config, extensions, request and signing steps in order.
#[derive(Debug, Clone)]
pub struct CertificateAuthority {
    openssl: OpenSsl,
    key_path: PathBuf,
    cert_path: PathBuf,
}

impl CertificateAuthority {
    /// Creates an authority signing with the PEM key and certificate at the given paths.
    pub fn new(key_path: impl Into<PathBuf>, cert_path: impl Into<PathBuf>) -> Self {
        Self {
            openssl: OpenSsl::from_env(),
            key_path: key_path.into(),
            cert_path: cert_path.into(),
        }
    }

    /// Uses `openssl` instead of the tool picked by [`OpenSsl::from_env`].
    pub fn with_openssl(mut self, openssl: OpenSsl) -> Self {
        self.openssl = openssl;
        self
    }

    pub fn key_path(&self) -> &Path {
        &self.key_path
    }

    pub fn cert_path(&self) -> &Path {
        &self.cert_path
    }

    pub fn openssl(&self) -> &OpenSsl {
        &self.openssl
    }

    /// Issues a certificate and private key for `info`.
    ///
    /// Intermediate files (request config, extensions, request) are removed
    /// when the run ends, whether it succeeds or fails, unless
    /// `options.keep_files` is set. The returned key and certificate files are
    /// owned by the [`IssuedCertificate`].
    ///
    /// ```no_run
    /// use certshell::cert::params::{CertificateRequestInfo, DistinguishedName, IssueOptions};
    /// use certshell::issuer::CertificateAuthority;
    ///
    /// # async fn run() -> certshell::error::Result<()> {
    /// let ca = CertificateAuthority::new("ca.key", "ca.pem");
    /// let info = CertificateRequestInfo::builder()
    ///     .subject(DistinguishedName::from_fields([("CN", "test.acme.com")]))
    ///     .build();
    /// let issued = ca.generate_cert(&info, &IssueOptions::default()).await?;
    /// println!("{} {}", issued.certificate_path().display(), issued.fingerprint);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn generate_cert(
        &self,
        info: &CertificateRequestInfo,
        options: &IssueOptions,
    ) -> Result<IssuedCertificate> {
        let mut scratch = Scratch::new(&options.prefix, options.keep_files);
        if let Some(dir) = &options.temp_dir {
            scratch = scratch.in_dir(dir);
        }

        let key_path = cert::create_keypair(&self.openssl, &mut scratch).await?;
        let config_path = create_cert_request_config(&mut scratch, info).await?;
        let extensions_path = create_extensions_file(&mut scratch, info).await?;
        let request_path =
            cert::create_cert_request(&self.openssl, &mut scratch, &key_path, &config_path).await?;
        let signed = cert::create_cert(
            &self.openssl,
            &mut scratch,
            &request_path,
            &self.key_path,
            &self.cert_path,
            &extensions_path,
            options.days(),
        )
        .await?;

        let key = scratch.release(&key_path)?;
        let certificate = scratch.release(&signed.path)?;

        info!(
            prefix = scratch.prefix(),
            certificate = %certificate.path().display(),
            fingerprint = %signed.fingerprint,
            "issued certificate"
        );

        Ok(IssuedCertificate {
            key,
            certificate,
            fingerprint: signed.fingerprint,
            hash: signed.hash,
        })
    }

    /// Same as [`CertificateAuthority::generate_cert`], returning the file contents.
    ///
    /// The key and certificate files are removed after reading unless
    /// `options.keep_files` is set.
    pub async fn generate_cert_buffer(
        &self,
        info: &CertificateRequestInfo,
        options: &IssueOptions,
    ) -> Result<IssuedCertificateBuffer> {
        let issued = self.generate_cert(info, options).await?;

        let certificate = issued.certificate.read().await?;
        let key = issued.key.read().await?;
        issued.certificate.discard();
        issued.key.discard();

        Ok(IssuedCertificateBuffer {
            key,
            certificate,
            fingerprint: issued.fingerprint,
            hash: issued.hash,
        })
    }
}
