pub mod config;
pub mod params;

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::artifact::{Artifact, Scratch};
use crate::error::Result;
use crate::output;
use crate::tool::OpenSsl;

/// RSA key size used for generated keypairs.
pub const KEY_BITS: &str = "2048";

pub use config::{create_cert_request_config, create_extensions_file};

/// A certificate freshly signed by `openssl x509 -req`.
///
/// # Fields
/// * `path` - Location of the PEM certificate.
/// * `fingerprint` - The fingerprint line, e.g. `SHA1 Fingerprint=AB:CD:..`.
/// * `hash` - The subject name hash, e.g. `4e3a7c1d`.
#[derive(Debug, Clone)]
pub struct SignedCertificate {
    pub path: PathBuf,
    pub fingerprint: String,
    pub hash: String,
}

/// Key and certificate files produced by an issuance run.
///
/// Unless the run kept its files, both are removed when this value is dropped;
/// call [`Artifact::keep`] to hold on to them.
#[derive(Debug)]
pub struct IssuedCertificate {
    pub key: Artifact,
    pub certificate: Artifact,
    pub fingerprint: String,
    pub hash: String,
}

impl IssuedCertificate {
    pub fn key_path(&self) -> &Path {
        self.key.path()
    }

    pub fn certificate_path(&self) -> &Path {
        self.certificate.path()
    }
}

/// PEM contents of an issued key and certificate.
#[derive(Debug, Clone)]
pub struct IssuedCertificateBuffer {
    pub key: Vec<u8>,
    pub certificate: Vec<u8>,
    pub fingerprint: String,
    pub hash: String,
}

/// Generates a 2048-bit RSA private key into a new `.pem` file.
pub async fn create_keypair(openssl: &OpenSsl, scratch: &mut Scratch) -> Result<PathBuf> {
    let path = scratch.create("", ".pem")?;
    openssl
        .run_checked(
            &[
                OsStr::new("genrsa"),
                OsStr::new("-out"),
                path.as_os_str(),
                OsStr::new(KEY_BITS),
            ],
            None,
        )
        .await?;
    Ok(path)
}

/// Creates a PKCS#10 request for `key_path` described by the config at `config_path`.
pub async fn create_cert_request(
    openssl: &OpenSsl,
    scratch: &mut Scratch,
    key_path: &Path,
    config_path: &Path,
) -> Result<PathBuf> {
    let path = scratch.create("csr", ".pem")?;
    openssl
        .run_checked(
            &[
                OsStr::new("req"),
                OsStr::new("-new"),
                OsStr::new("-key"),
                key_path.as_os_str(),
                OsStr::new("-config"),
                config_path.as_os_str(),
                OsStr::new("-out"),
                path.as_os_str(),
            ],
            None,
        )
        .await?;
    Ok(path)
}

/// Signs the request with the CA key and certificate, then reads back the
/// fingerprint and subject hash of the result.
///
/// `days` is passed as `-days` only when it is positive.
pub async fn create_cert(
    openssl: &OpenSsl,
    scratch: &mut Scratch,
    request_path: &Path,
    ca_key_path: &Path,
    ca_cert_path: &Path,
    extensions_path: &Path,
    days: Option<u32>,
) -> Result<SignedCertificate> {
    let path = scratch.create("cert", ".pem")?;
    let days = days.filter(|days| *days > 0).map(|days| days.to_string());

    let mut args = vec![
        OsStr::new("x509"),
        OsStr::new("-req"),
        OsStr::new("-in"),
        request_path.as_os_str(),
        OsStr::new("-CAkey"),
        ca_key_path.as_os_str(),
        OsStr::new("-CA"),
        ca_cert_path.as_os_str(),
        OsStr::new("-out"),
        path.as_os_str(),
        OsStr::new("-CAcreateserial"),
        OsStr::new("-extensions"),
        OsStr::new(config::EXTENSIONS_SECTION),
        OsStr::new("-extfile"),
        extensions_path.as_os_str(),
    ];
    if let Some(days) = &days {
        args.push(OsStr::new("-days"));
        args.push(OsStr::new(days));
    }
    openssl.run_checked(&args, None).await?;

    let stats = openssl
        .run_checked(
            &[
                OsStr::new("x509"),
                OsStr::new("-noout"),
                OsStr::new("-in"),
                path.as_os_str(),
                OsStr::new("-fingerprint"),
                OsStr::new("-hash"),
            ],
            None,
        )
        .await?;
    let (fingerprint, hash) = output::parse_fingerprint_and_hash(&stats.stdout)?;

    Ok(SignedCertificate {
        path,
        fingerprint,
        hash,
    })
}
