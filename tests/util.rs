#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use certshell::cert::params::{CertificateRequestInfo, DistinguishedName, IssueOptions};
use certshell::issuer::CertificateAuthority;
use tempfile::TempDir;

pub const CA_COMMON_NAME: &str = "certshell test CA";

const CA_CONFIG: &str = "[ req ]
distinguished_name = req_distinguished_name
x509_extensions    = v3_ca
prompt             = no

[ req_distinguished_name ]
O  = Acme
CN = certshell test CA

[ v3_ca ]
basicConstraints     = critical,CA:TRUE
keyUsage             = critical,keyCertSign,cRLSign
subjectKeyIdentifier = hash
";

/// A throwaway CA living in its own temp directory.
pub struct TestCa {
    pub dir: TempDir,
    pub key_path: PathBuf,
    pub cert_path: PathBuf,
    pub authority: CertificateAuthority,
}

impl TestCa {
    pub fn cert_pem(&self) -> Vec<u8> {
        std::fs::read(&self.cert_path).expect("Failed to read CA certificate")
    }
}

fn openssl(args: &[&str], dir: &Path) {
    let output = Command::new("openssl")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to execute OpenSSL command");
    assert!(
        output.status.success(),
        "openssl {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Creates a self-signed CA.
pub fn generate_ca() -> TestCa {
    let dir = tempfile::tempdir().expect("Failed to create CA directory");
    std::fs::write(dir.path().join("ca.cfg"), CA_CONFIG).expect("Failed to write CA config");

    openssl(&["genrsa", "-out", "ca.key", "2048"], dir.path());
    openssl(
        &[
            "req", "-new", "-x509", "-key", "ca.key", "-config", "ca.cfg", "-out", "ca.pem",
            "-days", "30",
        ],
        dir.path(),
    );

    let key_path = dir.path().join("ca.key");
    let cert_path = dir.path().join("ca.pem");
    let authority = CertificateAuthority::new(&key_path, &cert_path);
    TestCa {
        dir,
        key_path,
        cert_path,
        authority,
    }
}

/// Writes an RSA key encrypted with `passphrase` and returns its PEM bytes.
pub fn encrypted_key(dir: &Path, passphrase: &str) -> Vec<u8> {
    let passout = format!("pass:{passphrase}");
    openssl(
        &["genrsa", "-aes256", "-passout", &passout, "-out", "enc.key", "2048"],
        dir,
    );
    std::fs::read(dir.join("enc.key")).expect("Failed to read encrypted key")
}

/// `{C: US, O: Acme, CN: <common_name>}` with optional alternative names.
pub fn acme_request(common_name: &str, subject_alt_name: Option<&str>) -> CertificateRequestInfo {
    CertificateRequestInfo::builder()
        .subject(DistinguishedName::from_fields([
            ("C", "US"),
            ("O", "Acme"),
            ("CN", common_name),
        ]))
        .maybe_subject_alt_name(subject_alt_name.map(str::to_string))
        .build()
}

/// Default options writing into `dir`.
pub fn options_in(dir: &Path) -> IssueOptions {
    IssueOptions::builder()
        .prefix("test".to_string())
        .temp_dir(dir.to_path_buf())
        .build()
}

/// Names of the files currently in `dir`.
pub fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("Failed to list directory")
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
