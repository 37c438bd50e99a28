//! Request configuration and extension files fed to `openssl req` and `openssl x509`.

use std::path::PathBuf;

use crate::artifact::Scratch;
use crate::cert::params::{CertificateRequestInfo, DistinguishedName};
use crate::error::{CertShellError, Result};

/// Name of the extension section referenced by `-extensions`.
pub const EXTENSIONS_SECTION: &str = "v3_ca";

const REQUEST_HEADER: &str = "[ req ]\n\
default_bits       = 2048\n\
default_keyfile    = keyfile.pem\n\
distinguished_name = req_distinguished_name\n\
prompt             = no\n\
\n\
[ req_distinguished_name ]\n";

fn check_value(key: &str, value: &str) -> Result<()> {
    if value.contains(['\n', '\r']) {
        return Err(CertShellError::InvalidInput(format!(
            "{key} must not contain line breaks"
        )));
    }
    Ok(())
}

/// Renders the `[ req ]` config for a non-interactive `openssl req -new`.
///
/// ```
/// use certshell::cert::{config::render_request_config, params::DistinguishedName};
///
/// let dn = DistinguishedName::from_fields([("CN", "test.acme.com"), ("C", "US")]);
/// let config = render_request_config(&dn).unwrap();
/// assert!(config.ends_with("[ req_distinguished_name ]\nC = US\nCN = test.acme.com\n"));
/// ```
pub fn render_request_config(subject: &DistinguishedName) -> Result<String> {
    let mut config = String::from(REQUEST_HEADER);
    for (key, value) in subject.entries() {
        check_value(key, value)?;
        config.push_str(&format!("{key} = {value}\n"));
    }
    Ok(config)
}

/// Renders the extension section applied when signing.
pub fn render_extensions(subject_alt_name: Option<&str>) -> Result<String> {
    let mut extensions = format!("[{EXTENSIONS_SECTION}]\n");
    if let Some(san) = subject_alt_name.filter(|san| !san.is_empty()) {
        check_value("subjectAltName", san)?;
        extensions.push_str(&format!("subjectAltName = {san}\n"));
    }
    Ok(extensions)
}

/// Writes the request config into a new `.cfg` file owned by `scratch`.
pub async fn create_cert_request_config(
    scratch: &mut Scratch,
    info: &CertificateRequestInfo,
) -> Result<PathBuf> {
    let config = render_request_config(&info.subject)?;
    let path = scratch.create("", ".cfg")?;
    tokio::fs::write(&path, config)
        .await
        .map_err(|e| CertShellError::filesystem(&path, e))?;
    Ok(path)
}

/// Writes the extension section into a new `.ext` file owned by `scratch`.
pub async fn create_extensions_file(
    scratch: &mut Scratch,
    info: &CertificateRequestInfo,
) -> Result<PathBuf> {
    let extensions = render_extensions(info.subject_alt_name.as_deref())?;
    let path = scratch.create("", ".ext")?;
    tokio::fs::write(&path, extensions)
        .await
        .map_err(|e| CertShellError::filesystem(&path, e))?;
    Ok(path)
}
