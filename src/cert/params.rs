use std::path::PathBuf;

use bon::Builder;

/// Distinguished name of a certificate subject.
///
/// Only the fields openssl's request config understands here are kept.
///
/// # Fields
/// * `country` - The country (C).
/// * `state` - The state or province (ST).
/// * `locality` - The locality or city (L).
/// * `organization` - The organization (O).
/// * `organization_unit` - The organizational units (OU); only the first is used.
/// * `common_name` - The common name (CN).
#[derive(Clone, Debug, Builder, Default, PartialEq, Eq)]
pub struct DistinguishedName {
    pub country: Option<String>,
    pub state: Option<String>,
    pub locality: Option<String>,
    pub organization: Option<String>,
    #[builder(default)]
    pub organization_unit: Vec<String>,
    pub common_name: Option<String>,
}

impl DistinguishedName {
    /// Builds a name from `(key, value)` pairs using openssl's short keys.
    ///
    /// Keys other than `C`, `ST`, `L`, `O`, `OU` and `CN` are ignored. A repeated
    /// `OU` appends, any other repeated key overwrites.
    ///
    /// ```
    /// use certshell::cert::params::DistinguishedName;
    ///
    /// let dn = DistinguishedName::from_fields([("CN", "example.com"), ("emailAddress", "x@y")]);
    /// assert_eq!(dn.common_name.as_deref(), Some("example.com"));
    /// ```
    pub fn from_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut dn = DistinguishedName::default();
        for (key, value) in fields {
            let value = value.into();
            match key.as_ref() {
                "C" => dn.country = Some(value),
                "ST" => dn.state = Some(value),
                "L" => dn.locality = Some(value),
                "O" => dn.organization = Some(value),
                "OU" => dn.organization_unit.push(value),
                "CN" => dn.common_name = Some(value),
                _ => {}
            }
        }
        dn
    }

    /// Present fields as `(key, value)` pairs in `C, ST, L, O, OU, CN` order.
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            ("C", self.country.as_deref()),
            ("ST", self.state.as_deref()),
            ("L", self.locality.as_deref()),
            ("O", self.organization.as_deref()),
            ("OU", self.organization_unit.first().map(String::as_str)),
            ("CN", self.common_name.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect()
    }
}

/// What to put in a certificate: the subject and its alternative names.
///
/// # Fields
/// * `subject` - The distinguished name of the certificate subject.
/// * `subject_alt_name` - Value of the `subjectAltName` extension in openssl
///   syntax, e.g. `DNS:example.com,IP:127.0.0.1`.
#[derive(Clone, Debug, Builder, Default)]
pub struct CertificateRequestInfo {
    pub subject: DistinguishedName,
    pub subject_alt_name: Option<String>,
}

/// Options for one issuance run.
///
/// # Fields
/// * `prefix` - Temporary file name prefix; non-word characters are stripped.
/// * `keep_files` - Leave every generated file on disk.
/// * `validity_days` - Passed as `-days` when positive; openssl's default otherwise.
/// * `temp_dir` - Where to create files; the system temp directory by default.
#[derive(Clone, Debug, Builder)]
pub struct IssueOptions {
    #[builder(default = "cert".to_string())]
    pub prefix: String,
    #[builder(default)]
    pub keep_files: bool,
    pub validity_days: Option<u32>,
    pub temp_dir: Option<PathBuf>,
}

impl Default for IssueOptions {
    fn default() -> Self {
        IssueOptions::builder().build()
    }
}

impl IssueOptions {
    /// The `-days` value to pass, if any.
    pub fn days(&self) -> Option<u32> {
        self.validity_days.filter(|days| *days > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fields_drops_unknown_keys() {
        let dn = DistinguishedName::from_fields([
            ("CN", "test.acme.com"),
            ("emailAddress", "admin@acme.com"),
            ("O", "Acme"),
            ("serialNumber", "42"),
        ]);
        assert_eq!(
            dn,
            DistinguishedName {
                organization: Some("Acme".to_string()),
                common_name: Some("test.acme.com".to_string()),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_entries_fixed_order() {
        let dn = DistinguishedName::from_fields([
            ("CN", "test.acme.com"),
            ("O", "Acme"),
            ("C", "US"),
        ]);
        assert_eq!(
            dn.entries(),
            vec![("C", "US"), ("O", "Acme"), ("CN", "test.acme.com")]
        );
    }

    #[test]
    fn test_entries_first_organization_unit() {
        let dn = DistinguishedName::builder()
            .organization_unit(vec!["Engineering".to_string(), "Ops".to_string()])
            .build();
        assert_eq!(dn.entries(), vec![("OU", "Engineering")]);
    }

    #[test]
    fn test_issue_options_days() {
        assert_eq!(IssueOptions::default().days(), None);
        assert_eq!(IssueOptions::builder().validity_days(0).build().days(), None);
        assert_eq!(IssueOptions::builder().validity_days(90).build().days(), Some(90));
        assert_eq!(IssueOptions::default().prefix, "cert");
    }
}
