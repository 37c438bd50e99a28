//! Recognizers for the text printed by `openssl`.
//!
//! Every pattern this crate matches against tool output lives here so that a
//! change in the tool's wording shows up as a failing test in this module
//! rather than as a silently misclassified result elsewhere.

use std::sync::LazyLock;

use regex::Regex;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::error::{CertShellError, Result};

static END_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^notAfter=(.+?)\r?$").expect("valid regex"));

static FINGERPRINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(\S+ Fingerprint=[0-9A-Fa-f]{2}(?::[0-9A-Fa-f]{2})+)\r?$").expect("valid regex")
});

static SUBJECT_HASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^([0-9a-f]{8})\r?$").expect("valid regex"));

static MODULUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Modulus=(.+?)\r?$").expect("valid regex"));

static VERIFY_OK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:^|: )OK\r?$|unable to get (?:local )?issuer certificate").expect("valid regex")
});

static SELF_SIGNED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"self[- ]signed certificate").expect("valid regex"));

static CERTIFICATE_LOAD_FAILED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)unable to load certificate|could not (?:read|find) certificate")
        .expect("valid regex")
});

static KEY_LOAD_FAILED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)unable to load (?:private )?key|could not (?:read|find) (?:private )?key|bad decrypt")
        .expect("valid regex")
});

static KEY_CHECK_FAILED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"RSA key error|RSA key not ok").expect("valid regex"));

static SUBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^subject=\s*(.*?)\r?$").expect("valid regex"));

static ISSUER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^issuer=\s*(.*?)\r?$").expect("valid regex"));

/// Parses the `notAfter=Mon DD HH:MM:SS YYYY GMT` line of `x509 -enddate`.
pub fn parse_end_date(text: &str) -> Result<OffsetDateTime> {
    let raw = END_DATE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| CertShellError::ParseError(format!("no notAfter line in {:?}", text.trim())))?
        .as_str();

    // Single-digit days are space padded ("Jan  5").
    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let format = format_description!(
        "[month repr:short] [day padding:none] [hour]:[minute]:[second] [year] GMT"
    );
    PrimitiveDateTime::parse(&normalized, format)
        .map(PrimitiveDateTime::assume_utc)
        .map_err(|e| CertShellError::ParseError(format!("bad notAfter date {raw:?}: {e}")))
}

/// Extracts the fingerprint line and subject hash printed by `x509 -fingerprint -hash`.
///
/// The fingerprint is returned as the whole line, e.g. `SHA1 Fingerprint=AB:CD:..`.
pub fn parse_fingerprint_and_hash(text: &str) -> Result<(String, String)> {
    let fingerprint = FINGERPRINT
        .captures(text)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| CertShellError::ParseError(format!("no fingerprint line in {:?}", text.trim())))?
        .as_str()
        .to_string();
    let hash = SUBJECT_HASH
        .captures(text)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| CertShellError::ParseError(format!("no subject hash line in {:?}", text.trim())))?
        .as_str()
        .to_string();
    Ok((fingerprint, hash))
}

/// Returns the value of the `Modulus=` line with the label stripped.
pub fn parse_modulus(text: &str) -> Result<String> {
    MODULUS
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| CertShellError::ParseError(format!("no Modulus line in {:?}", text.trim())))
}

/// Flags derived from the output of `openssl verify`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VerifyOutcome {
    pub valid: bool,
    pub ca_verified: bool,
    pub self_signed: bool,
}

/// Classifies `openssl verify` output.
///
/// A certificate is valid when the tool reports `OK`, or when the only
/// complaint is a missing issuer. It is CA verified when valid and no `error`
/// appears anywhere in the output.
pub fn classify_verify(text: &str) -> VerifyOutcome {
    let valid = VERIFY_OK.is_match(text);
    VerifyOutcome {
        valid,
        ca_verified: valid && !text.contains("error"),
        self_signed: SELF_SIGNED.is_match(text),
    }
}

pub fn certificate_load_failed(text: &str) -> bool {
    CERTIFICATE_LOAD_FAILED.is_match(text)
}

pub fn key_load_failed(text: &str) -> bool {
    KEY_LOAD_FAILED.is_match(text)
}

/// Whether `rsa -check` found the key inconsistent.
pub fn key_check_failed(text: &str) -> bool {
    KEY_CHECK_FAILED.is_match(text)
}

/// Returns the `subject=` and `issuer=` values of `x509 -subject -issuer`.
pub fn parse_subject_and_issuer(text: &str) -> Option<(String, String)> {
    let subject = SUBJECT.captures(text)?.get(1)?.as_str().trim().to_string();
    let issuer = ISSUER.captures(text)?.get(1)?.as_str().trim().to_string();
    Some((subject, issuer))
}
