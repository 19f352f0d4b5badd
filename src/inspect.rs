use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use crate::cert::Certificate;
use crate::error::{CertToolError, Result};

const CERTIFICATE_PEM_TAG: &str = "CERTIFICATE";

/// Human-oriented summary of a PEM certificate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CertificateSummary {
    pub path: PathBuf,
    /// RFC 4514 rendering of the subject.
    pub subject: String,
    /// RFC 4514 rendering of the issuer.
    pub issuer: String,
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
    /// DNS names from the SAN extension; empty when there is none.
    pub dns_names: Vec<String>,
}

impl fmt::Display for CertificateSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Certificate: {}", self.path.display())?;
        writeln!(f, "  Subject: {}", self.subject)?;
        writeln!(f, "  Issuer:  {}", self.issuer)?;
        writeln!(f, "  Valid from: {}", utc_timestamp(self.not_before)?)?;
        write!(f, "  Valid until: {}", utc_timestamp(self.not_after)?)?;
        if !self.dns_names.is_empty() {
            write!(f, "\n  DNS SANs: {}", self.dns_names.join(", "))?;
        }
        Ok(())
    }
}

/// Renders `at` in UTC as `2025-01-01 00:00:00+00:00`.
fn utc_timestamp(at: OffsetDateTime) -> std::result::Result<String, fmt::Error> {
    at.to_offset(UtcOffset::UTC)
        .format(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]"
        ))
        .map_err(|_| fmt::Error)
}

/// Reads and summarizes the PEM certificate at `path`.
///
/// # Errors
/// A config error when the file cannot be read or does not hold a PEM
/// certificate.
pub fn inspect_certificate(path: &Path) -> Result<CertificateSummary> {
    let text = fs::read_to_string(path).map_err(|e| {
        CertToolError::config(format!("Unable to read certificate {}: {e}", path.display()))
    })?;
    let unparsable =
        |reason: String| CertToolError::config(format!("Failed to parse certificate {}: {reason}", path.display()));

    let pem = pem::parse(&text).map_err(|e| unparsable(e.to_string()))?;
    if pem.tag() != CERTIFICATE_PEM_TAG {
        return Err(unparsable(format!("expected a CERTIFICATE block, found {}", pem.tag())));
    }
    let cert = Certificate::from_der(pem.contents()).map_err(|e| unparsable(e.to_string()))?;

    let validity = cert.validity();
    Ok(CertificateSummary {
        path: path.to_path_buf(),
        subject: cert.subject_name().to_string(),
        issuer: cert.issuer_name().to_string(),
        not_before: validity.not_before,
        not_after: validity.not_after,
        dns_names: cert
            .subject_alt_names()
            .map_err(|e| unparsable(e.to_string()))?
            .unwrap_or_default(),
    })
}
