//! Example configuration document, as a starting point for users.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde_json::Value;

use super::{ConfigOverrides, DistinguishedName, RawConfig};
use crate::error::{CertToolError, Result};

/// Builds the example document in explicit-block shape.
pub fn build_example_config() -> Value {
    let dn = DistinguishedName::builder()
        .country("UK".to_string())
        .state("Somerset".to_string())
        .locality("Glastonbury".to_string())
        .organization("The Lupaxa Project".to_string())
        .organization_unit("Certificate Tooling".to_string())
        .common_name("example.lupaxa.test".to_string())
        .email("admin@example.test".to_string())
        .build();
    let config = ConfigOverrides {
        digest_alg: Some("sha512".to_string()),
        private_key_bits: Some(2048),
        private_key_type: Some("RSA".to_string()),
        encrypt_key: Some(false),
        valid_days: Some(365),
        subject_alt_names: Some(vec![
            "example.lupaxa.test".to_string(),
            "www.example.lupaxa.test".to_string(),
        ]),
        passphrase: None,
    };
    serde_json::to_value(RawConfig { dn, config }).unwrap_or(Value::Null)
}

/// Writes the example document, pretty-printed, to `writer`.
pub fn write_example_config<W: Write>(writer: &mut W) -> Result<()> {
    let text = render();
    writeln!(writer, "{text}")
        .map_err(|e| CertToolError::output(format!("Unable to write example config: {e}")))
}

/// Writes the example document to `path`.
pub fn generate_example_file(path: &Path) -> Result<()> {
    fs::write(path, format!("{}\n", render())).map_err(|e| {
        CertToolError::output(format!(
            "Unable to write example config to {}: {e}",
            path.display()
        ))
    })
}

fn render() -> String {
    serde_json::to_string_pretty(&build_example_config()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Digest, resolve_value};

    #[test]
    fn test_example_has_both_blocks() {
        let example = build_example_config();
        assert!(example["dn"]["commonName"].is_string());
        assert!(example["dn"]["countryName"].is_string());
        assert!(example["dn"]["organizationName"].is_string());
        assert_eq!(example["config"]["private_key_type"], "RSA");
        assert!(example["config"]["encrypt_key"].is_boolean());
        assert!(example["config"].get("passphrase").is_none());
    }

    #[test]
    fn test_example_resolves_and_validates() {
        let raw = resolve_value(&build_example_config(), "example").unwrap();
        let (dn, config) = raw.merge().unwrap();
        assert_eq!(dn.common_name.as_deref(), Some("example.lupaxa.test"));
        assert_eq!(config.digest, Digest::Sha512);
        assert_eq!(config.subject_alt_names.len(), 2);
        assert!(dn.as_x509_name().is_ok());
    }

    #[test]
    fn test_example_writes_json() {
        let mut out = Vec::new();
        write_example_config(&mut out).unwrap();
        let parsed: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed, build_example_config());
    }

    #[test]
    fn test_example_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("example.json");
        generate_example_file(&path).unwrap();
        let parsed: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(parsed.get("dn").is_some());

        let missing = dir.path().join("no/such/dir/example.json");
        assert_eq!(
            generate_example_file(&missing).unwrap_err().kind(),
            crate::error::ErrorKind::Output
        );
    }
}
