//! Configuration loading, resolution and validation.
//!
//! A configuration document is a JSON object in one of two shapes:
//!
//! * explicit blocks: `{"dn": {...}, "config": {...}}`
//! * flat: DN fields and config fields mixed at the top level
//!
//! Either shape resolves to a [`RawConfig`]: a [`DistinguishedName`] plus
//! [`ConfigOverrides`]. [`merge_settings`] then overlays the overrides onto
//! the defaults and validates both halves, producing the typed
//! [`CertConfig`] the generator consumes.

pub mod coerce;
pub mod example;
mod schema;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

pub use crate::cert::params::{DistinguishedName, DnAttribute};
use crate::error::{CertToolError, Result};
pub use schema::{CertConfig, ConfigOverrides, Digest, KeyType};

/// Recognized DN field names, in subject order.
pub const DN_KEYS: [&str; 7] = [
    "countryName",
    "stateOrProvinceName",
    "localityName",
    "organizationName",
    "organizationalUnitName",
    "commonName",
    "emailAddress",
];

/// Recognized certificate parameter names. `passphrase` is accepted as well
/// but has no default.
pub const CONFIG_KEYS: [&str; 6] = [
    "digest_alg",
    "private_key_bits",
    "private_key_type",
    "encrypt_key",
    "valid_days",
    "subject_alt_names",
];

pub const PASSPHRASE_KEY: &str = "passphrase";

/// A configuration document after shape resolution and type coercion, before
/// defaults are applied.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawConfig {
    pub dn: DistinguishedName,
    pub config: ConfigOverrides,
}

impl RawConfig {
    /// Uses `passphrase` when the document did not carry one itself.
    pub fn with_fallback_passphrase(mut self, passphrase: Option<&str>) -> Self {
        if self.config.passphrase.is_none() {
            self.config.passphrase = passphrase.map(str::to_string);
        }
        self
    }

    /// Applies defaults and validates. See [`merge_settings`].
    pub fn merge(self) -> Result<(DistinguishedName, CertConfig)> {
        merge_settings(self.dn, self.config)
    }
}

/// Reads and resolves a JSON configuration file.
///
/// # Errors
/// A config error when the file cannot be read, is not valid JSON, is not an
/// object at the top level, or holds values of the wrong type.
pub fn load_json_config(path: &Path) -> Result<RawConfig> {
    let text = fs::read_to_string(path).map_err(|e| {
        CertToolError::config(format!("Unable to read JSON config {}: {e}", path.display()))
    })?;
    parse_json_config(&text, &path.display().to_string())
}

/// Resolves a configuration document held in memory. `source` names the
/// document in error messages.
pub fn parse_json_config(text: &str, source: &str) -> Result<RawConfig> {
    let data: Value = serde_json::from_str(text)
        .map_err(|e| CertToolError::config(format!("Invalid JSON in config {source}: {e}")))?;
    resolve_value(&data, source)
}

/// Splits a parsed document into its DN and config halves.
///
/// When the object has a `dn` or `config` key, those blocks are used as-is
/// (a block that is not an object counts as empty). Otherwise each top-level
/// key is routed by name and unknown keys are dropped.
pub fn resolve_value(data: &Value, source: &str) -> Result<RawConfig> {
    let Some(object) = data.as_object() else {
        return Err(CertToolError::config(format!(
            "JSON config {source} must be an object at the top level"
        )));
    };

    let invalid =
        |e: serde_json::Error| CertToolError::config(format!("Invalid value in config {source}: {e}"));

    let raw = if object.contains_key("dn") || object.contains_key("config") {
        debug!(source, "resolving explicit dn/config blocks");
        let block = |key: &str| object.get(key).filter(|v| v.is_object()).cloned();
        RawConfig {
            dn: block("dn")
                .map(serde_json::from_value)
                .transpose()
                .map_err(invalid)?
                .unwrap_or_default(),
            config: block("config")
                .map(serde_json::from_value)
                .transpose()
                .map_err(invalid)?
                .unwrap_or_default(),
        }
    } else {
        debug!(source, "resolving flat config");
        RawConfig {
            dn: DistinguishedName::deserialize(data).map_err(invalid)?,
            config: ConfigOverrides::deserialize(data).map_err(invalid)?,
        }
    };
    Ok(raw)
}

/// Applies defaults to `overrides` and validates both halves.
///
/// The key type and the other certificate parameters are checked first, then
/// the DN. The DN never receives defaults.
pub fn merge_settings(
    dn: DistinguishedName,
    overrides: ConfigOverrides,
) -> Result<(DistinguishedName, CertConfig)> {
    let config = overrides.merge_with_defaults()?;
    dn.validate()?;
    Ok((dn, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_explicit_blocks() {
        let data = json!({
            "dn": {
                "countryName": "UK",
                "commonName": "explicit.lupaxa.test",
                "somethingElse": 1
            },
            "config": {
                "digest_alg": "sha256",
                "private_key_bits": "4096",
                "valid_days": 730,
                "encrypt_key": "yes",
                "passphrase": "pw"
            }
        });
        let raw = resolve_value(&data, "inline").unwrap();
        assert_eq!(raw.dn.common_name.as_deref(), Some("explicit.lupaxa.test"));
        assert_eq!(raw.dn.country.as_deref(), Some("UK"));
        assert_eq!(raw.config.digest_alg.as_deref(), Some("sha256"));
        assert_eq!(raw.config.private_key_bits, Some(4096));
        assert_eq!(raw.config.valid_days, Some(730));
        assert_eq!(raw.config.encrypt_key, Some(true));
        assert_eq!(raw.config.passphrase.as_deref(), Some("pw"));
    }

    #[test]
    fn test_flat_document_routes_keys() {
        let data = json!({
            "countryName": "UK",
            "commonName": "flat.lupaxa.test",
            "private_key_bits": 3072,
            "encrypt_key": 0,
            "unknown_key": "dropped"
        });
        let raw = resolve_value(&data, "inline").unwrap();
        assert_eq!(raw.dn.common_name.as_deref(), Some("flat.lupaxa.test"));
        assert_eq!(raw.config.private_key_bits, Some(3072));
        assert_eq!(raw.config.encrypt_key, Some(false));
        assert_eq!(raw.config.digest_alg, None);

        let (_, config) = raw.merge().unwrap();
        assert_eq!(config.digest, Digest::Sha512);
        assert_eq!(config.private_key_bits, 3072);
        assert_eq!(config.valid_days, 365);
    }

    #[test]
    fn test_non_object_block_is_ignored() {
        let data = json!({ "dn": "nope", "config": { "valid_days": 10 } });
        let raw = resolve_value(&data, "inline").unwrap();
        assert!(raw.dn.is_empty());
        assert_eq!(raw.config.valid_days, Some(10));
    }

    #[test]
    fn test_top_level_must_be_object() {
        let err = resolve_value(&json!([1, 2]), "list.json").unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("list.json"));
    }

    #[test]
    fn test_bad_bool_names_value() {
        let data = json!({ "commonName": "x.test", "encrypt_key": "perhaps" });
        let err = resolve_value(&data, "inline").unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("perhaps"));
    }

    #[test]
    fn test_null_encrypt_key_is_config_error() {
        for data in [
            json!({ "commonName": "n.test", "encrypt_key": null }),
            json!({ "dn": { "commonName": "n.test" }, "config": { "encrypt_key": null } }),
        ] {
            let err = resolve_value(&data, "null.json").unwrap_err();
            assert!(err.is_config());
            assert!(err.to_string().contains("null"), "{err}");
        }

        let data = json!({ "commonName": "n.test", "valid_days": null });
        let raw = resolve_value(&data, "null.json").unwrap();
        assert_eq!(raw.config.valid_days, None);
    }

    #[test]
    fn test_malformed_json_names_source() {
        let err = parse_json_config("{ not json", "broken.json").unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_merge_checks_dn() {
        let err = merge_settings(DistinguishedName::default(), ConfigOverrides::default())
            .unwrap_err();
        assert!(err.to_string().contains("DN is empty"));
    }

    #[test]
    fn test_fallback_passphrase_does_not_override() {
        let raw = RawConfig::default().with_fallback_passphrase(Some("cli"));
        assert_eq!(raw.config.passphrase.as_deref(), Some("cli"));

        let mut own = RawConfig::default();
        own.config.passphrase = Some("json".to_string());
        let own = own.with_fallback_passphrase(Some("cli"));
        assert_eq!(own.config.passphrase.as_deref(), Some("json"));
    }

    #[test]
    fn test_key_tables_match_schema() {
        for (key, attr) in DN_KEYS.iter().zip(DnAttribute::ALL) {
            assert_eq!(*key, attr.key());
        }
        let serialized = serde_json::to_value(ConfigOverrides {
            digest_alg: Some("sha256".to_string()),
            private_key_bits: Some(1),
            private_key_type: Some("RSA".to_string()),
            encrypt_key: Some(false),
            valid_days: Some(1),
            subject_alt_names: Some(vec![]),
            passphrase: None,
        })
        .unwrap();
        for key in CONFIG_KEYS {
            assert!(serialized.get(key).is_some(), "{key}");
        }
    }
}
