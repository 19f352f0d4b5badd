use std::fmt;
use std::str::FromStr;

use bon::Builder;
use serde::{Deserialize, Serialize};

use super::coerce;
use crate::error::{CertToolError, Result};

/// Digest algorithms accepted for CSR and certificate signatures.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Digest {
    Sha256,
    Sha384,
    #[default]
    Sha512,
}

impl Digest {
    pub const ALL: [Digest; 3] = [Digest::Sha256, Digest::Sha384, Digest::Sha512];

    /// The canonical lower-case name, e.g. `"sha512"`.
    pub fn name(self) -> &'static str {
        match self {
            Digest::Sha256 => "sha256",
            Digest::Sha384 => "sha384",
            Digest::Sha512 => "sha512",
        }
    }
}

impl FromStr for Digest {
    type Err = CertToolError;

    /// Case-insensitive; dashes are ignored, so `"SHA-256"` is `sha256`.
    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-')
            .collect::<String>()
            .to_lowercase();
        Digest::ALL
            .into_iter()
            .find(|d| d.name() == normalized)
            .ok_or_else(|| CertToolError::config(format!("Unsupported digest: {s:?}")))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Private key algorithms. Only RSA is supported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum KeyType {
    #[default]
    Rsa,
}

impl KeyType {
    /// Resolves a key type name case-insensitively. An absent name is
    /// rejected like any other unsupported one.
    pub fn from_name(name: Option<&str>) -> Result<Self> {
        match name {
            Some(n) if n.eq_ignore_ascii_case("rsa") => Ok(KeyType::Rsa),
            _ => Err(CertToolError::config(format!(
                "Unsupported private_key_type {name:?}; only 'RSA' is supported."
            ))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            KeyType::Rsa => "RSA",
        }
    }
}

/// Fully resolved certificate parameters.
///
/// Build one directly with [`CertConfig::builder`] (unset fields take the
/// defaults), or obtain one from a configuration document through
/// [`ConfigOverrides::merge_with_defaults`].
#[derive(Clone, Debug, PartialEq, Eq, Builder)]
pub struct CertConfig {
    #[builder(default)]
    pub digest: Digest,
    #[builder(default)]
    pub key_type: KeyType,
    #[builder(default = CertConfig::DEFAULT_KEY_BITS)]
    pub private_key_bits: usize,
    #[builder(default)]
    pub encrypt_key: bool,
    pub passphrase: Option<String>,
    #[builder(default = CertConfig::DEFAULT_VALID_DAYS)]
    pub valid_days: u32,
    #[builder(default)]
    pub subject_alt_names: Vec<String>,
}

impl CertConfig {
    pub const DEFAULT_KEY_BITS: usize = 2048;
    pub const DEFAULT_VALID_DAYS: u32 = 365;

    /// Checks the field-level invariants. Does not look at the passphrase,
    /// which may still be supplied after a document is merged.
    pub fn check_fields(&self) -> Result<()> {
        if self.private_key_bits == 0 {
            return Err(CertToolError::config(
                "private_key_bits must be a positive integer",
            ));
        }
        if self.valid_days == 0 {
            return Err(CertToolError::config("valid_days must be a positive integer"));
        }
        for name in &self.subject_alt_names {
            if name.trim().is_empty() || !name.is_ascii() {
                return Err(CertToolError::config(format!(
                    "Invalid subject alt name {name:?}: DNS names must be non-empty ASCII"
                )));
            }
        }
        Ok(())
    }

    /// Fails when key encryption is requested without a non-empty passphrase.
    pub fn check_passphrase(&self) -> Result<()> {
        if self.encrypt_key && self.passphrase.as_deref().is_none_or(str::is_empty) {
            return Err(CertToolError::config(
                "encrypt_key is true but no passphrase was provided. \
                 Set 'passphrase' in the JSON config or via --passphrase.",
            ));
        }
        Ok(())
    }

    /// Everything that must hold before any key material is generated.
    pub fn validate(&self) -> Result<()> {
        self.check_fields()?;
        self.check_passphrase()
    }
}

impl Default for CertConfig {
    fn default() -> Self {
        CertConfig::builder().build()
    }
}

/// Certificate parameters as they appear in a configuration document: every
/// field optional, types coerced tolerantly.
///
/// Unknown fields are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest_alg: Option<String>,
    #[serde(
        default,
        deserialize_with = "coerce::optional_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub private_key_bits: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key_type: Option<String>,
    #[serde(
        default,
        deserialize_with = "coerce::optional_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub encrypt_key: Option<bool>,
    #[serde(
        default,
        deserialize_with = "coerce::optional_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub valid_days: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_alt_names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passphrase: Option<String>,
}

impl ConfigOverrides {
    /// Overlays these values onto the defaults and validates the result.
    ///
    /// Supplied values always win over defaults.
    pub fn merge_with_defaults(self) -> Result<CertConfig> {
        let defaults = CertConfig::default();

        let key_type = match self.private_key_type.as_deref() {
            Some(name) => KeyType::from_name(Some(name))?,
            None => defaults.key_type,
        };
        let digest = match self.digest_alg.as_deref() {
            Some(name) => name.parse()?,
            None => defaults.digest,
        };
        let private_key_bits = positive("private_key_bits", self.private_key_bits)?
            .unwrap_or(defaults.private_key_bits);
        let valid_days =
            positive("valid_days", self.valid_days)?.unwrap_or(defaults.valid_days);

        let config = CertConfig {
            digest,
            key_type,
            private_key_bits,
            encrypt_key: self.encrypt_key.unwrap_or(defaults.encrypt_key),
            passphrase: self.passphrase,
            valid_days,
            subject_alt_names: self
                .subject_alt_names
                .unwrap_or(defaults.subject_alt_names),
        };
        config.check_fields()?;
        Ok(config)
    }

    /// Whether any certificate parameter (other than the passphrase) is set.
    pub fn has_parameters(&self) -> bool {
        self.digest_alg.is_some()
            || self.private_key_bits.is_some()
            || self.private_key_type.is_some()
            || self.encrypt_key.is_some()
            || self.valid_days.is_some()
            || self.subject_alt_names.is_some()
    }
}

fn positive<T: TryFrom<i64>>(field: &str, value: Option<i64>) -> Result<Option<T>> {
    value
        .map(|v| {
            T::try_from(v).ok().filter(|_| v > 0).ok_or_else(|| {
                CertToolError::config(format!("{field} must be a positive integer, got {v}"))
            })
        })
        .transpose()
}
