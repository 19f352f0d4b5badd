//! # certtool - Self-Signed Certificate Tooling in Pure Rust
//!
//! certtool generates an RSA private key, a PKCS#10 certificate signing
//! request and a self-signed X.509 certificate from a distinguished name and a
//! small set of certificate parameters. It is built entirely with rustcrypto
//! libraries.
//!
//! ## Pipeline
//!
//! 1. [`config`] resolves a JSON document (explicit `dn`/`config` blocks or a
//!    flat object), overlays the defaults and validates the result.
//! 2. [`cert::create_cert_components`] generates the key, the CSR and the
//!    certificate.
//! 3. [`bundle::serialize_cert_components`] encodes all three to PEM,
//!    encrypting the key when asked to.
//! 4. [`output`] prints the bundle or writes it into a fresh per-certificate
//!    directory.
//!
//! [`batch`] ties these together for one config file or a whole directory of
//! them.
//!
//! ## Defaults
//!
//! | field              | default  |
//! |--------------------|----------|
//! | `digest_alg`       | `sha512` |
//! | `private_key_bits` | `2048`   |
//! | `private_key_type` | `RSA`    |
//! | `encrypt_key`      | `false`  |
//! | `valid_days`       | `365`    |
//! | `subject_alt_names`| `[]`     |
//!
//! The distinguished name has no defaults; `commonName` is required.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use certtool::config::{CertConfig, DistinguishedName};
//!
//! # fn main() -> Result<(), certtool::error::CertToolError> {
//! let dn = DistinguishedName::builder()
//!     .common_name("example.test".to_string())
//!     .organization("Example Corp".to_string())
//!     .country("US".to_string())
//!     .build();
//!
//! let config = CertConfig::builder()
//!     .subject_alt_names(vec!["example.test".to_string(), "www.example.test".to_string()])
//!     .build();
//!
//! let bundle = certtool::generate_from_dn_and_config(&dn, &config)?;
//! println!("{}", bundle.certificate_pem);
//! # Ok(())
//! # }
//! ```
//!
//! ### From a JSON config
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! # fn main() -> Result<(), certtool::error::CertToolError> {
//! // {"dn": {"commonName": "example.test"}, "config": {"valid_days": 30}}
//! let bundle = certtool::generate_from_json_file(Path::new("example.json"))?;
//! std::fs::write("cert.pem", &bundle.certificate_pem).unwrap();
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`error::Result`]. The error's
//! [`kind`](error::CertToolError::kind) tells configuration problems apart from
//! cryptographic and filesystem failures.

pub mod batch;
pub mod bundle;
pub mod cert;
pub mod config;
pub mod error;
pub mod inspect;
pub mod issuer;
pub mod key;
pub mod output;
pub mod tbs_certificate;

pub use batch::{generate_from_dn_and_config, generate_from_json_file};
pub use bundle::PemBundle;
pub use error::{CertToolError, ErrorKind};

/// The package version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
