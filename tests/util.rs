#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use certtool::bundle::PemBundle;
use certtool::config::{CertConfig, DistinguishedName};

/// Smallest key size the generator accepts; keeps the tests fast.
pub const TEST_KEY_BITS: usize = 1024;

pub fn dn(common_name: &str) -> DistinguishedName {
    DistinguishedName::builder()
        .common_name(common_name.to_string())
        .build()
}

pub fn full_dn(common_name: &str) -> DistinguishedName {
    DistinguishedName::builder()
        .country("UK".to_string())
        .state("Somerset".to_string())
        .locality("Glastonbury".to_string())
        .organization("The Lupaxa Project".to_string())
        .organization_unit("Certificate Tooling".to_string())
        .common_name(common_name.to_string())
        .email("admin@example.test".to_string())
        .build()
}

pub fn fast_config() -> CertConfig {
    CertConfig::builder().private_key_bits(TEST_KEY_BITS).build()
}

pub fn generate(common_name: &str, config: &CertConfig) -> PemBundle {
    certtool::generate_from_dn_and_config(&dn(common_name), config).unwrap()
}

pub fn write_config(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

/// Names of the immediate subdirectories of `dir`, sorted.
pub fn subdirs(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap())
        .filter(|entry| entry.path().is_dir())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
