//! Drives resolution, generation, serialization and output for one config
//! source or a directory of them.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::bundle::{PemBundle, serialize_cert_components};
use crate::cert::create_cert_components;
use crate::config::{CertConfig, DistinguishedName, load_json_config};
use crate::error::{CertToolError, Result};
use crate::output::OutputTarget;

/// Options shared by every item of a run.
///
/// # Fields
/// * `output` - Where bundles are delivered.
/// * `passphrase` - Used for any config that does not carry its own.
#[derive(Clone, Debug, Default, bon::Builder)]
pub struct GenerateOptions {
    #[builder(default)]
    pub output: OutputTarget,
    pub passphrase: Option<String>,
}

/// A config file that could not be turned into a bundle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchFailure {
    pub path: PathBuf,
    pub error: CertToolError,
}

/// Outcome of a batch run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Config files processed, in processing order.
    pub processed: Vec<PathBuf>,
    /// Subdirectories written, in directory mode.
    pub written: Vec<PathBuf>,
    /// Files that failed, with their errors, in processing order.
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Generates and serializes one bundle. The config is validated first, so a
/// missing passphrase fails before any key is generated.
pub fn build_bundle(dn: &DistinguishedName, config: &CertConfig) -> Result<PemBundle> {
    config.validate()?;
    let components = create_cert_components(dn, config)?;
    serialize_cert_components(&components, config.encrypt_key, config.passphrase.as_deref())
}

/// Runs one validated DN/config pair through generation and delivery.
pub fn handle_single_cert(
    dn: &DistinguishedName,
    config: &CertConfig,
    label: Option<&str>,
    output: &OutputTarget,
) -> Result<Option<PathBuf>> {
    let bundle = build_bundle(dn, config)?;
    output.write(&bundle, dn, label)
}

/// Processes a single JSON config file. Failures propagate unchanged.
pub fn process_config_file(path: &Path, options: &GenerateOptions) -> Result<Option<PathBuf>> {
    if !path.is_file() {
        return Err(CertToolError::config(format!("{} is not a file.", path.display())));
    }
    let (dn, config) = load_and_merge(path, options)?;
    handle_single_cert(&dn, &config, None, &options.output)
}

/// Processes every `*.json` file of `dir` in file-name order.
///
/// A failing file is logged and skipped. Once all files have been tried, any
/// failure yields [`CertToolError::BatchFailed`] with the count. Use
/// [`run_config_dir`] to get the individual errors.
///
/// # Errors
/// A config error when `dir` is not a directory or holds no `*.json` file.
pub fn process_config_dir(dir: &Path, options: &GenerateOptions) -> Result<BatchReport> {
    let report = run_config_dir(dir, options)?;
    if !report.is_success() {
        return Err(CertToolError::BatchFailed {
            failed: report.failures.len(),
            total: report.processed.len(),
        });
    }
    info!(total = report.processed.len(), "all config files processed");
    Ok(report)
}

/// Processes every `*.json` file of `dir` in file-name order and reports
/// per-file failures in [`BatchReport::failures`] instead of failing.
///
/// # Errors
/// A config error when `dir` is not a directory or holds no `*.json` file.
pub fn run_config_dir(dir: &Path, options: &GenerateOptions) -> Result<BatchReport> {
    let files = discover_configs(dir)?;
    let mut report = BatchReport::default();

    for path in files {
        let label = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        let result = load_and_merge(&path, options)
            .and_then(|(dn, config)| handle_single_cert(&dn, &config, label.as_deref(), &options.output));
        match result {
            Ok(written) => {
                report.written.extend(written);
            }
            Err(error) => {
                error!("ERROR processing {}: {error}", path.display());
                report.failures.push(BatchFailure {
                    path: path.clone(),
                    error,
                });
            }
        }
        report.processed.push(path);
    }

    Ok(report)
}

/// Sorted `*.json` regular files directly inside `dir`.
pub fn discover_configs(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(CertToolError::config(format!("{} is not a directory.", dir.display())));
    }
    let entries = fs::read_dir(dir).map_err(|e| {
        CertToolError::config(format!("Unable to read config directory {}: {e}", dir.display()))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            CertToolError::config(format!("Unable to read config directory {}: {e}", dir.display()))
        })?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") && path.is_file() {
            files.push(path);
        }
    }
    if files.is_empty() {
        return Err(CertToolError::config(format!(
            "No *.json files found in {}",
            dir.display()
        )));
    }
    files.sort();
    Ok(files)
}

fn load_and_merge(path: &Path, options: &GenerateOptions) -> Result<(DistinguishedName, CertConfig)> {
    load_json_config(path)?
        .with_fallback_passphrase(options.passphrase.as_deref())
        .merge()
}

/// Generates a bundle from a JSON config file without writing anything.
pub fn generate_from_json_file(path: &Path) -> Result<PemBundle> {
    let (dn, config) = load_json_config(path)?.merge()?;
    build_bundle(&dn, &config)
}

/// Generates a bundle from an in-memory DN and config.
pub fn generate_from_dn_and_config(dn: &DistinguishedName, config: &CertConfig) -> Result<PemBundle> {
    dn.validate()?;
    build_bundle(dn, config)
}
