use std::io;
use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use certtool::batch::{GenerateOptions, handle_single_cert, process_config_dir, process_config_file};
use certtool::config::example::{generate_example_file, write_example_config};
use certtool::config::{ConfigOverrides, DistinguishedName, load_json_config, merge_settings};
use certtool::error::{CertToolError, Result};
use certtool::inspect::inspect_certificate;
use certtool::output::{OutputTarget, prepare_output_dir};

/// Generate self-signed certificate(s), CSR(s), and private key(s).
#[derive(Debug, Default, Parser)]
#[command(name = "certtool", version, about)]
pub struct Cli {
    /// Log pipeline steps (debug level) unless RUST_LOG says otherwise.
    #[arg(short, long)]
    pub verbose: bool,

    /// Generate an example JSON configuration and exit.
    #[arg(long)]
    pub generate_example: bool,

    /// With --generate-example, write the example to this file instead of stdout.
    #[arg(long, value_name = "FILE", requires = "generate_example")]
    pub example_file: Option<PathBuf>,

    /// Path to JSON config file for DN and certificate settings.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory containing JSON config files for bulk generation.
    #[arg(long, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Directory to write outputs into. For each cert, a subdirectory is
    /// created containing cert.pem, csr.pem and key.pem.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Validate a JSON configuration file and exit without generating certificates.
    #[arg(long, value_name = "FILE")]
    pub validate_config: Option<PathBuf>,

    /// Inspect an existing PEM-encoded certificate and print basic details.
    #[arg(long, value_name = "CERT")]
    pub inspect_cert: Option<PathBuf>,

    #[command(flatten)]
    pub dn: DnArgs,

    #[command(flatten)]
    pub cfg: ConfigArgs,

    /// Passphrase to use when encrypting the private key. With --config or
    /// --config-dir it applies to configs that do not set their own.
    #[arg(long)]
    pub passphrase: Option<String>,
}

/// Distinguished name flags. None of them has a default.
#[derive(Debug, Default, clap::Args)]
pub struct DnArgs {
    /// Country Name (C). Example: UK
    #[arg(long)]
    pub country_name: Option<String>,
    /// State or Province Name (ST). Example: Somerset
    #[arg(long)]
    pub state_or_province_name: Option<String>,
    /// Locality Name (L). Example: Glastonbury
    #[arg(long)]
    pub locality_name: Option<String>,
    /// Organization Name (O).
    #[arg(long)]
    pub organization_name: Option<String>,
    /// Organizational Unit Name (OU).
    #[arg(long)]
    pub organizational_unit_name: Option<String>,
    /// Common Name (CN). For TLS: the hostname.
    #[arg(long)]
    pub common_name: Option<String>,
    /// Email Address.
    #[arg(long)]
    pub email_address: Option<String>,
}

impl DnArgs {
    fn any_set(&self) -> bool {
        !self.to_dn().is_empty()
    }

    fn to_dn(&self) -> DistinguishedName {
        DistinguishedName {
            country: self.country_name.clone(),
            state: self.state_or_province_name.clone(),
            locality: self.locality_name.clone(),
            organization: self.organization_name.clone(),
            organization_unit: self.organizational_unit_name.clone(),
            common_name: self.common_name.clone(),
            email: self.email_address.clone(),
        }
    }
}

/// Certificate parameter flags; unset flags fall back to the defaults.
#[derive(Debug, Default, clap::Args)]
pub struct ConfigArgs {
    /// Digest algorithm to use for signing. Default: sha512
    #[arg(long, value_parser = ["sha512", "sha384", "sha256"])]
    pub digest_alg: Option<String>,
    /// Private key size in bits. Default: 2048
    #[arg(long, allow_negative_numbers = true)]
    pub private_key_bits: Option<i64>,
    /// Private key type (only RSA is supported).
    #[arg(long)]
    pub private_key_type: Option<String>,
    /// Validity period for the certificate in days. Default: 365
    #[arg(long, allow_negative_numbers = true)]
    pub valid_days: Option<i64>,
    /// Encrypt the private key with --passphrase.
    #[arg(long, overrides_with = "no_encrypt_key")]
    pub encrypt_key: bool,
    /// Do not encrypt the private key (default).
    #[arg(long, overrides_with = "encrypt_key")]
    pub no_encrypt_key: bool,
    /// DNS subject alternative name; repeat for several.
    #[arg(long = "subject-alt-name", value_name = "DNS_NAME")]
    pub subject_alt_names: Vec<String>,
}

impl ConfigArgs {
    fn encrypt_key_flag(&self) -> Option<bool> {
        match (self.encrypt_key, self.no_encrypt_key) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    fn any_set(&self) -> bool {
        self.to_overrides().has_parameters()
    }

    fn to_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            digest_alg: self.digest_alg.clone(),
            private_key_bits: self.private_key_bits,
            private_key_type: self.private_key_type.clone(),
            encrypt_key: self.encrypt_key_flag(),
            valid_days: self.valid_days,
            subject_alt_names: (!self.subject_alt_names.is_empty()).then(|| self.subject_alt_names.clone()),
            passphrase: None,
        }
    }
}

/// What a single invocation does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    Validate(PathBuf),
    Inspect(PathBuf),
    Example(Option<PathBuf>),
    ConfigDir(PathBuf),
    ConfigFile(PathBuf),
    Flags,
}

impl Cli {
    fn any_generation_flag(&self) -> bool {
        self.dn.any_set() || self.cfg.any_set()
    }

    /// Picks the mode, rejecting flag combinations that mix modes.
    pub fn mode(&self) -> Result<Mode> {
        if let Some(path) = &self.validate_config {
            if self.generate_example
                || self.config.is_some()
                || self.config_dir.is_some()
                || self.output_dir.is_some()
                || self.any_generation_flag()
            {
                return Err(CertToolError::config(
                    "--validate-config cannot be combined with other generation options. \
                     Use it alone to check a single JSON config file.",
                ));
            }
            return Ok(Mode::Validate(path.clone()));
        }

        if let Some(path) = &self.inspect_cert {
            return Ok(Mode::Inspect(path.clone()));
        }

        if self.generate_example {
            let mut conflicts = Vec::new();
            if self.config.is_some() {
                conflicts.push("--config");
            }
            if self.config_dir.is_some() {
                conflicts.push("--config-dir");
            }
            if self.output_dir.is_some() {
                conflicts.push("--output-dir");
            }
            if self.dn.any_set() {
                conflicts.push("DN CLI options");
            }
            if self.cfg.any_set() {
                conflicts.push("CONFIG CLI options");
            }
            if !conflicts.is_empty() {
                return Err(CertToolError::config(format!(
                    "--generate-example cannot be combined with certificate generation options. \
                     Use it alone (optionally with --example-file). Conflicting options: {}",
                    conflicts.join(", ")
                )));
            }
            return Ok(Mode::Example(self.example_file.clone()));
        }

        if self.config.is_some() && self.config_dir.is_some() {
            return Err(CertToolError::config(
                "--config and --config-dir are mutually exclusive.",
            ));
        }
        if (self.config.is_some() || self.config_dir.is_some()) && self.any_generation_flag() {
            return Err(CertToolError::config(
                "DN/CONFIG CLI options cannot be used together with --config or --config-dir. \
                 Choose ONE mode:\n  \
                 * CLI-only: DN/CONFIG via CLI (no --config / --config-dir)\n  \
                 * Config file: --config <file.json>\n  \
                 * Config dir:  --config-dir <dir>",
            ));
        }

        Ok(match (&self.config, &self.config_dir) {
            (_, Some(dir)) => Mode::ConfigDir(dir.clone()),
            (Some(file), None) => Mode::ConfigFile(file.clone()),
            (None, None) => Mode::Flags,
        })
    }

    fn output_target(&self) -> Result<OutputTarget> {
        match &self.output_dir {
            Some(dir) => {
                prepare_output_dir(dir)?;
                Ok(OutputTarget::Directory(dir.clone()))
            }
            None => Ok(OutputTarget::Stdout),
        }
    }
}

/// Executes the invocation described by `cli`.
pub fn run(cli: &Cli) -> Result<()> {
    match cli.mode()? {
        Mode::Validate(path) => {
            load_json_config(&path)?.merge()?;
            println!("Configuration {} is valid.", path.display());
        }
        Mode::Inspect(path) => {
            println!("{}", inspect_certificate(&path)?);
        }
        Mode::Example(Some(path)) => {
            generate_example_file(&path)?;
            info!(path = %path.display(), "wrote example config");
        }
        Mode::Example(None) => {
            write_example_config(&mut io::stdout().lock())?;
        }
        Mode::ConfigDir(dir) => {
            let options = GenerateOptions {
                output: cli.output_target()?,
                passphrase: cli.passphrase.clone(),
            };
            process_config_dir(&dir, &options)?;
        }
        Mode::ConfigFile(path) => {
            let options = GenerateOptions {
                output: cli.output_target()?,
                passphrase: cli.passphrase.clone(),
            };
            process_config_file(&path, &options)?;
        }
        Mode::Flags => {
            let output = cli.output_target()?;
            let mut overrides = cli.cfg.to_overrides();
            overrides.passphrase = cli.passphrase.clone();
            let (dn, config) = merge_settings(cli.dn.to_dn(), overrides)?;
            handle_single_cert(&dn, &config, None, &output)?;
        }
    }
    Ok(())
}
