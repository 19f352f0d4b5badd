//! Delivery of PEM bundles to stdout or to per-certificate directories.
//!
//! Directory layout: `<root>/<name>[-N]/{cert.pem, csr.pem, key.pem}` where
//! `<name>` is the slug of the common name, else the slug of the label's file
//! stem, else [`FALLBACK_DIR_NAME`].

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::bundle::PemBundle;
use crate::config::DistinguishedName;
use crate::error::{CertToolError, Result};

pub const FALLBACK_DIR_NAME: &str = "cert";
pub const CERT_FILE: &str = "cert.pem";
pub const CSR_FILE: &str = "csr.pem";
pub const KEY_FILE: &str = "key.pem";

/// Where generated bundles go.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputTarget {
    #[default]
    Stdout,
    /// Root under which one subdirectory per certificate is created.
    Directory(PathBuf),
}

impl OutputTarget {
    /// Delivers `bundle`. Returns the created subdirectory in directory mode.
    pub fn write(
        &self,
        bundle: &PemBundle,
        dn: &DistinguishedName,
        label: Option<&str>,
    ) -> Result<Option<PathBuf>> {
        match self {
            OutputTarget::Stdout => {
                let stdout = io::stdout();
                let mut handle = stdout.lock();
                write_bundle_to(&mut handle, bundle, label)?;
                Ok(None)
            }
            OutputTarget::Directory(root) => write_bundle_to_dir(root, bundle, dn, label).map(Some),
        }
    }
}

/// Turns `value` into a filesystem-safe name.
///
/// Lower-cases and trims, keeps Unicode letters, digits and `.-_`, turns
/// whitespace into `_`, drops everything else and strips `.-_` from both
/// ends. An empty result becomes [`FALLBACK_DIR_NAME`].
pub fn slugify(value: &str) -> String {
    let slug: String = value
        .trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            c if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') => Some(c),
            c if c.is_whitespace() => Some('_'),
            _ => None,
        })
        .collect();
    let slug = slug.trim_matches(|c| matches!(c, '.' | '-' | '_'));
    if slug.is_empty() {
        FALLBACK_DIR_NAME.to_string()
    } else {
        slug.to_string()
    }
}

fn base_dir_name(dn: &DistinguishedName, label: Option<&str>) -> String {
    if let Some(cn) = dn.trimmed_common_name() {
        return slugify(cn);
    }
    label
        .and_then(|l| Path::new(l).file_stem())
        .map(|stem| slugify(&stem.to_string_lossy()))
        .unwrap_or_else(|| FALLBACK_DIR_NAME.to_string())
}

/// Creates a fresh subdirectory of `root` for one certificate.
///
/// Each candidate is created exclusively; when it already exists the next
/// numeric suffix is tried.
pub fn make_cert_subdir(root: &Path, dn: &DistinguishedName, label: Option<&str>) -> Result<PathBuf> {
    let base = base_dir_name(dn, label);
    let mut candidate = root.join(&base);
    let mut counter = 1u32;
    loop {
        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                debug!(path = %candidate.display(), "output directory exists, trying next suffix");
                candidate = root.join(format!("{base}-{counter}"));
                counter += 1;
            }
            Err(e) => {
                return Err(CertToolError::output(format!(
                    "Failed to create output directory {}: {e}",
                    candidate.display()
                )));
            }
        }
    }
}

/// Creates the output root, including missing parents.
pub fn prepare_output_dir(root: &Path) -> Result<()> {
    fs::create_dir_all(root).map_err(|e| {
        CertToolError::output(format!(
            "Failed to create output directory {}: {e}",
            root.display()
        ))
    })
}

/// Writes the bundle as three files into a new subdirectory of `root`.
pub fn write_bundle_to_dir(
    root: &Path,
    bundle: &PemBundle,
    dn: &DistinguishedName,
    label: Option<&str>,
) -> Result<PathBuf> {
    let subdir = make_cert_subdir(root, dn, label)?;
    let files = [
        (CERT_FILE, &bundle.certificate_pem),
        (CSR_FILE, &bundle.csr_pem),
        (KEY_FILE, &bundle.private_key_pem),
    ];
    for (name, contents) in files {
        fs::write(subdir.join(name), contents).map_err(|e| {
            CertToolError::output(format!(
                "Failed to write PEM files in {}: {e}",
                subdir.display()
            ))
        })?;
    }
    info!(path = %subdir.display(), "wrote certificate, CSR and key");
    Ok(subdir)
}

/// Prints the bundle with a heading before each document, preceded by a
/// banner when `label` is given.
pub fn write_bundle_to<W: Write>(writer: &mut W, bundle: &PemBundle, label: Option<&str>) -> Result<()> {
    render(writer, bundle, label)
        .map_err(|e| CertToolError::output(format!("Failed to write PEM output: {e}")))
}

fn render<W: Write>(w: &mut W, bundle: &PemBundle, label: Option<&str>) -> io::Result<()> {
    if let Some(label) = label {
        writeln!(w, "\n########## CONFIG: {label} ##########\n")?;
    }
    writeln!(w, "# Self-signed certificate (PEM)")?;
    writeln!(w, "{}", bundle.certificate_pem)?;
    writeln!(w, "# Certificate Signing Request (CSR, PEM)")?;
    writeln!(w, "{}", bundle.csr_pem)?;
    writeln!(w, "# Private Key (PEM)")?;
    writeln!(w, "{}", bundle.private_key_pem)?;
    w.flush()
}
