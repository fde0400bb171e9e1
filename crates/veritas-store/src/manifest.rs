//! Boot-manifest integrity verification.
//!
//! A manifest is a YAML document listing files and their expected SHA-256
//! digests under `spec.integrity.verify`:
//!
//! ```yaml
//! spec:
//!   integrity:
//!     verify:
//!       - path: boot/kernel.md
//!         sha256: 3a7bd3e2360a3d29eea436fcfb7e44c735d117c42d1c1835420b6b9942dd4f1b
//!       - path: boot/charter.md
//!         sha256: <fill-from-cvcm>
//! ```
//!
//! Entries whose digest is still the placeholder are reported but only
//! count as failures in strict mode.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use ring::digest::{Context, SHA256};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::StoreError;

pub const DEFAULT_MANIFEST_PATH: &str = "boot/BP-01-Omnis-Initium.yaml";

/// Digest value meaning "not yet computed".
pub const PLACEHOLDER_HASH: &str = "<fill-from-cvcm>";

/// Exit status for a failed verification or a missing manifest.
pub const FAILURE_EXIT_CODE: i32 = 2;

#[derive(Debug, Default, Deserialize)]
struct Manifest {
    spec: Option<ManifestSpec>,
}

#[derive(Debug, Default, Deserialize)]
struct ManifestSpec {
    integrity: Option<Integrity>,
}

#[derive(Debug, Default, Deserialize)]
struct Integrity {
    #[serde(default)]
    verify: Vec<VerifyEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyEntry {
    #[serde(default, deserialize_with = "scalar_string")]
    pub path: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub sha256: Option<String>,
}

/// Accept any YAML scalar as a string: an unquoted digest made only of
/// digits (or digits and a single `e`) would otherwise parse as a number.
fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<serde_yaml::Value>::deserialize(deserializer)? {
        Some(serde_yaml::Value::String(s)) => Some(s),
        Some(serde_yaml::Value::Number(n)) => Some(n.to_string()),
        Some(serde_yaml::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Outcome for a single manifest entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryStatus {
    Ok {
        path: String,
    },
    Mismatch {
        path: String,
        expected: String,
        actual: String,
    },
    MissingFile {
        path: String,
    },
    MissingPath,
    /// Present but could not be hashed (a directory, no read permission).
    Unreadable {
        path: String,
        error: String,
    },
    NoExpectedHash {
        path: String,
    },
}

impl EntryStatus {
    pub fn is_failure(&self, strict: bool) -> bool {
        match self {
            Self::Ok { .. } => false,
            Self::NoExpectedHash { .. } => strict,
            Self::Mismatch { .. }
            | Self::MissingFile { .. }
            | Self::MissingPath
            | Self::Unreadable { .. } => true,
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok { path } => write!(f, "OK: {path} matches"),
            Self::Mismatch {
                path,
                expected,
                actual,
            } => write!(f, "HASH MISMATCH: {path} expected {expected} got {actual}"),
            Self::MissingFile { path } => write!(f, "MISSING FILE: {path}"),
            Self::MissingPath => write!(f, "MISSING path in verify entry"),
            Self::Unreadable { path, error } => write!(f, "UNREADABLE: {path} ({error})"),
            Self::NoExpectedHash { path } => write!(f, "NO EXPECTED HASH SET FOR: {path}"),
        }
    }
}

/// Per-entry results of one verification run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestReport {
    pub entries: Vec<EntryStatus>,
    pub strict: bool,
}

impl ManifestReport {
    pub fn failures(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.is_failure(self.strict))
            .count()
    }

    pub fn passed(&self) -> bool {
        self.failures() == 0
    }

    pub fn exit_code(&self) -> i32 {
        if self.passed() { 0 } else { FAILURE_EXIT_CODE }
    }
}

impl fmt::Display for ManifestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{entry}")?;
        }
        writeln!(f)?;
        if self.passed() {
            write!(f, "Manifest verification passed")
        } else {
            write!(f, "Manifest verification failed")
        }
    }
}

/// Verify every entry of the manifest at `manifest_path`.
///
/// Relative entry paths resolve against `root`. Only a missing or
/// unparseable manifest is an error; per-entry problems land in the report.
pub fn verify_manifest(
    manifest_path: &Path,
    root: &Path,
    strict: bool,
) -> Result<ManifestReport, StoreError> {
    if !manifest_path.exists() {
        return Err(StoreError::ManifestNotFound(manifest_path.to_path_buf()));
    }
    let text = std::fs::read_to_string(manifest_path)?;
    let manifest: Option<Manifest> = serde_yaml::from_str(&text)?;
    let verify = manifest
        .and_then(|m| m.spec)
        .and_then(|s| s.integrity)
        .map(|i| i.verify)
        .unwrap_or_default();

    info!(manifest = %manifest_path.display(), entries = verify.len(), "verifying boot manifest");
    let entries = verify.iter().map(|entry| check_entry(entry, root)).collect();

    Ok(ManifestReport { entries, strict })
}

fn check_entry(entry: &VerifyEntry, root: &Path) -> EntryStatus {
    let Some(path) = entry.path.as_deref().filter(|p| !p.is_empty()) else {
        return EntryStatus::MissingPath;
    };
    let resolved = resolve(root, path);
    if !resolved.exists() {
        return EntryStatus::MissingFile { path: path.into() };
    }

    let expected = match entry.sha256.as_deref().map(str::trim) {
        Some(h) if !h.is_empty() && h != PLACEHOLDER_HASH => h,
        _ => return EntryStatus::NoExpectedHash { path: path.into() },
    };

    let actual = match sha256_file(&resolved) {
        Ok(digest) => digest,
        Err(e) => {
            warn!(path, error = %e, "manifest entry unreadable");
            return EntryStatus::Unreadable {
                path: path.into(),
                error: e.to_string(),
            };
        }
    };
    debug!(path, %actual, "hashed manifest entry");
    if actual.eq_ignore_ascii_case(expected) {
        EntryStatus::Ok { path: path.into() }
    } else {
        EntryStatus::Mismatch {
            path: path.into(),
            expected: expected.into(),
            actual,
        }
    }
}

fn resolve(root: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() { p.to_path_buf() } else { root.join(p) }
}

/// Lowercase hex SHA-256 of a file's contents.
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut context = Context::new(&SHA256);
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        context.update(&buf[..n]);
    }
    Ok(hex::encode(context.finish().as_ref()))
}
