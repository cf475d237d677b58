use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

pub mod path_utils;
pub mod plan;

pub use plan::{plan, ReconciliationPlan};

/// Declarative list of files an install tree is expected to contain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Manifest {
    pub files: Vec<FileDescriptor>,
}

/// One expected file: install-relative name, ordered mirror URLs, and an
/// optional expected CRC32. Absent checksum means "always refresh unless
/// ignored".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileDescriptor {
    pub name: String,
    pub mirrors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crc: Option<String>,
}

impl FileDescriptor {
    /// Final path component of `name`; the ignore set matches on this, and
    /// staged downloads are written under it.
    pub fn file_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// Install location, derived as `install_root / name`.
    pub fn target_path(&self, install_root: &Utf8Path) -> Utf8PathBuf {
        install_root.join(path_utils::normalize(&self.name))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("descriptor has an empty name")]
    EmptyName,
    #[error("descriptor {name} lists no mirrors")]
    NoMirrors { name: String },
    #[error("descriptor {name} has an unsafe path")]
    UnsafePath { name: String },
    #[error("manifest parse failed: {0}")]
    Parse(#[from] serde_json::Error),
}

impl Manifest {
    /// Parse and validate a manifest document. Checksums are lowercased at
    /// this boundary so later comparisons are byte-for-byte.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ManifestError> {
        let mut manifest: Manifest = serde_json::from_slice(bytes)?;
        for desc in &mut manifest.files {
            if desc.name.is_empty() {
                return Err(ManifestError::EmptyName);
            }
            if desc.mirrors.is_empty() {
                return Err(ManifestError::NoMirrors {
                    name: desc.name.clone(),
                });
            }
            if !path_utils::verify_safe(&desc.name) {
                return Err(ManifestError::UnsafePath {
                    name: desc.name.clone(),
                });
            }
            if let Some(crc) = desc.crc.take() {
                desc.crc = Some(crc.to_lowercase());
            }
        }
        Ok(manifest)
    }
}
