use crate::StampError;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Source of the raw bytes backing a template and the stamping font.
///
/// The engine loads each asset once per batch and shares the buffers
/// read-only across workers; implementations do not need to cache.
pub trait AssetSource: Send + Sync {
    fn template_bytes(&self, template_id: &str) -> Result<Vec<u8>, StampError>;
    fn font_bytes(&self) -> Result<Vec<u8>, StampError>;
}

/// Filesystem-backed assets: `<root>/<template_id>.pdf` plus one font file.
///
/// Template bytes can be pinned to a SHA-256 digest so a silently swapped
/// file on disk fails loudly instead of producing misplaced stamps.
#[derive(Debug, Clone)]
pub struct DirAssets {
    root: PathBuf,
    font_path: PathBuf,
    sha256_pins: BTreeMap<String, String>,
}

impl DirAssets {
    pub fn new(root: impl Into<PathBuf>, font_path: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            font_path: font_path.into(),
            sha256_pins: BTreeMap::new(),
        }
    }

    pub fn pin_sha256(mut self, template_id: impl Into<String>, hex: impl Into<String>) -> Self {
        self.sha256_pins
            .insert(template_id.into(), hex.into().to_ascii_lowercase());
        self
    }

    fn template_path(&self, template_id: &str) -> PathBuf {
        self.root.join(format!("{}.pdf", template_id))
    }
}

impl AssetSource for DirAssets {
    fn template_bytes(&self, template_id: &str) -> Result<Vec<u8>, StampError> {
        let path = self.template_path(template_id);
        let bytes = read_asset(&path, "template")?;
        if let Some(expected) = self.sha256_pins.get(template_id) {
            let actual = sha256_hex(&bytes);
            if &actual != expected {
                return Err(StampError::AssetMissing(format!(
                    "template {} failed sha256 pin: expected {} found {}",
                    template_id, expected, actual
                )));
            }
        }
        Ok(bytes)
    }

    fn font_bytes(&self) -> Result<Vec<u8>, StampError> {
        read_asset(&self.font_path, "font")
    }
}

/// In-memory assets for tests and embedding callers that manage bytes themselves.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    templates: BTreeMap<String, Vec<u8>>,
    font: Vec<u8>,
}

impl MemoryAssets {
    pub fn new(font: Vec<u8>) -> Self {
        Self {
            templates: BTreeMap::new(),
            font,
        }
    }

    pub fn with_template(mut self, template_id: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.templates.insert(template_id.into(), bytes);
        self
    }
}

impl AssetSource for MemoryAssets {
    fn template_bytes(&self, template_id: &str) -> Result<Vec<u8>, StampError> {
        self.templates
            .get(template_id)
            .cloned()
            .ok_or_else(|| {
                StampError::AssetMissing(format!("no template bytes for {}", template_id))
            })
    }

    fn font_bytes(&self) -> Result<Vec<u8>, StampError> {
        if self.font.is_empty() {
            return Err(StampError::AssetMissing("no font bytes".to_string()));
        }
        Ok(self.font.clone())
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

fn read_asset(path: &Path, kind: &str) -> Result<Vec<u8>, StampError> {
    std::fs::read(path).map_err(|err| {
        StampError::AssetMissing(format!("{} {}: {}", kind, path.display(), err))
    })
}
