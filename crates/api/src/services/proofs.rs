//! Content store for uploaded payment proofs.
//!
//! Files are written under a fresh UUID name into the upload directory and
//! served back read-only under [`PROOF_URL_PREFIX`].

use std::path::{Path, PathBuf};

use uuid::Uuid;

/// URL path under which the upload directory is served.
pub const PROOF_URL_PREFIX: &str = "/uploaded_proofs";

const DEFAULT_EXTENSION: &str = "jpg";
const MAX_EXTENSION_LEN: usize = 8;

/// A proof file that was written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredProof {
    pub path: PathBuf,
    /// Reference recorded on the order, e.g. `/uploaded_proofs/<uuid>.jpg`.
    pub url: String,
}

/// Writes and removes proof files in a single directory.
#[derive(Debug, Clone)]
pub struct ProofStore {
    dir: PathBuf,
}

impl ProofStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` to a new file, creating the directory when missing.
    ///
    /// The extension comes from `filename` when it is short and
    /// alphanumeric; otherwise `jpg` is used.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the directory or file cannot be written.
    pub async fn save(&self, bytes: &[u8], filename: Option<&str>) -> std::io::Result<StoredProof> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let name = format!("{}.{}", Uuid::new_v4(), proof_extension(filename));
        let path = self.dir.join(&name);
        tokio::fs::write(&path, bytes).await?;

        Ok(StoredProof {
            path,
            url: format!("{PROOF_URL_PREFIX}/{name}"),
        })
    }

    /// Remove a file written by [`save`](Self::save). Failures are logged only.
    pub async fn discard(&self, proof: &StoredProof) {
        if let Err(e) = tokio::fs::remove_file(&proof.path).await {
            tracing::warn!(
                path = %proof.path.display(),
                error = %e,
                "Failed to remove orphaned proof file"
            );
        }
    }
}

/// Lowercased extension of `filename`, or `jpg` when absent or unusual.
fn proof_extension(filename: Option<&str>) -> String {
    filename
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            (1..=MAX_EXTENSION_LEN).contains(&ext.len())
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map_or_else(|| DEFAULT_EXTENSION.to_string(), str::to_ascii_lowercase)
}
