//! Output writing primitives
//!
//! Artifacts are committed with tempfile + rename so a failed build never
//! leaves a partially-written file in the output directory.

use std::io::Write;
use std::path::Path;

use crate::error::SimpackResult;

/// Write content to a file atomically
///
/// The content lands in a temporary file in the destination directory and is
/// renamed into place, so readers never observe a partial write.
pub fn atomic_write(path: &Path, content: &[u8]) -> SimpackResult<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Compute the SHA-256 hash of content, in `sha256:<hex>` form
pub fn hash_content(content: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("sha256:{:x}", hasher.finalize())
}
