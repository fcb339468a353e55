//! Mipmap aggregator
//!
//! Fans out one generation call per requested asset, each on its own scoped
//! thread, and fans in over a channel. The barrier releases only after one
//! completion per request has been observed; duplicate completions for the
//! same slot do not advance the count. The final manifest orders assets by
//! declaration and levels by generation order, independent of arrival order.
//!
//! Pixel resampling itself is an external collaborator behind the
//! [`MipmapGenerator`] trait; the built-in [`DataUriGenerator`] stands in at
//! that boundary by encoding the source file and halving declared dimensions.

use base64::Engine;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

use crate::error::{SimpackError, SimpackResult};

fn default_quality() -> u32 {
    98
}

/// One declared mipmap generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MipmapRequest {
    /// Asset name, unique key in the manifest
    pub name: String,
    /// Source image path, relative to the project root
    pub source: PathBuf,
    /// Full-resolution width
    pub width: u32,
    /// Full-resolution height
    pub height: u32,
    /// Highest level to generate (level 0 = full resolution)
    #[serde(default)]
    pub max_level: u32,
    /// Encoder quality parameter
    #[serde(default = "default_quality")]
    pub quality: u32,
}

/// One resolution variant of an asset
///
/// `url` is the embedded encoded-image reference (a data URI); the level owns
/// no raw pixel storage beyond this encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MipLevel {
    pub width: u32,
    pub height: u32,
    pub url: String,
}

/// Combined mipmap manifest: asset name -> ordered levels
#[derive(Debug, Clone, Default)]
pub struct MipmapManifest {
    entries: Vec<(String, Vec<MipLevel>)>,
}

impl MipmapManifest {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&[MipLevel]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, levels)| levels.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[MipLevel])> {
        self.entries
            .iter()
            .map(|(name, levels)| (name.as_str(), levels.as_slice()))
    }

    /// Compact JSON for embedding into the artifact placeholder
    pub fn to_embed_json(&self) -> SimpackResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Serialize for MipmapManifest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, levels) in &self.entries {
            map.serialize_entry(name, levels)?;
        }
        map.end()
    }
}

/// External mip-generation operation
///
/// Implementations must return levels in generation order, index = mip level,
/// first element = full resolution.
pub trait MipmapGenerator: Sync {
    fn generate(&self, request: &MipmapRequest) -> Result<Vec<MipLevel>, String>;
}

/// Stand-in generator at the pixel-pipeline boundary
///
/// Encodes the source file as a data URI once and derives level dimensions by
/// halving the declared size. A real resampling renderer plugs in through the
/// same trait.
pub struct DataUriGenerator {
    project_root: PathBuf,
}

impl DataUriGenerator {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
        }
    }
}

impl MipmapGenerator for DataUriGenerator {
    fn generate(&self, request: &MipmapRequest) -> Result<Vec<MipLevel>, String> {
        let path = self.project_root.join(&request.source);
        let bytes = std::fs::read(&path)
            .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;

        let mime = match path.extension().and_then(|e| e.to_str()) {
            Some("png") => "image/png",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("svg") => "image/svg+xml",
            Some("gif") => "image/gif",
            other => {
                return Err(format!(
                    "unsupported image extension {:?} for {}",
                    other,
                    path.display()
                ))
            }
        };

        let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
        let url = format!("data:{};base64,{}", mime, encoded);

        // dimensions bottom out at 1x1; max_level is unvalidated descriptor
        // input and may exceed the shift width of the type
        let mut levels = Vec::new();
        for level in 0..=request.max_level {
            let width = request.width.checked_shr(level).unwrap_or(0).max(1);
            let height = request.height.checked_shr(level).unwrap_or(0).max(1);
            levels.push(MipLevel {
                width,
                height,
                url: url.clone(),
            });
            if width == 1 && height == 1 {
                break;
            }
        }
        Ok(levels)
    }
}

/// Generate all requested mipmaps concurrently and gather them into a manifest
///
/// An empty request list yields an empty manifest immediately. A failure in
/// any single generation call fails the whole build; no partial manifest is
/// returned.
pub fn aggregate_mipmaps(
    requests: &[MipmapRequest],
    generator: &dyn MipmapGenerator,
) -> SimpackResult<MipmapManifest> {
    if requests.is_empty() {
        return Ok(MipmapManifest::default());
    }

    let mut slots: Vec<Option<Vec<MipLevel>>> = vec![None; requests.len()];

    thread::scope(|scope| -> SimpackResult<()> {
        let (tx, rx) = mpsc::channel();

        for (index, request) in requests.iter().enumerate() {
            let tx = tx.clone();
            scope.spawn(move || {
                let outcome = generator.generate(request);
                // receiver gone means the build already failed
                let _ = tx.send((index, outcome));
            });
        }
        drop(tx);

        let mut completed = 0usize;
        while completed < requests.len() {
            let (index, outcome) = rx.recv().map_err(|_| SimpackError::MipmapFailed {
                asset: "(aggregator)".to_string(),
                message: "a generation worker exited without completing".to_string(),
            })?;

            let levels = outcome.map_err(|message| SimpackError::MipmapFailed {
                asset: requests[index].name.clone(),
                message,
            })?;

            // only the first completion for a slot advances the barrier
            if slots[index].replace(levels).is_none() {
                completed += 1;
            }
        }
        Ok(())
    })?;

    let mut manifest = MipmapManifest::default();
    for (request, slot) in requests.iter().zip(slots) {
        match slot {
            Some(levels) => manifest.entries.push((request.name.clone(), levels)),
            None => {
                return Err(SimpackError::MipmapFailed {
                    asset: request.name.clone(),
                    message: "no completion observed".to_string(),
                })
            }
        }
    }
    Ok(manifest)
}
