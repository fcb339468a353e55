//! Build configuration (`simpack.toml`)
//!
//! Configuration covers everything that is a property of *how* to build
//! rather than *what* to build: output directory, brand, locales, and the
//! license compliance policy. Unknown keys are reported as warnings rather
//! than silently ignored.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{SimpackError, SimpackResult};
use crate::license::{ExceptionRule, LicensePolicy};

/// Build brand, selecting the legal header variant of the artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Brand {
    /// Openly redistributable build
    #[default]
    Standard,
    /// Interoperable build requiring a separate license agreement
    Interop,
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub build: BuildConfig,
    pub license: LicenseConfig,
}

/// `[build]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Directory artifacts are committed to
    pub output_dir: PathBuf,
    /// Brand for the legal header
    pub brand: Brand,
    /// Locale used when a translation is missing a string
    pub fallback_locale: String,
    /// Locales to build (the fallback locale is always included)
    pub locales: Vec<String>,
    /// Build one artifact embedding every available locale
    pub all_locales: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("build"),
            brand: Brand::Standard,
            fallback_locale: "en".to_string(),
            locales: vec!["en".to_string()],
            all_locales: false,
        }
    }
}

/// `[license]` section - compliance policy for embedded resources
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LicenseConfig {
    /// Fail the build on problematic classifications
    pub enforce: bool,
    /// Origin URL that marks a resource as first-party
    pub canonical_site: String,
    /// License names that are always compatible
    pub allowed_licenses: Vec<String>,
    /// Narrow, named carve-outs (additions to data, not code)
    pub exceptions: Vec<ExceptionRule>,
}

impl Default for LicenseConfig {
    fn default() -> Self {
        Self {
            enforce: true,
            canonical_site: String::new(),
            allowed_licenses: vec![
                "Public Domain".to_string(),
                "US Government Work".to_string(),
            ],
            exceptions: Vec::new(),
        }
    }
}

impl LicenseConfig {
    /// Build the classifier policy from this section
    pub fn policy(&self) -> LicensePolicy {
        LicensePolicy {
            canonical_site: self.canonical_site.clone(),
            allowed_licenses: self.allowed_licenses.clone(),
            exceptions: self.exceptions.clone(),
        }
    }
}

/// A warning emitted for an unrecognized config key
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub key: String,
    pub file: PathBuf,
}

impl Config {
    /// Load configuration, discarding unknown-key warnings
    pub fn load(path: &Path) -> SimpackResult<Self> {
        let (config, _warnings) = Self::load_with_warnings(path)?;
        Ok(config)
    }

    /// Load configuration, reporting unknown keys
    pub fn load_with_warnings(path: &Path) -> SimpackResult<(Self, Vec<ConfigWarning>)> {
        let content = fs::read_to_string(path)?;

        let mut unknown_paths: Vec<String> = Vec::new();
        let deserializer = toml::de::Deserializer::new(&content);

        let config: Self = serde_ignored::deserialize(deserializer, |ignored| {
            unknown_paths.push(ignored.to_string());
        })
        .map_err(|e| SimpackError::Config {
            file: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let warnings = unknown_paths
            .into_iter()
            .map(|key| ConfigWarning {
                key,
                file: path.to_path_buf(),
            })
            .collect();

        Ok((config, warnings))
    }

    /// Load `simpack.toml` from the project root; defaults only when absent
    ///
    /// A file that exists but fails to parse is fatal: falling back to
    /// defaults would silently drop the license policy it carries.
    pub fn load_or_default(project_root: &Path) -> SimpackResult<(Self, Vec<ConfigWarning>)> {
        let path = project_root.join("simpack.toml");
        if path.exists() {
            Self::load_with_warnings(&path)
        } else {
            Ok((Self::default(), Vec::new()))
        }
    }

    /// Locales to build: configured list with the fallback locale first
    pub fn locales_to_build(&self) -> Vec<String> {
        let mut locales = vec![self.build.fallback_locale.clone()];
        for locale in &self.build.locales {
            if !locales.contains(locale) {
                locales.push(locale.clone());
            }
        }
        locales
    }
}
