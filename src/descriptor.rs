//! Package descriptor
//!
//! The descriptor is the JSON document driving a build: simulation identity
//! (name, version, license), the ordered dependency list, preload scripts,
//! the compiled main bundle, the template and string files, resource roots,
//! and the mipmap request list.
//!
//! Required-field presence and duplicate-dependency checks run before any
//! stage touches an external tool, so configuration mistakes fail fast.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{SimpackError, SimpackResult};
use crate::mipmap::MipmapRequest;

/// Fields of the descriptor as they appear on disk.
///
/// Everything the validator treats as required is an `Option` here so a
/// missing field produces a named `MissingField` error instead of an opaque
/// serde message.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDescriptor {
    name: Option<String>,
    version: Option<String>,
    license: Option<String>,
    title_string_key: Option<String>,
    main: Option<PathBuf>,
    template: Option<PathBuf>,
    strings: Option<PathBuf>,
    iframe_template: Option<PathBuf>,
    #[serde(default)]
    dependencies: Vec<String>,
    #[serde(default)]
    preload: Vec<PathBuf>,
    #[serde(default)]
    resource_roots: Vec<PathBuf>,
    #[serde(default)]
    mipmaps: Vec<MipmapRequest>,
}

/// A validated package descriptor
#[derive(Debug, Clone)]
pub struct PackageDescriptor {
    /// Simulation name (kebab-case, used in output filenames)
    pub name: String,
    /// Version string embedded in artifacts and the dependency manifest
    pub version: String,
    /// License name for the legal header
    pub license: String,
    /// String key resolved per locale for the artifact title
    pub title_string_key: String,
    /// Compiled main bundle, produced by the external bundling step
    pub main: PathBuf,
    /// Template document with `{{TOKEN}}` placeholders
    pub template: PathBuf,
    /// Per-locale string map document
    pub strings: PathBuf,
    /// Optional template for the iframe-embedding test page
    pub iframe_template: Option<PathBuf>,
    /// Ordered dependency repository names
    pub dependencies: Vec<String>,
    /// Scripts inlined ahead of the main bundle, in order
    pub preload: Vec<PathBuf>,
    /// Directories whose files must carry license annotations
    pub resource_roots: Vec<PathBuf>,
    /// Mipmap generation requests
    pub mipmaps: Vec<MipmapRequest>,
    /// Where the descriptor was loaded from (for error messages)
    pub source_file: PathBuf,
}

impl PackageDescriptor {
    /// Load and validate a descriptor from a JSON file
    pub fn load(path: &Path) -> SimpackResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content, path)
    }

    /// Parse and validate a descriptor from JSON text
    pub fn from_json(json: &str, source_file: &Path) -> SimpackResult<Self> {
        let raw: RawDescriptor = serde_json::from_str(json)?;

        let missing = |field: &str| SimpackError::MissingField {
            field: field.to_string(),
            file: source_file.to_path_buf(),
        };

        let required = |value: Option<String>, field: &str| match value {
            Some(v) if !v.trim().is_empty() => Ok(v),
            _ => Err(missing(field)),
        };

        let descriptor = Self {
            name: required(raw.name, "name")?,
            version: required(raw.version, "version")?,
            license: required(raw.license, "license")?,
            title_string_key: required(raw.title_string_key, "titleStringKey")?,
            main: raw.main.ok_or_else(|| missing("main"))?,
            template: raw.template.ok_or_else(|| missing("template"))?,
            strings: raw.strings.ok_or_else(|| missing("strings"))?,
            iframe_template: raw.iframe_template,
            dependencies: raw.dependencies,
            preload: raw.preload,
            resource_roots: raw.resource_roots,
            mipmaps: raw.mipmaps,
            source_file: source_file.to_path_buf(),
        };

        descriptor.check_duplicate_dependencies()?;
        Ok(descriptor)
    }

    /// Reject duplicate dependency names before resolution begins
    pub fn check_duplicate_dependencies(&self) -> SimpackResult<()> {
        let mut seen = HashSet::new();
        for name in &self.dependencies {
            if !seen.insert(name.as_str()) {
                return Err(SimpackError::DuplicateDependency {
                    name: name.clone(),
                    file: self.source_file.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "name": "energy-forms",
        "version": "1.2.0",
        "license": "MIT",
        "titleStringKey": "energy-forms.title",
        "main": "build/energy-forms.min.js",
        "template": "templates/sim.html",
        "strings": "strings.json"
    }"#;

    #[test]
    fn minimal_descriptor_parses() {
        let d = PackageDescriptor::from_json(MINIMAL, Path::new("package.json")).unwrap();
        assert_eq!(d.name, "energy-forms");
        assert_eq!(d.version, "1.2.0");
        assert!(d.dependencies.is_empty());
        assert!(d.mipmaps.is_empty());
        assert!(d.iframe_template.is_none());
    }

    #[test]
    fn missing_version_is_named() {
        let json = r#"{
            "name": "energy-forms",
            "license": "MIT",
            "titleStringKey": "energy-forms.title",
            "main": "a.js",
            "template": "t.html",
            "strings": "s.json"
        }"#;
        let err = PackageDescriptor::from_json(json, Path::new("package.json")).unwrap_err();
        assert!(matches!(
            err,
            SimpackError::MissingField { ref field, .. } if field == "version"
        ));
    }

    #[test]
    fn empty_name_counts_as_missing() {
        let json = MINIMAL.replace("energy-forms\",", "  \",");
        let err = PackageDescriptor::from_json(&json, Path::new("package.json")).unwrap_err();
        assert!(matches!(err, SimpackError::MissingField { ref field, .. } if field == "name"));
    }

    #[test]
    fn duplicate_dependency_rejected() {
        let json = r#"{
            "name": "energy-forms",
            "version": "1.2.0",
            "license": "MIT",
            "titleStringKey": "energy-forms.title",
            "main": "a.js",
            "template": "t.html",
            "strings": "s.json",
            "dependencies": ["lib-a", "lib-b", "lib-a"]
        }"#;
        let err = PackageDescriptor::from_json(json, Path::new("package.json")).unwrap_err();
        assert!(matches!(
            err,
            SimpackError::DuplicateDependency { ref name, .. } if name == "lib-a"
        ));
    }

    #[test]
    fn mipmap_requests_parse() {
        let json = r#"{
            "name": "energy-forms",
            "version": "1.2.0",
            "license": "MIT",
            "titleStringKey": "energy-forms.title",
            "main": "a.js",
            "template": "t.html",
            "strings": "s.json",
            "mipmaps": [
                {"name": "logo", "source": "images/logo.png", "width": 600, "height": 394, "maxLevel": 4}
            ]
        }"#;
        let d = PackageDescriptor::from_json(json, Path::new("package.json")).unwrap();
        assert_eq!(d.mipmaps.len(), 1);
        assert_eq!(d.mipmaps[0].name, "logo");
        assert_eq!(d.mipmaps[0].max_level, 4);
    }
}
