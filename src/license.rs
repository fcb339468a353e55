//! License classifier
//!
//! Every resource embedded in an artifact must be annotated in a
//! `license.json` manifest in its own directory. Classification applies a
//! fixed first-match rule order: canonical-site match, allowed-license
//! allow-list, named exception carve-outs, then default-problematic.
//!
//! Exceptions are data rows, not code branches: adding a carve-out means
//! adding a row to the policy table (usually via `simpack.toml`).
//!
//! Every classification is recorded in a [`LicenseReport`] owned by the
//! build run; the finalization gate consults that report alone.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{SimpackError, SimpackResult};

/// Filename of the per-directory manifest
pub const MANIFEST_NAME: &str = "license.json";

/// One resource's annotation from a `license.json` manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseEntry {
    /// Attribution / copyright statement
    #[serde(default)]
    pub text: String,
    /// Origin URL of the resource
    #[serde(default, rename = "projectURL")]
    pub project_url: String,
    /// License name, e.g. "Public Domain"
    #[serde(default)]
    pub license: String,
    /// Free-form notes
    #[serde(default)]
    pub notes: String,
    /// Why the file is shipped despite not matching policy
    #[serde(default)]
    pub exception: Option<String>,
}

/// Closed classification set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    /// No `license.json` next to the resource
    MissingManifest,
    /// Manifest exists but has no entry for the resource
    NotAnnotated,
    /// Produced by the organization itself
    FirstParty,
    /// Externally produced
    ThirdParty,
}

/// The classifier's verdict for one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseClassification {
    pub classification: Classification,
    pub problematic: bool,
    pub entry: Option<LicenseEntry>,
}

/// Which entry field an exception rule matches against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExceptionField {
    ProjectUrl,
    Notes,
}

/// A narrowly-scoped historical carve-out
///
/// Matches when the entry's chosen field contains `pattern`. Each rule must
/// name its rationale; carve-outs are audited, not anonymous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionRule {
    pub field: ExceptionField,
    pub pattern: String,
    pub rationale: String,
}

impl ExceptionRule {
    fn matches(&self, entry: &LicenseEntry) -> bool {
        let haystack = match self.field {
            ExceptionField::ProjectUrl => &entry.project_url,
            ExceptionField::Notes => &entry.notes,
        };
        !self.pattern.is_empty() && haystack.contains(&self.pattern)
    }
}

/// Compliance policy the classifier evaluates against
#[derive(Debug, Clone, Default)]
pub struct LicensePolicy {
    /// Origin URL equal to this marks a resource first-party
    pub canonical_site: String,
    /// Universally-compatible license names
    pub allowed_licenses: Vec<String>,
    /// Ordered exception table
    pub exceptions: Vec<ExceptionRule>,
}

impl LicensePolicy {
    /// Classify from a manifest entry (or its absence within a present manifest)
    ///
    /// Rule order is fixed, first match wins: canonical site, license
    /// allow-list, exception table, default-problematic.
    pub fn classify_entry(&self, entry: Option<&LicenseEntry>) -> LicenseClassification {
        let entry = match entry {
            Some(entry) => entry,
            None => {
                return LicenseClassification {
                    classification: Classification::NotAnnotated,
                    problematic: true,
                    entry: None,
                }
            }
        };

        let verdict = |classification, problematic| LicenseClassification {
            classification,
            problematic,
            entry: Some(entry.clone()),
        };

        if !self.canonical_site.is_empty() && entry.project_url == self.canonical_site {
            return verdict(Classification::FirstParty, false);
        }
        // compatible licenses still require the annotation that got us here
        if self.allowed_licenses.iter().any(|l| l == &entry.license) {
            return verdict(Classification::ThirdParty, false);
        }
        if self.exceptions.iter().any(|rule| rule.matches(entry)) {
            return verdict(Classification::ThirdParty, false);
        }
        verdict(Classification::ThirdParty, true)
    }

    /// Classify a resource file by consulting the sibling manifest
    ///
    /// An absent manifest classifies as `missing-manifest`; a manifest that
    /// exists but cannot be parsed is a build defect, not a classification.
    pub fn classify_file(&self, resource_path: &Path) -> SimpackResult<LicenseClassification> {
        let dir = resource_path.parent().unwrap_or_else(|| Path::new("."));
        let manifest_path = dir.join(MANIFEST_NAME);

        let content = match std::fs::read_to_string(&manifest_path) {
            Ok(content) => content,
            Err(_) => {
                return Ok(LicenseClassification {
                    classification: Classification::MissingManifest,
                    problematic: true,
                    entry: None,
                })
            }
        };

        let manifest: BTreeMap<String, LicenseEntry> =
            serde_json::from_str(&content).map_err(|e| SimpackError::MalformedManifest {
                file: manifest_path.clone(),
                message: e.to_string(),
            })?;

        let filename = resource_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(self.classify_entry(manifest.get(&filename)))
    }
}

/// Aggregate classification report for one build run
///
/// Owned by the orchestrator for exactly one run; the last classification
/// recorded for a name wins. Classification is idempotent for unchanged
/// manifest content, so overwriting cannot introduce inconsistency.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LicenseReport {
    entries: BTreeMap<String, LicenseClassification>,
}

/// The finalization gate's pass/fail decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Pass,
    /// Names of resources whose classification is problematic
    Fail(Vec<String>),
}

impl GateDecision {
    pub fn is_pass(&self) -> bool {
        matches!(self, GateDecision::Pass)
    }
}

impl LicenseReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a classification under a caller-supplied resource name
    pub fn record(&mut self, name: impl Into<String>, classification: LicenseClassification) {
        self.entries.insert(name.into(), classification);
    }

    pub fn get(&self, name: &str) -> Option<&LicenseClassification> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LicenseClassification)> {
        self.entries.iter().map(|(name, c)| (name.as_str(), c))
    }

    /// Decide whether the build may ship
    pub fn gate(&self) -> GateDecision {
        let problems: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, c)| c.problematic)
            .map(|(name, _)| name.clone())
            .collect();
        if problems.is_empty() {
            GateDecision::Pass
        } else {
            GateDecision::Fail(problems)
        }
    }

    /// Pretty JSON for `license-report.json`
    pub fn to_json_pretty(&self) -> SimpackResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Classify every file under `dir` recursively, recording each verdict
///
/// Resources are recorded under their `project_root`-relative name with `/`
/// separators; the manifest files themselves are not classified.
pub fn classify_tree(
    policy: &LicensePolicy,
    report: &mut LicenseReport,
    project_root: &Path,
    dir: &Path,
) -> SimpackResult<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            classify_tree(policy, report, project_root, &path)?;
            continue;
        }
        if path.file_name().map(|n| n == MANIFEST_NAME).unwrap_or(false) {
            continue;
        }
        let name = path
            .strip_prefix(project_root)
            .unwrap_or(&path)
            .to_string_lossy()
            .replace('\\', "/");
        classify_resource(policy, report, &name, &path)?;
    }
    Ok(())
}

/// Classify a resource and record the verdict in the report
pub fn classify_resource(
    policy: &LicensePolicy,
    report: &mut LicenseReport,
    name: &str,
    resource_path: &Path,
) -> SimpackResult<LicenseClassification> {
    let classification = policy.classify_file(resource_path)?;
    report.record(name, classification.clone());
    Ok(classification)
}
