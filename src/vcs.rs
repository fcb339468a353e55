//! Dependency resolver
//!
//! Collects version-control identity (revision + branch) for every declared
//! dependency by querying git metadata one repository at a time. Queries are
//! strictly sequential: git serializes access per invocation and concurrent
//! invocations against sibling checkouts are unreliable, so the serialization
//! here is deliberate, not a performance limitation.

use chrono::Utc;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::descriptor::PackageDescriptor;
use crate::error::{SimpackError, SimpackResult};

/// Version-control metadata source for one dependency repository
pub trait VcsQuery {
    /// Current revision identifier (e.g. commit SHA) of the named repository
    fn revision(&self, name: &str) -> SimpackResult<String>;

    /// Current branch name of the named repository
    fn branch(&self, name: &str) -> SimpackResult<String>;
}

/// Queries git checkouts living as siblings under a common root
///
/// Runs `git --git-dir <root>/<name>/.git rev-parse ...` per query.
pub struct GitCli {
    siblings_root: PathBuf,
}

impl GitCli {
    pub fn new(siblings_root: impl Into<PathBuf>) -> Self {
        Self {
            siblings_root: siblings_root.into(),
        }
    }

    fn run(&self, name: &str, args: &[&str]) -> SimpackResult<String> {
        let git_dir = self.siblings_root.join(name).join(".git");

        let output = Command::new("git")
            .arg("--git-dir")
            .arg(&git_dir)
            .args(args)
            .output()
            .map_err(|e| SimpackError::VcsQuery {
                dependency: name.to_string(),
                message: format!("failed to spawn git: {}", e),
            })?;

        if !output.status.success() {
            return Err(SimpackError::VcsQuery {
                dependency: name.to_string(),
                message: format!(
                    "git {} exited with {:?}: {}",
                    args.join(" "),
                    output.status.code(),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if value.is_empty() {
            return Err(SimpackError::VcsQuery {
                dependency: name.to_string(),
                message: format!("git {} produced no output", args.join(" ")),
            });
        }
        Ok(value)
    }
}

impl VcsQuery for GitCli {
    fn revision(&self, name: &str) -> SimpackResult<String> {
        self.run(name, &["rev-parse", "HEAD"])
    }

    fn branch(&self, name: &str) -> SimpackResult<String> {
        self.run(name, &["rev-parse", "--abbrev-ref", "HEAD"])
    }
}

/// Version-control identity of one dependency, immutable once written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRecord {
    pub revision: String,
    pub branch: String,
}

/// Resolved dependency records in declaration order, plus a header comment
#[derive(Debug, Clone, Default)]
pub struct DependencyManifest {
    /// `# <name> <version> <timestamp>` header
    pub comment: String,
    entries: Vec<(String, DependencyRecord)>,
}

impl DependencyManifest {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&DependencyRecord> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, record)| record)
    }

    /// Records in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DependencyRecord)> {
        self.entries
            .iter()
            .map(|(name, record)| (name.as_str(), record))
    }

    /// Pretty JSON document for `dependencies.json` and the artifact placeholder
    pub fn to_json_pretty(&self) -> SimpackResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// Serialized as a JSON object with the comment first and one member per
// dependency in declaration order.
impl Serialize for DependencyManifest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(serde::Serialize)]
        struct RecordRepr<'a> {
            revision: &'a str,
            branch: &'a str,
        }

        let mut map = serializer.serialize_map(Some(self.entries.len() + 1))?;
        map.serialize_entry("comment", &self.comment)?;
        for (name, record) in &self.entries {
            map.serialize_entry(
                name,
                &RecordRepr {
                    revision: &record.revision,
                    branch: &record.branch,
                },
            )?;
        }
        map.end()
    }
}

/// Resolve every declared dependency, sequentially and in declaration order
///
/// The branch query of a dependency does not start until its revision query
/// completed, and the next dependency does not start until the current record
/// is written. Any query failure aborts the build; there is no retry.
pub fn resolve_dependencies(
    descriptor: &PackageDescriptor,
    vcs: &dyn VcsQuery,
) -> SimpackResult<DependencyManifest> {
    let mut seen = HashSet::new();
    for name in &descriptor.dependencies {
        if !seen.insert(name.as_str()) {
            return Err(SimpackError::DuplicateDependency {
                name: name.clone(),
                file: descriptor.source_file.clone(),
            });
        }
    }

    let mut manifest = DependencyManifest {
        comment: format!(
            "# {} {} {}",
            descriptor.name,
            descriptor.version,
            Utc::now().to_rfc2822()
        ),
        entries: Vec::with_capacity(descriptor.dependencies.len()),
    };

    for name in &descriptor.dependencies {
        let revision = vcs.revision(name)?;
        let branch = vcs.branch(name)?;
        manifest
            .entries
            .push((name.clone(), DependencyRecord { revision, branch }));
    }

    Ok(manifest)
}

/// Discover whether a sibling checkout looks like a git repository
pub fn has_git_metadata(siblings_root: &Path, name: &str) -> bool {
    siblings_root.join(name).join(".git").exists()
}
