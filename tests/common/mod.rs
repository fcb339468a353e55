//! Shared test helpers - temp project scaffolding.

pub mod fixtures;

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A throwaway simulation project on disk
pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    /// A complete minimal project: descriptor, template, strings, scripts
    pub fn new() -> Self {
        let project = Self {
            dir: tempfile::tempdir().expect("create temp project"),
        };
        project.write("package.json", fixtures::DESCRIPTOR);
        project.write("templates/sim.html", fixtures::SIM_TEMPLATE);
        project.write("strings.json", fixtures::STRINGS);
        project.write("build/energy-forms.min.js", fixtures::MAIN_JS);
        project.write("lib/vendor.js", fixtures::PRELOAD_JS);
        project
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Write a file, creating parent directories
    pub fn write(&self, relative: &str, content: &str) {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(path, content).expect("write test file");
    }

    /// Add an annotated resource under `images/` with a compatible license
    pub fn add_compatible_resource(&self, filename: &str) {
        self.write(&format!("images/{}", filename), "binary-ish");
        self.write("images/license.json", &fixtures::compatible_manifest(filename));
    }

    /// Add an annotated resource whose classification is problematic
    pub fn add_problematic_resource(&self, filename: &str) {
        self.write(&format!("images/{}", filename), "binary-ish");
        self.write(
            "images/license.json",
            &fixtures::problematic_manifest(filename),
        );
    }
}
