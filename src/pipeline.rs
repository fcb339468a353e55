//! Build pipeline orchestrator
//!
//! Drives one packaging run end to end: descriptor validation, concurrent
//! dependency resolution and mipmap aggregation, license classification over
//! every declared resource, per-locale template assembly, the compliance
//! gate, and finally the output commit.
//!
//! Nothing is written to the output directory until every locale assembled
//! cleanly and the gate passed; a fatal error in any stage leaves the output
//! directory untouched.

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::thread;

use crate::config::Config;
use crate::descriptor::PackageDescriptor;
use crate::error::{SimpackError, SimpackResult};
use crate::license::{classify_tree, GateDecision, LicenseReport};
use crate::mipmap::{aggregate_mipmaps, MipmapGenerator, MipmapManifest};
use crate::strings::StringMap;
use crate::template::{legal_header, TemplateAssembler};
use crate::vcs::{resolve_dependencies, DependencyManifest, VcsQuery};
use crate::writer::{atomic_write, hash_content};

/// Placeholder tokens understood by the assembler, in application order
pub mod tokens {
    pub const LEGAL_HEADER: &str = "LEGAL_HEADER";
    pub const PRELOAD_SCRIPTS: &str = "PRELOAD_SCRIPTS";
    pub const MAIN_SCRIPT: &str = "MAIN_SCRIPT";
    pub const MIPMAPS: &str = "MIPMAPS";
    pub const DEPENDENCIES: &str = "DEPENDENCIES";
    pub const LICENSE_REPORT: &str = "LICENSE_REPORT";
    pub const PROJECT: &str = "PROJECT";
    pub const VERSION: &str = "VERSION";
    pub const BUILD_TIMESTAMP: &str = "BUILD_TIMESTAMP";
    pub const STRINGS: &str = "STRINGS";
    pub const LOCALE: &str = "LOCALE";
    pub const TITLE: &str = "TITLE";
    pub const SIM_URL: &str = "SIM_URL";

    /// Tokens that stay unresolved in the string-template variant
    pub const LOCALE_TOKENS: &[&str] = &[STRINGS, LOCALE, TITLE];
}

/// One file committed to the output directory
#[derive(Debug, Clone)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub hash: String,
}

/// Everything a completed (or gated) run produced
#[derive(Debug)]
pub struct BuildOutcome {
    pub dependencies: DependencyManifest,
    pub mipmaps: MipmapManifest,
    pub report: LicenseReport,
    pub gate: GateDecision,
    /// False when the gate failure was overridden by config
    pub enforced: bool,
    pub locales: Vec<String>,
    /// Files committed to the output directory; empty when the gate blocked
    pub written: Vec<WrittenFile>,
    pub committed: bool,
}

/// The packaging pipeline for one build run
pub struct PackagePipeline<'a> {
    descriptor: &'a PackageDescriptor,
    config: &'a Config,
    project_root: &'a Path,
}

impl<'a> PackagePipeline<'a> {
    pub fn new(
        descriptor: &'a PackageDescriptor,
        config: &'a Config,
        project_root: &'a Path,
    ) -> Self {
        Self {
            descriptor,
            config,
            project_root,
        }
    }

    /// Run the full pipeline
    pub fn run(
        &self,
        vcs: &dyn VcsQuery,
        generator: &dyn MipmapGenerator,
    ) -> SimpackResult<BuildOutcome> {
        // configuration errors fail before any external call
        self.descriptor.check_duplicate_dependencies()?;

        let strings = StringMap::load(&self.project_root.join(&self.descriptor.strings))?;
        let fallback = &self.config.build.fallback_locale;
        if !strings.has_locale(fallback) {
            return Err(SimpackError::MissingLocale {
                locale: fallback.clone(),
            });
        }

        // the resolver and the aggregator are independent of each other;
        // both must finish before assembly starts
        let (dependencies, mipmaps) = thread::scope(|scope| {
            let mipmap_requests = &self.descriptor.mipmaps;
            let mips = scope.spawn(move || aggregate_mipmaps(mipmap_requests, generator));

            let deps = resolve_dependencies(self.descriptor, vcs);
            let mips = mips.join().unwrap_or_else(|_| {
                Err(SimpackError::MipmapFailed {
                    asset: "(aggregator)".to_string(),
                    message: "aggregator thread panicked".to_string(),
                })
            });
            (deps, mips)
        });
        let dependencies = dependencies?;
        let mipmaps = mipmaps?;

        let report = self.classify_resources()?;

        let locales = self.config.locales_to_build();
        let artifacts = self.assemble_artifacts(
            &dependencies,
            &mipmaps,
            &report,
            &strings,
            &locales,
        )?;

        let gate = report.gate();
        let enforced = self.config.license.enforce;
        if !gate.is_pass() && enforced {
            return Ok(BuildOutcome {
                dependencies,
                mipmaps,
                report,
                gate,
                enforced,
                locales,
                written: Vec::new(),
                committed: false,
            });
        }

        let written = self.commit(&artifacts, &dependencies, &report, &strings)?;

        Ok(BuildOutcome {
            dependencies,
            mipmaps,
            report,
            gate,
            enforced,
            locales,
            written,
            committed: true,
        })
    }

    /// Classify every file under the declared resource roots
    fn classify_resources(&self) -> SimpackResult<LicenseReport> {
        let policy = self.config.license.policy();
        let mut report = LicenseReport::new();

        for root in &self.descriptor.resource_roots {
            let root_path = self.project_root.join(root);
            // a declared root with no resources yet is not an error
            if !root_path.is_dir() {
                continue;
            }
            classify_tree(&policy, &mut report, self.project_root, &root_path)?;
        }
        Ok(report)
    }

    /// Build every locale artifact (and the string-template variant) in memory
    fn assemble_artifacts(
        &self,
        dependencies: &DependencyManifest,
        mipmaps: &MipmapManifest,
        report: &LicenseReport,
        strings: &StringMap,
        locales: &[String],
    ) -> SimpackResult<Vec<(String, String)>> {
        let descriptor = self.descriptor;
        let fallback = &self.config.build.fallback_locale;
        let template = std::fs::read_to_string(self.project_root.join(&descriptor.template))?;
        let extension = descriptor
            .template
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_else(|| "html".to_string());

        // the header is not localized; it uses the fallback-locale title
        let header_title = strings.title(&descriptor.title_string_key, fallback, fallback)?;

        let mut shared = TemplateAssembler::new(template);
        shared.set(
            tokens::LEGAL_HEADER,
            legal_header(
                self.config.build.brand,
                &header_title,
                &descriptor.version,
                &descriptor.license,
            ),
        );
        shared.set(tokens::PRELOAD_SCRIPTS, self.preload_blocks()?);
        shared.set(tokens::MAIN_SCRIPT, self.main_block()?);
        shared.set(tokens::MIPMAPS, mipmaps.to_embed_json()?);
        shared.set(tokens::DEPENDENCIES, dependencies.to_json_pretty()?);
        shared.set(tokens::LICENSE_REPORT, report.to_json_pretty()?);
        shared.set(tokens::PROJECT, descriptor.name.as_str());
        shared.set(tokens::VERSION, descriptor.version.as_str());
        shared.set(tokens::BUILD_TIMESTAMP, Utc::now().to_rfc2822());

        let mut artifacts = Vec::new();

        if self.config.build.all_locales {
            let mut assembler = shared.clone();
            assembler.set(tokens::STRINGS, strings.embed_json(&[], fallback, true)?);
            assembler.set(tokens::LOCALE, fallback.clone());
            assembler.set(
                tokens::TITLE,
                strings.title(&descriptor.title_string_key, fallback, fallback)?,
            );
            artifacts.push((
                format!("{}_all.{}", descriptor.name, extension),
                assembler.assemble()?,
            ));
        } else {
            for locale in locales {
                let mut assembler = shared.clone();
                assembler.set(
                    tokens::STRINGS,
                    strings.embed_json(std::slice::from_ref(locale), fallback, false)?,
                );
                assembler.set(tokens::LOCALE, locale.clone());
                assembler.set(
                    tokens::TITLE,
                    strings.title(&descriptor.title_string_key, locale, fallback)?,
                );
                artifacts.push((
                    format!("{}_{}.{}", descriptor.name, locale, extension),
                    assembler.assemble()?,
                ));
            }

            // only useful to translation tooling when several locales were built
            if locales.len() > 1 {
                artifacts.push((
                    format!("{}_STRING_TEMPLATE.{}", descriptor.name, extension),
                    shared.assemble_keeping(tokens::LOCALE_TOKENS)?,
                ));
            }
        }

        // iframe harness page pointing at the shipped fallback-locale artifact
        if let Some(iframe_template) = &descriptor.iframe_template {
            let target = if self.config.build.all_locales {
                format!("{}_all.{}", descriptor.name, extension)
            } else {
                format!("{}_{}.{}", descriptor.name, fallback, extension)
            };
            let document =
                std::fs::read_to_string(self.project_root.join(iframe_template))?;
            let mut assembler = TemplateAssembler::new(document);
            assembler.set(
                tokens::TITLE,
                format!("{} {} iframe test", header_title, descriptor.version),
            );
            assembler.set(tokens::SIM_URL, target);
            artifacts.push((
                format!("{}_{}-iframe.{}", descriptor.name, fallback, extension),
                assembler.assemble()?,
            ));
        }

        Ok(artifacts)
    }

    fn preload_blocks(&self) -> SimpackResult<String> {
        let mut blocks = String::new();
        for path in &self.descriptor.preload {
            let source = std::fs::read_to_string(self.project_root.join(path))?;
            blocks.push_str(&format!(
                "<script id=\"preload-{}\">\n{}\n</script>\n",
                path.to_string_lossy().replace('\\', "/"),
                source
            ));
        }
        Ok(blocks)
    }

    fn main_block(&self) -> SimpackResult<String> {
        let source = std::fs::read_to_string(self.project_root.join(&self.descriptor.main))?;
        Ok(format!("<script>\n{}\n</script>", source))
    }

    /// Commit everything atomically to the output directory
    fn commit(
        &self,
        artifacts: &[(String, String)],
        dependencies: &DependencyManifest,
        report: &LicenseReport,
        strings: &StringMap,
    ) -> SimpackResult<Vec<WrittenFile>> {
        let output_dir = if self.config.build.output_dir.is_absolute() {
            self.config.build.output_dir.clone()
        } else {
            self.project_root.join(&self.config.build.output_dir)
        };

        let mut written = Vec::new();
        let mut commit_one = |path: PathBuf, content: &str| -> SimpackResult<()> {
            atomic_write(&path, content.as_bytes())?;
            written.push(WrittenFile {
                hash: hash_content(content.as_bytes()),
                path,
            });
            Ok(())
        };

        for (filename, content) in artifacts {
            commit_one(output_dir.join(filename), content)?;
        }
        commit_one(
            output_dir.join("dependencies.json"),
            &format!("{}\n", dependencies.to_json_pretty()?),
        )?;
        commit_one(
            output_dir.join("license-report.json"),
            &format!("{}\n", report.to_json_pretty()?),
        )?;
        commit_one(
            output_dir.join(format!("{}_string-map.json", self.descriptor.name)),
            &format!("{}\n", strings.to_json_pretty()?),
        )?;

        Ok(written)
    }
}
