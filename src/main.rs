//! Simpack CLI - simulation artifact packager
//!
//! Usage: simpack <COMMAND>
//!
//! Commands:
//!   package   Run the full packaging pipeline and commit artifacts
//!   deps      Resolve dependency version-control metadata only
//!   report    Classify resource licenses and print the compliance report
//!   validate  Validate the descriptor and string document without building

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use simpack::license::{classify_tree, GateDecision, LicenseReport};
use simpack::{
    Config, ConfigWarning, DataUriGenerator, GitCli, PackageDescriptor, PackagePipeline,
    StringMap,
};

/// Simpack - simulation artifact packager
#[derive(Parser, Debug)]
#[command(name = "simpack")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Machine-readable JSON output
    #[arg(long, global = true)]
    json: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full packaging pipeline and commit artifacts
    Package {
        /// Project root containing the descriptor and resources
        #[arg(short, long, default_value = ".")]
        root: PathBuf,

        /// Package descriptor, relative to the project root
        #[arg(short, long, default_value = "package.json")]
        descriptor: PathBuf,

        /// Root containing sibling dependency checkouts (default: parent of project root)
        #[arg(long)]
        siblings: Option<PathBuf>,

        /// Locales to build, overriding the config (comma separated)
        #[arg(long, value_delimiter = ',')]
        locales: Vec<String>,

        /// Build one artifact embedding all available locales
        #[arg(long)]
        all_locales: bool,
    },

    /// Resolve dependency version-control metadata only
    Deps {
        #[arg(short, long, default_value = ".")]
        root: PathBuf,

        #[arg(short, long, default_value = "package.json")]
        descriptor: PathBuf,

        #[arg(long)]
        siblings: Option<PathBuf>,
    },

    /// Classify resource licenses and print the compliance report
    Report {
        #[arg(short, long, default_value = ".")]
        root: PathBuf,

        #[arg(short, long, default_value = "package.json")]
        descriptor: PathBuf,
    },

    /// Validate the descriptor and string document without building
    Validate {
        #[arg(short, long, default_value = ".")]
        root: PathBuf,

        #[arg(short, long, default_value = "package.json")]
        descriptor: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Package {
            ref root,
            ref descriptor,
            ref siblings,
            ref locales,
            all_locales,
        } => cmd_package(
            root,
            descriptor,
            siblings.as_deref(),
            locales,
            all_locales,
            cli.json,
            cli.verbose,
        ),
        Commands::Deps {
            ref root,
            ref descriptor,
            ref siblings,
        } => cmd_deps(root, descriptor, siblings.as_deref(), cli.json),
        Commands::Report {
            ref root,
            ref descriptor,
        } => cmd_report(root, descriptor, cli.json),
        Commands::Validate {
            ref root,
            ref descriptor,
        } => cmd_validate(root, descriptor, cli.json),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({ "status": "error", "message": err.to_string() })
                );
            } else {
                eprintln!("✗ {:#}", err);
            }
            ExitCode::FAILURE
        }
    }
}

fn load_inputs(
    root: &Path,
    descriptor_path: &Path,
) -> Result<(PackageDescriptor, Config, Vec<ConfigWarning>)> {
    let descriptor = PackageDescriptor::load(&root.join(descriptor_path))?;
    let (config, warnings) = Config::load_or_default(root)?;
    Ok((descriptor, config, warnings))
}

fn print_config_warnings(warnings: &[ConfigWarning], json: bool) {
    if json {
        return;
    }
    for warning in warnings {
        eprintln!(
            "⚠ Unknown config key '{}' in {}",
            warning.key,
            warning.file.display()
        );
    }
}

fn siblings_root(root: &Path, siblings: Option<&Path>) -> PathBuf {
    match siblings {
        Some(path) => path.to_path_buf(),
        None => root.parent().unwrap_or(root).to_path_buf(),
    }
}

fn cmd_package(
    root: &Path,
    descriptor_path: &Path,
    siblings: Option<&Path>,
    locales: &[String],
    all_locales: bool,
    json: bool,
    verbose: u8,
) -> Result<ExitCode> {
    let (descriptor, mut config, warnings) = load_inputs(root, descriptor_path)?;
    print_config_warnings(&warnings, json);

    if !locales.is_empty() {
        config.build.locales = locales.to_vec();
    }
    if all_locales {
        config.build.all_locales = true;
    }

    if !json {
        println!("📦 Packaging {} {}", descriptor.name, descriptor.version);
    }

    let vcs = GitCli::new(siblings_root(root, siblings));
    let generator = DataUriGenerator::new(root);
    let pipeline = PackagePipeline::new(&descriptor, &config, root);

    let outcome = pipeline.run(&vcs, &generator)?;

    if json {
        let gate = match &outcome.gate {
            GateDecision::Pass => serde_json::json!({ "pass": true }),
            GateDecision::Fail(problems) => {
                serde_json::json!({ "pass": false, "problematic": problems })
            }
        };
        println!(
            "{}",
            serde_json::json!({
                "status": if outcome.committed { "ok" } else { "blocked" },
                "gate": gate,
                "enforced": outcome.enforced,
                "locales": outcome.locales,
                "dependencies": outcome.dependencies.len(),
                "mipmaps": outcome.mipmaps.len(),
                "resources": outcome.report.len(),
                "written": outcome.written.iter().map(|w| {
                    serde_json::json!({ "path": w.path.display().to_string(), "hash": w.hash })
                }).collect::<Vec<_>>(),
            })
        );
    } else {
        println!("  Dependencies resolved: {}", outcome.dependencies.len());
        println!("  Mipmaps generated:     {}", outcome.mipmaps.len());
        println!("  Resources classified:  {}", outcome.report.len());

        match &outcome.gate {
            GateDecision::Pass => println!("  License gate:          pass"),
            GateDecision::Fail(problems) => {
                println!("  License gate:          FAIL");
                for name in problems {
                    println!("    ✗ {}", name);
                }
                if !outcome.enforced {
                    eprintln!("⚠ License enforcement disabled; shipping anyway.");
                }
            }
        }

        for file in &outcome.written {
            if verbose > 0 {
                println!("  wrote {} ({})", file.path.display(), file.hash);
            } else {
                println!("  wrote {}", file.path.display());
            }
        }
    }

    if outcome.committed {
        Ok(ExitCode::SUCCESS)
    } else {
        if !json {
            eprintln!("✗ Build blocked by license compliance; nothing committed.");
        }
        Ok(ExitCode::FAILURE)
    }
}

fn cmd_deps(
    root: &Path,
    descriptor_path: &Path,
    siblings: Option<&Path>,
    json: bool,
) -> Result<ExitCode> {
    let (descriptor, _config, warnings) = load_inputs(root, descriptor_path)?;
    print_config_warnings(&warnings, json);

    let siblings = siblings_root(root, siblings);
    if !json {
        for name in &descriptor.dependencies {
            if !simpack::vcs::has_git_metadata(&siblings, name) {
                eprintln!("⚠ No git checkout found for '{}' under {}", name, siblings.display());
            }
        }
    }

    let vcs = GitCli::new(siblings);
    let manifest = simpack::resolve_dependencies(&descriptor, &vcs)?;

    if json {
        println!("{}", manifest.to_json_pretty()?);
    } else {
        println!("{}", manifest.comment);
        for (name, record) in manifest.iter() {
            println!("  {:<24} {} {}", name, record.branch, record.revision);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_report(root: &Path, descriptor_path: &Path, json: bool) -> Result<ExitCode> {
    let (descriptor, config, warnings) = load_inputs(root, descriptor_path)?;
    print_config_warnings(&warnings, json);

    let policy = config.license.policy();
    let mut report = LicenseReport::new();

    for resource_root in &descriptor.resource_roots {
        let dir = root.join(resource_root);
        if dir.is_dir() {
            classify_tree(&policy, &mut report, root, &dir)?;
        }
    }

    let gate = report.gate();
    if json {
        println!("{}", report.to_json_pretty()?);
    } else {
        for (name, classification) in report.iter() {
            let marker = if classification.problematic { "✗" } else { "✓" };
            println!(
                "  {} {:<40} {:?}",
                marker, name, classification.classification
            );
        }
        match &gate {
            GateDecision::Pass => println!("License gate: pass"),
            GateDecision::Fail(problems) => {
                println!("License gate: FAIL ({} problematic)", problems.len())
            }
        }
    }

    Ok(if gate.is_pass() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_validate(root: &Path, descriptor_path: &Path, json: bool) -> Result<ExitCode> {
    let descriptor = PackageDescriptor::load(&root.join(descriptor_path))?;
    let strings = StringMap::load(&root.join(&descriptor.strings))?;
    let locales: Vec<&str> = strings.locales().collect();

    if json {
        println!(
            "{}",
            serde_json::json!({
                "status": "ok",
                "name": descriptor.name,
                "version": descriptor.version,
                "dependencies": descriptor.dependencies.len(),
                "mipmaps": descriptor.mipmaps.len(),
                "locales": locales,
            })
        );
    } else {
        println!("✓ {} {} is valid", descriptor.name, descriptor.version);
        println!("  dependencies: {}", descriptor.dependencies.len());
        println!("  mipmaps:      {}", descriptor.mipmaps.len());
        println!("  locales:      {}", locales.join(", "));
    }
    Ok(ExitCode::SUCCESS)
}
