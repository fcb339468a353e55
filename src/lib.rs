//! Simpack - simulation artifact packager
//!
//! Simpack assembles a distributable, self-contained artifact for a
//! simulation from separately-produced pieces: compiled script code,
//! per-locale translated strings, image mipmap levels, repository version
//! metadata, and third-party licensing annotations. Builds are gated on a
//! license-compliance report covering every embedded resource.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod license;
pub mod mipmap;
pub mod pipeline;
pub mod strings;
pub mod template;
pub mod vcs;
pub mod writer;

// Re-exports for convenience
pub use config::{Brand, Config, ConfigWarning};
pub use descriptor::PackageDescriptor;
pub use error::{SimpackError, SimpackResult};
pub use license::{
    Classification, GateDecision, LicenseClassification, LicenseEntry, LicensePolicy,
    LicenseReport,
};
pub use mipmap::{aggregate_mipmaps, DataUriGenerator, MipLevel, MipmapGenerator, MipmapRequest};
pub use pipeline::{BuildOutcome, PackagePipeline, WrittenFile};
pub use strings::StringMap;
pub use template::{find_placeholders, replace_first, TemplateAssembler};
pub use vcs::{resolve_dependencies, DependencyManifest, DependencyRecord, GitCli, VcsQuery};
