//! CLI commands

pub mod generate;
pub mod inspect;

use std::path::{Path, PathBuf};

use tracing::debug;
use xgen_core::{CrdParser, CrdSchema, GeneratorConfig, ResourceConfig};

use crate::error::{CliError, Result};

/// File name of the global configuration looked up in the input root
pub const GLOBAL_CONFIG_FILE: &str = "generator.yaml";

/// File name of a resource configuration
pub const RESOURCE_CONFIG_FILE: &str = "generate.yaml";

/// A `generate.yaml` together with the CRD it points at
pub struct LoadedResource {
    pub path: PathBuf,
    pub config: ResourceConfig,
    pub crd: CrdSchema,
}

impl LoadedResource {
    /// Directory holding the `generate.yaml`
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new("."))
    }
}

/// Global configuration: explicit file, else `<root>/generator.yaml`,
/// else defaults
pub fn load_global(explicit: Option<&Path>, root: &Path) -> Result<GeneratorConfig> {
    if let Some(path) = explicit {
        debug!(path = %path.display(), "Loading global configuration");
        return GeneratorConfig::from_file(path).map_err(|e| CliError::load(path, e));
    }

    let implicit = root.join(GLOBAL_CONFIG_FILE);
    if implicit.is_file() {
        debug!(path = %implicit.display(), "Loading global configuration");
        return GeneratorConfig::from_file(&implicit).map_err(|e| CliError::load(&implicit, e));
    }

    debug!("No global configuration, using defaults");
    Ok(GeneratorConfig::default())
}

/// Load a resource configuration and its CRD, resolved relative to the
/// configuration file
pub fn load_resource(path: &Path) -> Result<LoadedResource> {
    let config = ResourceConfig::from_file(path).map_err(|e| CliError::load(path, e))?;

    let dir = path.parent().unwrap_or(Path::new("."));
    let crd_path = dir.join(&config.provider.crd.file);
    debug!(crd = %crd_path.display(), "Loading CRD");
    let crd = CrdParser::from_file(&crd_path).map_err(|e| CliError::load(&crd_path, e))?;

    Ok(LoadedResource {
        path: path.to_path_buf(),
        config,
        crd,
    })
}

/// Directory a command treats as the root of its input
pub fn input_root(input: &Path) -> &Path {
    if input.is_file() {
        input.parent().unwrap_or(Path::new("."))
    } else {
        input
    }
}
