//! Inspect command - show the claim schema and patch sets of one resource

use std::path::{Path, PathBuf};

use console::style;
use serde::Serialize;
use xgen_core::{Patch, SchemaProperty};
use xgen_engine::Generator;

use super::{RESOURCE_CONFIG_FILE, input_root, load_global, load_resource};
use crate::error::{CliError, Result};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClaimReport<'a> {
    spec: &'a SchemaProperty,
    status: &'a SchemaProperty,
    patch_sets: PatchSets<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct PatchSets<'a> {
    parameters: &'a [Patch],
    status: &'a [Patch],
}

pub fn run(file: &Path, config: Option<&Path>) -> Result<()> {
    let path = resource_file(file);
    let global = load_global(config, input_root(&path))?;
    let resource = load_resource(&path)?;

    let claim = Generator::new(&resource.config, &global, &resource.crd)
        .claim()
        .map_err(|e| CliError::generate(&path, e))?;

    eprintln!(
        "{} {} ({} parameter patch(es), {} status patch(es))",
        style("Claim").cyan().bold(),
        resource.config.name,
        claim.parameters.len(),
        claim.status_patches.len()
    );

    let report = ClaimReport {
        spec: &claim.spec,
        status: &claim.status,
        patch_sets: PatchSets {
            parameters: &claim.parameters,
            status: &claim.status_patches,
        },
    };
    print!("{}", serde_yaml::to_string(&report)?);

    Ok(())
}

/// Accept either a `generate.yaml` or the directory holding one
fn resource_file(file: &Path) -> PathBuf {
    if file.is_dir() {
        file.join(RESOURCE_CONFIG_FILE)
    } else {
        file.to_path_buf()
    }
}
