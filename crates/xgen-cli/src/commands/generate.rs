//! Generate command - write the XRD and Compositions of every resource

use std::fs;
use std::path::{Path, PathBuf};

use console::style;
use serde_json::Value;
use tracing::info;
use walkdir::WalkDir;
use xgen_engine::Generator;

use super::{LoadedResource, RESOURCE_CONFIG_FILE, input_root, load_global, load_resource};
use crate::error::{CliError, Result};

pub fn run(input: &Path, config: Option<&Path>, output_dir: Option<&Path>) -> Result<()> {
    let root = input_root(input);
    let global = load_global(config, root)?;

    let resources = find_resources(input)?;
    if resources.is_empty() {
        return Err(CliError::config(format!(
            "No {} found under {}",
            RESOURCE_CONFIG_FILE,
            input.display()
        )));
    }

    for path in &resources {
        let resource = load_resource(path)?;
        let generated = Generator::new(&resource.config, &global, &resource.crd)
            .generate()
            .map_err(|e| CliError::generate(path, e))?;

        let target = target_dir(root, &resource, output_dir);
        fs::create_dir_all(&target)?;

        write_yaml(&target.join("definition.yaml"), &generated.definition)?;
        for composition in &generated.compositions {
            write_yaml(
                &target.join(format!("composition-{}.yaml", composition.name)),
                &composition.manifest,
            )?;
        }

        info!(resource = %path.display(), output = %target.display(), "Generated resource");
        println!(
            "{} {} {} ({} composition(s))",
            style("✓").green().bold(),
            resource.config.name,
            style(target.display()).dim(),
            generated.compositions.len()
        );
    }

    Ok(())
}

/// Every `generate.yaml` below `input`, in file name order
fn find_resources(input: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(input).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && entry.file_name() == RESOURCE_CONFIG_FILE {
            found.push(entry.into_path());
        }
    }
    Ok(found)
}

/// Output directory of a resource: next to its `generate.yaml`, or the
/// same relative location under `output_dir`
fn target_dir(root: &Path, resource: &LoadedResource, output_dir: Option<&Path>) -> PathBuf {
    let dir = resource.dir();
    match output_dir {
        Some(out) => match dir.strip_prefix(root) {
            Ok(relative) => out.join(relative),
            Err(_) => out.to_path_buf(),
        },
        None => dir.to_path_buf(),
    }
}

fn write_yaml(path: &Path, manifest: &Value) -> Result<()> {
    let rendered = serde_yaml::to_string(manifest)?;
    fs::write(path, rendered).map_err(|e| CliError::Io {
        message: format!("Failed to write {}: {}", path.display(), e),
    })
}
