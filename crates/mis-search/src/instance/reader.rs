use indexmap::IndexMap;
use log::debug;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::schema::InstanceFile;
use super::Instance;
use crate::error::{Result, SearchError};
use crate::model::{Container, Dimensions};

/// Name of the instance stored at `path`: its file stem.
pub fn instance_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "instance".to_string())
}

/// Load and parse a prepared instance file.
pub fn load_instance(path: &Path) -> Result<Instance> {
    let content = fs::read_to_string(path).map_err(|e| SearchError::malformed(path, e.to_string()))?;
    parse_instance(&instance_name(path), path, &content)
}

/// Parse instance JSON into containers and keyed items.
///
/// Items are keyed `"{part_id}-{k}"` for `k = 1..=num_part`; a repeated
/// `part_id` continues counting where the previous entry stopped.
pub fn parse_instance(name: &str, path: &Path, content: &str) -> Result<Instance> {
    let file: InstanceFile =
        serde_json::from_str(content).map_err(|e| SearchError::malformed(path, e.to_string()))?;

    let mut seen = HashSet::new();
    let mut containers = Vec::with_capacity(file.machines.len());
    for machine in &file.machines {
        let id = machine.machine_id.to_string();
        if !seen.insert(id.clone()) {
            return Err(SearchError::malformed(path, format!("duplicate machine_id {}", id)));
        }
        containers.push(Container::new(id, machine.length, machine.width));
    }

    let mut counts: IndexMap<String, u32> = IndexMap::new();
    let mut items = IndexMap::new();
    for part in &file.parts {
        let part_id = part.part_id.to_string();
        let count = counts.entry(part_id.clone()).or_insert(0);
        let start = *count;
        *count = start
            .checked_add(part.num_part)
            .ok_or_else(|| SearchError::malformed(path, format!("part {} count overflows", part_id)))?;

        // A part without orientations still consumes its keys.
        let Some(orientation) = part.orientations.first() else {
            continue;
        };
        if !(orientation.l.is_finite() && orientation.w.is_finite())
            || orientation.l <= 0.0
            || orientation.w <= 0.0
        {
            return Err(SearchError::malformed(
                path,
                format!(
                    "part {} has non-positive dimensions {} x {}",
                    part_id, orientation.l, orientation.w
                ),
            ));
        }
        for k in start + 1..=*count {
            items.insert(format!("{}-{}", part_id, k), Dimensions::new(orientation.l, orientation.w));
        }
    }

    debug!(
        "Loaded instance {}: {} containers, {} items",
        name,
        containers.len(),
        items.len()
    );

    Ok(Instance {
        name: name.to_string(),
        path: path.to_path_buf(),
        containers,
        items,
    })
}

/// Expand the given paths into instance files.
///
/// Directories contribute their direct `*.json` children, sorted by name;
/// files are taken as given.
pub fn discover_instances(paths: &[PathBuf]) -> Vec<PathBuf> {
    discover_files(paths, "json")
}

/// Expand directories into their direct children with the given extension.
pub fn discover_files(paths: &[PathBuf], extension: &str) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut children: Vec<PathBuf> = WalkDir::new(path)
                .min_depth(1)
                .max_depth(1)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|p| p.extension().is_some_and(|ext| ext == extension))
                .collect();
            children.sort();
            found.extend(children);
        } else {
            found.push(path.clone());
        }
    }
    found
}
