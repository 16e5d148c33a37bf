/// Local snapshot store
///
/// One JSON file per workflow definition, laid out by the stable business-key
/// convention: `<tag>/<sanitized-name>.json` when the name carries a `[TAG]`
/// prefix, `<sanitized-name>.json` otherwise, with deterministic ` (N)`
/// suffixes on name collisions. The live directory is only ever replaced
/// through an atomic three-step swap, bounding the crash window to a single
/// filesystem rename.

use crate::workflow::names::{sanitize_file_name, split_tag_prefix};
use crate::workflow::normalize;
use crate::workflow::types::WorkflowDefinition;
use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Build a sibling path with the given suffix appended to the final component
pub fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{}{}", name, suffix))
}

/// Write a single definition in the snapshot format
///
/// UTF-8, 2-space indented, trailing newline.
pub fn write_definition(path: &Path, definition: &WorkflowDefinition) -> Result<()> {
    let mut rendered = serde_json::to_string_pretty(definition)
        .map_err(|e| anyhow::anyhow!("Failed to serialize workflow '{}': {}", definition.name, e))?;
    rendered.push('\n');
    fs::write(path, rendered)
        .map_err(|e| anyhow::anyhow!("Failed to write '{}': {}", path.display(), e))?;
    Ok(())
}

/// Read a single definition file
pub fn read_definition(path: &Path) -> Result<WorkflowDefinition> {
    let raw = fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read '{}': {}", path.display(), e))?;
    let definition = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("Failed to parse '{}': {}", path.display(), e))?;
    Ok(definition)
}

/// Read every definition under the snapshot directory
///
/// Returns entries sorted by path - the file-enumeration order every
/// orchestrator iterates in, so reruns behave identically.
pub fn read_tree(dir: &Path) -> Result<Vec<(PathBuf, WorkflowDefinition)>> {
    if !dir.is_dir() {
        return Err(anyhow::anyhow!(
            "Snapshot directory '{}' does not exist",
            dir.display()
        ));
    }

    let mut files = Vec::new();
    collect_json_files(dir, &mut files)?;
    files.sort();

    let mut entries = Vec::with_capacity(files.len());
    for path in files {
        let definition = read_definition(&path)?;
        entries.push((path, definition));
    }
    Ok(entries)
}

fn collect_json_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let listing = fs::read_dir(dir)
        .map_err(|e| anyhow::anyhow!("Failed to list '{}': {}", dir.display(), e))?;
    for entry in listing {
        let path = entry
            .map_err(|e| anyhow::anyhow!("Failed to list '{}': {}", dir.display(), e))?
            .path();
        if path.is_dir() {
            collect_json_files(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "json") {
            out.push(path);
        }
    }
    Ok(())
}

/// Write definitions into a directory keyed by their remote id
///
/// The first backup phase: id-keyed filenames cannot collide mid-write even
/// when the remote inventory holds duplicate names. Definitions without an id
/// are skipped with a warning - the service always assigns one.
pub fn write_raw_by_id(dir: &Path, definitions: &[WorkflowDefinition]) -> Result<usize> {
    fs::create_dir_all(dir)
        .map_err(|e| anyhow::anyhow!("Failed to create '{}': {}", dir.display(), e))?;

    let mut written = 0;
    for definition in definitions {
        let Some(id) = definition.id.as_deref() else {
            tracing::warn!(
                "Skipping workflow '{}': the service returned it without an id",
                definition.name
            );
            continue;
        };
        write_definition(&dir.join(format!("{}.json", sanitize_file_name(id))), definition)?;
        written += 1;
    }
    Ok(written)
}

/// Relative target path for each entry under the business-key layout
///
/// Collisions within the same tag get ` (N)` suffixes assigned in stable sort
/// order (sanitized name, then id), so reruns produce the same assignment.
fn planned_layout(entries: &[(PathBuf, WorkflowDefinition)]) -> Vec<PathBuf> {
    let mut order: Vec<usize> = (0..entries.len()).collect();
    let keys: Vec<(Option<String>, String, String)> = entries
        .iter()
        .map(|(_, definition)| {
            let (tag, rest) = split_tag_prefix(&definition.name);
            let base = sanitize_file_name(&rest);
            let id = definition.id.clone().unwrap_or_default();
            (tag, base, id)
        })
        .collect();
    order.sort_by(|&a, &b| (&keys[a].1, &keys[a].2).cmp(&(&keys[b].1, &keys[b].2)));

    let mut seen: std::collections::HashMap<(Option<String>, String), usize> =
        std::collections::HashMap::new();
    let mut targets = vec![PathBuf::new(); entries.len()];
    for index in order {
        let (tag, base, _) = &keys[index];
        let occurrence = seen.entry((tag.clone(), base.clone())).or_insert(0);
        *occurrence += 1;
        let file_name = if *occurrence == 1 {
            format!("{}.json", base)
        } else {
            format!("{} ({}).json", base, occurrence)
        };
        targets[index] = match tag {
            Some(tag) => PathBuf::from(sanitize_file_name(tag)).join(file_name),
            None => PathBuf::from(file_name),
        };
    }
    targets
}

/// Re-lay-out every file under the directory by the business-key convention
///
/// Returns the number of files that moved. Files already in place are left
/// untouched; emptied tag directories are pruned.
pub fn organize_tree(dir: &Path) -> Result<usize> {
    let entries = read_tree(dir)?;
    let targets = planned_layout(&entries);

    let mut pending = Vec::new();
    for ((path, definition), relative) in entries.into_iter().zip(targets) {
        let target = dir.join(relative);
        if path == target {
            continue;
        }
        fs::remove_file(&path)
            .map_err(|e| anyhow::anyhow!("Failed to remove '{}': {}", path.display(), e))?;
        pending.push((definition, target));
    }

    let moved = pending.len();
    for (definition, target) in pending {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| anyhow::anyhow!("Failed to create '{}': {}", parent.display(), e))?;
        }
        write_definition(&target, &definition)?;
    }

    prune_empty_dirs(dir)?;
    Ok(moved)
}

fn prune_empty_dirs(dir: &Path) -> Result<()> {
    let listing = fs::read_dir(dir)
        .map_err(|e| anyhow::anyhow!("Failed to list '{}': {}", dir.display(), e))?;
    for entry in listing {
        let path = entry
            .map_err(|e| anyhow::anyhow!("Failed to list '{}': {}", dir.display(), e))?
            .path();
        if path.is_dir() {
            prune_empty_dirs(&path)?;
            if fs::read_dir(&path).map(|mut d| d.next().is_none()).unwrap_or(false) {
                let _ = fs::remove_dir(&path);
            }
        }
    }
    Ok(())
}

/// Strip a ` (N)` collision suffix off a file stem
fn strip_copy_suffix(stem: &str) -> Option<&str> {
    let open = stem.rfind(" (")?;
    let digits = stem[open + 2..].strip_suffix(')')?;
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        Some(&stem[..open])
    } else {
        None
    }
}

/// Remove suffixed duplicates whose content matches the base file
///
/// Cleans up leftovers from a prior interrupted run and collapses remote
/// duplicates that are byte-for-byte the same workflow under the normalized
/// comparison. Returns the number of files removed.
pub fn remove_duplicate_suffixes(dir: &Path) -> Result<usize> {
    let mut files = Vec::new();
    collect_json_files(dir, &mut files)?;
    files.sort();

    let mut removed = 0;
    for path in files {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let Some(base_stem) = strip_copy_suffix(stem) else {
            continue;
        };
        let base_path = path.with_file_name(format!("{}.json", base_stem));
        if !base_path.is_file() {
            continue;
        }

        let duplicate = read_definition(&path)?;
        let original = read_definition(&base_path)?;
        if normalize::equal(&duplicate, &original) {
            tracing::debug!("Removing duplicate snapshot file '{}'", path.display());
            fs::remove_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to remove '{}': {}", path.display(), e))?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Atomically replace the live snapshot directory with the temp one
///
/// live -> `.old`, temp -> live, delete `.old`. If the final swap fails the
/// previous live directory is restored before the error propagates, so the
/// live snapshot is never left missing.
pub fn swap_into_place(live: &Path, temp: &Path) -> Result<()> {
    let old = sibling_with_suffix(live, ".old");
    if old.exists() {
        fs::remove_dir_all(&old)
            .map_err(|e| anyhow::anyhow!("Failed to clear '{}': {}", old.display(), e))?;
    }

    let had_live = live.exists();
    if had_live {
        fs::rename(live, &old)
            .map_err(|e| anyhow::anyhow!("Failed to stage '{}': {}", live.display(), e))?;
    }

    if let Err(e) = fs::rename(temp, live) {
        if had_live {
            let _ = fs::rename(&old, live);
        }
        return Err(anyhow::anyhow!(
            "Failed to swap '{}' into place: {}",
            temp.display(),
            e
        ));
    }

    if had_live {
        if let Err(e) = fs::remove_dir_all(&old) {
            tracing::warn!("Could not remove '{}': {}", old.display(), e);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_suffixes_are_recognized() {
        assert_eq!(strip_copy_suffix("Send invoice (2)"), Some("Send invoice"));
        assert_eq!(strip_copy_suffix("Send invoice (12)"), Some("Send invoice"));
        assert_eq!(strip_copy_suffix("Send invoice"), None);
        assert_eq!(strip_copy_suffix("Send invoice ()"), None);
        assert_eq!(strip_copy_suffix("Send invoice (x)"), None);
    }
}
