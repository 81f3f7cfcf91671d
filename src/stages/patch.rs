//! Patch stage: apply local unified diffs to the extracted source tree.
//!
//! Patches apply in strictly increasing lexicographic filename order. The
//! first patch that fails to apply aborts the invocation; patches already
//! applied stay applied (the caller re-fetches from scratch on re-run, so
//! there is nothing to roll back).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use diffy::Patch;

use crate::errors::PatchConflictError;

/// Apply every `*.patch` file in `patch_dir` to `source_dir`.
///
/// A missing or empty patch directory is not an error; the recipe simply
/// carries no local fixes.
pub fn apply_patches(source_dir: &Path, patch_dir: &Path) -> Result<()> {
    for patch_file in list_patches(patch_dir)? {
        let name = patch_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| patch_file.display().to_string());

        tracing::info!("applying patch {}", name);
        apply_patch_file(&patch_file, source_dir)
            .map_err(|detail| PatchConflictError {
                patch: name,
                detail: format!("{:#}", detail),
            })?;
    }
    Ok(())
}

/// List patch files in lexicographic filename order.
pub fn list_patches(patch_dir: &Path) -> Result<Vec<PathBuf>> {
    if !patch_dir.is_dir() {
        return Ok(Vec::new());
    }

    let pattern = patch_dir.join("*.patch");
    let mut patches: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
        .with_context(|| format!("invalid patch glob: {}", pattern.display()))?
        .filter_map(|entry| entry.ok())
        .collect();

    patches.sort();
    Ok(patches)
}

/// Apply one patch file, which may touch several files in the tree.
fn apply_patch_file(patch_file: &Path, source_dir: &Path) -> Result<()> {
    let text = std::fs::read_to_string(patch_file)
        .with_context(|| format!("failed to read patch: {}", patch_file.display()))?;

    let segments = split_file_segments(&text);
    if segments.is_empty() {
        anyhow::bail!("no file diffs found in patch");
    }

    for segment in segments {
        let patch = Patch::from_str(&segment)
            .map_err(|e| anyhow::anyhow!("malformed diff: {}", e))?;

        let target = target_path(&patch)
            .ok_or_else(|| anyhow::anyhow!("diff has no usable target path"))?;
        let target_abs = source_dir.join(&target);

        let original = if target_abs.exists() {
            std::fs::read_to_string(&target_abs)
                .with_context(|| format!("failed to read {}", target_abs.display()))?
        } else {
            String::new()
        };

        let patched = diffy::apply(&original, &patch)
            .map_err(|e| anyhow::anyhow!("hunk failed for {}: {}", target.display(), e))?;

        if let Some(parent) = target_abs.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        std::fs::write(&target_abs, patched)
            .with_context(|| format!("failed to write {}", target_abs.display()))?;
    }

    Ok(())
}

/// Split a possibly multi-file unified diff into one segment per file.
///
/// A new segment starts at a `--- ` line immediately followed by a `+++ `
/// line, outside any hunk; anything before the first segment (e.g.
/// `diff --git` headers or a commit message) is dropped. Hunk body lines
/// are tracked from the `@@` header counts, so removed or added content
/// that itself looks like a `---`/`+++` header pair is never taken for a
/// file boundary.
fn split_file_segments(text: &str) -> Vec<String> {
    let lines: Vec<&str> = text.lines().collect();
    let mut starts = Vec::new();
    let mut old_left = 0usize;
    let mut new_left = 0usize;

    for (i, line) in lines.iter().enumerate() {
        if old_left > 0 || new_left > 0 {
            match line.as_bytes().first() {
                Some(b' ') => {
                    old_left = old_left.saturating_sub(1);
                    new_left = new_left.saturating_sub(1);
                }
                Some(b'-') => old_left = old_left.saturating_sub(1),
                Some(b'+') => new_left = new_left.saturating_sub(1),
                // "\ No newline at end of file"
                Some(b'\\') => {}
                // Some generators emit empty context lines with no prefix
                None => {
                    old_left = old_left.saturating_sub(1);
                    new_left = new_left.saturating_sub(1);
                }
                _ => {
                    old_left = 0;
                    new_left = 0;
                }
            }
            continue;
        }

        if let Some((old, new)) = parse_hunk_header(line) {
            old_left = old;
            new_left = new;
            continue;
        }

        if line.starts_with("--- ")
            && lines.get(i + 1).map_or(false, |l| l.starts_with("+++ "))
        {
            starts.push(i);
        }
    }

    let mut segments = Vec::new();
    for (idx, &start) in starts.iter().enumerate() {
        let end = if idx + 1 < starts.len() {
            // Back off over any diff/index header lines of the next segment
            let mut end = starts[idx + 1];
            while end > start + 2 && !lines[end - 1].starts_with(['@', '+', '-', ' ', '\\']) {
                end -= 1;
            }
            end
        } else {
            lines.len()
        };

        let mut segment = lines[start..end].join("\n");
        segment.push('\n');
        segments.push(segment);
    }

    segments
}

/// Parse `@@ -start[,count] +start[,count] @@`, returning the old and new
/// body line counts.
fn parse_hunk_header(line: &str) -> Option<(usize, usize)> {
    let ranges = line.strip_prefix("@@ -")?.split(" @@").next()?;
    let (old, new) = ranges.split_once(" +")?;
    Some((range_count(old)?, range_count(new)?))
}

fn range_count(range: &str) -> Option<usize> {
    match range.split_once(',') {
        Some((_, count)) => count.parse().ok(),
        // A single number means one line
        None => range.parse::<usize>().ok().map(|_| 1),
    }
}

/// Resolve the tree-relative path a parsed diff applies to.
///
/// Prefers the `+++` (modified) side, falling back to the `---` side for
/// deletions; `a/` and `b/` prefixes are stripped.
fn target_path(patch: &Patch<'_, str>) -> Option<PathBuf> {
    let pick = |name: Option<&str>| -> Option<PathBuf> {
        let name = name?;
        if name == "/dev/null" {
            return None;
        }
        let stripped = name
            .strip_prefix("b/")
            .or_else(|| name.strip_prefix("a/"))
            .unwrap_or(name);
        Some(PathBuf::from(stripped))
    };

    pick(patch.modified()).or_else(|| pick(patch.original()))
}
