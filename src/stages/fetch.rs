//! Source fetch stage: download, verify, extract.
//!
//! The archive is streamed to a staging file and its SHA-256 checked against
//! the recipe's pin; a mismatch aborts before anything is extracted, so no
//! patch or build stage ever sees unverified bytes.

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use url::Url;

use crate::errors::{IntegrityError, NetworkError};
use crate::recipe::Recipe;
use crate::util::fs::remove_dir_all_if_exists;
use crate::util::hash::sha256_file;

/// An extracted, verified source tree.
#[derive(Debug, Clone)]
pub struct SourceTree {
    pub root: PathBuf,
}

/// Download, verify, and extract the recipe's source archive into
/// `source_dir`, replacing any previous contents.
pub fn fetch_source(recipe: &Recipe, source_dir: &Path) -> Result<SourceTree> {
    let url = recipe.source_url();
    Url::parse(&url).with_context(|| format!("invalid source url: {}", url))?;

    tracing::info!("fetching {}", url);

    let staging = tempfile::NamedTempFile::new().context("failed to create staging file")?;
    download(&url, staging.path())?;

    verify_and_extract(staging.path(), recipe, source_dir)
}

/// Check the staged archive against the recipe's pin, then extract it.
///
/// A checksum mismatch aborts before extraction; the source directory is
/// left untouched.
fn verify_and_extract(
    archive: &Path,
    recipe: &Recipe,
    source_dir: &Path,
) -> Result<SourceTree> {
    let url = recipe.source_url();

    let actual = sha256_file(archive)?;
    if actual != recipe.source.sha256 {
        return Err(IntegrityError {
            url,
            expected: recipe.source.sha256.clone(),
            actual,
        }
        .into());
    }
    tracing::debug!("archive checksum verified: {}", &actual[..16]);

    // Re-running re-fetches; stale trees are never reused.
    remove_dir_all_if_exists(source_dir)?;
    extract_archive(archive, &url, source_dir, &recipe.archive_root())
        .with_context(|| format!("failed to extract {}", url))?;

    tracing::info!("extracted source to {}", source_dir.display());

    Ok(SourceTree {
        root: source_dir.to_path_buf(),
    })
}

/// Stream the archive to `dest`.
fn download(url: &str, dest: &Path) -> Result<()> {
    let mut response = reqwest::blocking::get(url).map_err(|e| NetworkError {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    if !response.status().is_success() {
        return Err(NetworkError {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        }
        .into());
    }

    let bar = match response.content_length() {
        Some(len) => {
            let bar = ProgressBar::new(len);
            bar.set_style(
                ProgressStyle::with_template("{bytes}/{total_bytes} [{bar:30}] {eta}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        }
        None => ProgressBar::new_spinner(),
    };

    let mut file = File::create(dest)
        .with_context(|| format!("failed to create staging file: {}", dest.display()))?;
    let mut buffer = [0u8; 65536];

    loop {
        let n = response.read(&mut buffer).map_err(|e| NetworkError {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if n == 0 {
            break;
        }
        file.write_all(&buffer[..n])
            .context("failed to write staging file")?;
        bar.inc(n as u64);
    }

    bar.finish_and_clear();
    file.flush()?;

    Ok(())
}

/// Extract a `.tar.xz` or `.tar.gz` archive, stripping the leading
/// `strip_prefix/` path component.
pub fn extract_archive(
    archive: &Path,
    url: &str,
    dest: &Path,
    strip_prefix: &str,
) -> Result<()> {
    let file = File::open(archive)
        .with_context(|| format!("failed to open archive: {}", archive.display()))?;
    let reader = BufReader::new(file);

    if url.ends_with(".tar.xz") || url.ends_with(".txz") {
        extract_tar(xz2::read::XzDecoder::new(reader), dest, strip_prefix)
    } else if url.ends_with(".tar.gz") || url.ends_with(".tgz") {
        extract_tar(flate2::read::GzDecoder::new(reader), dest, strip_prefix)
    } else {
        bail!("unsupported archive format: {}", url);
    }
}

fn extract_tar<R: Read>(decoder: R, dest: &Path, strip_prefix: &str) -> Result<()> {
    let mut archive = tar::Archive::new(decoder);

    std::fs::create_dir_all(dest)
        .with_context(|| format!("failed to create destination directory: {}", dest.display()))?;

    for entry in archive.entries().context("failed to read archive entries")? {
        let mut entry = entry.context("failed to read archive entry")?;
        let entry_path = entry.path().context("failed to get entry path")?;
        let entry_path = entry_path.to_string_lossy().replace('\\', "/");

        let prefix = strip_prefix.trim_end_matches('/');
        let stripped = if let Some(rest) = entry_path.strip_prefix(&format!("{}/", prefix)) {
            rest.to_string()
        } else if entry_path == prefix {
            // The prefix directory itself
            continue;
        } else {
            entry_path.clone()
        };

        if stripped.is_empty() || stripped.contains("..") {
            continue;
        }

        let output_path = dest.join(&stripped);
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }

        match entry.header().entry_type() {
            tar::EntryType::Directory => {
                std::fs::create_dir_all(&output_path).with_context(|| {
                    format!("failed to create directory: {}", output_path.display())
                })?;
            }
            tar::EntryType::Regular | tar::EntryType::Continuous | tar::EntryType::Link => {
                entry.unpack(&output_path).with_context(|| {
                    format!("failed to extract: {}", output_path.display())
                })?;
            }
            tar::EntryType::Symlink => {
                #[cfg(unix)]
                if let Ok(Some(target)) = entry.link_name() {
                    std::os::unix::fs::symlink(target.as_ref(), &output_path).with_context(
                        || format!("failed to create symlink: {}", output_path.display()),
                    )?;
                }
                #[cfg(windows)]
                tracing::debug!("skipping symlink on windows: {}", entry_path);
            }
            other => {
                tracing::debug!("skipping entry type {:?}: {}", other, entry_path);
            }
        }
    }

    Ok(())
}
