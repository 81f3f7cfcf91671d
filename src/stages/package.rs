//! Package stage: install the build into the package prefix and produce
//! the artifact manifest.
//!
//! The build tree was configured with the package directory as its install
//! prefix (see [`crate::stages::build`]), so a plain `meson install` places
//! `lib/` and `include/` directly under the package directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::errors::BuildToolError;
use crate::manifest::ArtifactManifest;
use crate::platform::BuildEnv;
use crate::recipe::options::ResolvedOptions;
use crate::recipe::Recipe;
use crate::stages::build::BuildOutput;
use crate::util::fs::ensure_dir;
use crate::util::process::ProcessBuilder;

/// Install the build into `package_dir` and assemble the manifest.
pub fn package(
    recipe: &Recipe,
    options: &ResolvedOptions,
    env: &BuildEnv,
    output: &BuildOutput,
    package_dir: &Path,
) -> Result<ArtifactManifest> {
    ensure_dir(package_dir)?;

    copy_license(recipe, &output.source_dir, package_dir)?;

    let install = install_command(&output.build_dir);
    tracing::debug!("running: {}", install.display_command());
    let status = install.status()?;
    if !status.success() {
        return Err(BuildToolError {
            command: install.display_command(),
            code: status.code(),
        }
        .into());
    }

    if env.is_msvc() {
        // Meson 1.16-era builds emit MSVC static archives with Unix naming.
        fix_static_lib_names(&package_dir.join("lib"))?;
        fix_static_lib_names(&package_dir.join(recipe.plugin_dir()))?;
    }

    let installed = count_installed_files(package_dir);
    tracing::info!(
        "packaged {} files into {}",
        installed,
        package_dir.display()
    );

    Ok(ArtifactManifest::assemble(recipe, options, env, package_dir))
}

/// Build the `meson install` invocation.
///
/// No `--destdir`: that would be prepended to the configured prefix and
/// shift the whole tree under `<pkg>/usr/local`. The prefix already points
/// at the package directory.
fn install_command(build_dir: &Path) -> ProcessBuilder {
    ProcessBuilder::new("meson")
        .args(["install", "-C"])
        .arg(build_dir)
}

/// Copy the source tree's license file into `licenses/`.
fn copy_license(recipe: &Recipe, source_dir: &Path, package_dir: &Path) -> Result<()> {
    let src = source_dir.join(&recipe.package.license_file);
    if !src.exists() {
        tracing::warn!("license file not found: {}", src.display());
        return Ok(());
    }

    let dest_dir = package_dir.join("licenses");
    ensure_dir(&dest_dir)?;
    let dest = dest_dir.join(&recipe.package.license_file);
    std::fs::copy(&src, &dest)
        .with_context(|| format!("failed to copy license to {}", dest.display()))?;
    Ok(())
}

/// Rename `libfoo.a` to `foo.lib` in one directory.
///
/// MSVC's librarian and linker expect `.lib`; consumers link by bare name.
fn fix_static_lib_names(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }

    let pattern = dir.join("lib*.a");
    for entry in glob::glob(&pattern.to_string_lossy())
        .with_context(|| format!("invalid glob: {}", pattern.display()))?
    {
        let old = entry?;
        let stem = match old
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix("lib"))
            .and_then(|n| n.strip_suffix(".a"))
        {
            Some(stem) => stem.to_string(),
            None => continue,
        };
        let new = dir.join(format!("{}.lib", stem));

        tracing::info!(
            "renaming {} to {}",
            old.display(),
            new.file_name().unwrap_or_default().to_string_lossy()
        );
        std::fs::rename(&old, &new).with_context(|| {
            format!("failed to rename {} to {}", old.display(), new.display())
        })?;
    }

    Ok(())
}

fn count_installed_files(package_dir: &Path) -> usize {
    walkdir::WalkDir::new(package_dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_install_command_has_no_destdir() {
        let display = install_command(Path::new("/work/build")).display_command();
        assert_eq!(display, "meson install -C /work/build");
    }

    #[test]
    fn test_fix_static_lib_names() {
        let tmp = TempDir::new().unwrap();
        let lib_dir = tmp.path().join("lib");
        std::fs::create_dir_all(&lib_dir).unwrap();
        std::fs::write(lib_dir.join("libgstvolume.a"), "ar").unwrap();
        std::fs::write(lib_dir.join("libgstapp.a"), "ar").unwrap();
        // Already-correct names are left alone
        std::fs::write(lib_dir.join("gstvideo-1.0.lib"), "ar").unwrap();

        fix_static_lib_names(&lib_dir).unwrap();

        assert!(lib_dir.join("gstvolume.lib").exists());
        assert!(lib_dir.join("gstapp.lib").exists());
        assert!(lib_dir.join("gstvideo-1.0.lib").exists());
        assert!(!lib_dir.join("libgstvolume.a").exists());
    }

    #[test]
    fn test_fix_static_lib_names_missing_dir() {
        fix_static_lib_names(Path::new("/nonexistent/lib")).unwrap();
    }

    #[test]
    fn test_copy_license() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("src");
        let pkg = tmp.path().join("pkg");
        std::fs::create_dir_all(&source).unwrap();
        std::fs::write(source.join("LICENSE"), "GPL-2.0-only").unwrap();

        let recipe = Recipe::gst_plugins_good();
        copy_license(&recipe, &source, &pkg).unwrap();

        assert_eq!(
            std::fs::read_to_string(pkg.join("licenses/LICENSE")).unwrap(),
            "GPL-2.0-only"
        );
    }

    #[test]
    fn test_count_installed_files() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("lib")).unwrap();
        std::fs::write(tmp.path().join("lib/a.a"), "x").unwrap();
        std::fs::write(tmp.path().join("lib/b.a"), "x").unwrap();

        assert_eq!(count_installed_files(tmp.path()), 2);
    }
}
