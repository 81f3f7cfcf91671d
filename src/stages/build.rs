//! Build stage: configure and compile through Meson.
//!
//! Defines are computed from the resolved options and build environment
//! (see [`crate::flags`]), dependency pkg-config files are staged into the
//! build directory, then `meson setup` and `meson compile` run in sequence.
//! The install prefix is configured to the package directory at setup time,
//! so the later `meson install` writes `lib/` and `include/` directly under
//! the package prefix. The external tool's exit status is propagated as a
//! [`BuildToolError`].

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::errors::BuildToolError;
use crate::flags::meson_defs;
use crate::platform::BuildEnv;
use crate::recipe::options::ResolvedOptions;
use crate::recipe::Recipe;
use crate::stages::fetch::SourceTree;
use crate::stages::WorkDirs;
use crate::util::fs::ensure_dir;
use crate::util::process::ProcessBuilder;

/// A configured and compiled build tree.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub build_dir: PathBuf,
    pub source_dir: PathBuf,
}

/// Configure and build the source tree.
pub fn build(
    recipe: &Recipe,
    options: &ResolvedOptions,
    env: &BuildEnv,
    source: &SourceTree,
    dirs: &WorkDirs,
    dep_prefixes: &[PathBuf],
    jobs: Option<usize>,
) -> Result<BuildOutput> {
    ensure_dir(&dirs.build_dir)?;

    stage_pkg_config_files(recipe, dep_prefixes, &dirs.build_dir)?;

    let setup = setup_command(options, env, source, &dirs.build_dir, &dirs.package_dir);
    run_meson(&setup)?;

    let mut compile = ProcessBuilder::new("meson")
        .args(["compile", "-C"])
        .arg(&dirs.build_dir);
    if let Some(jobs) = jobs {
        compile = compile.arg("-j").arg(jobs.to_string());
    }
    run_meson(&compile)?;

    Ok(BuildOutput {
        build_dir: dirs.build_dir.clone(),
        source_dir: source.root.clone(),
    })
}

/// Build the `meson setup` invocation.
///
/// The install prefix is the package directory; `meson install` then writes
/// `lib/` and `include/` exactly where the manifest reports them.
fn setup_command(
    options: &ResolvedOptions,
    env: &BuildEnv,
    source: &SourceTree,
    build_dir: &Path,
    prefix: &Path,
) -> ProcessBuilder {
    let mut cmd = ProcessBuilder::new("meson")
        .arg("setup")
        .arg(build_dir)
        .arg(&source.root)
        .arg(format!("--prefix={}", prefix.display()));

    for (name, value) in meson_defs(options, env) {
        cmd = cmd.arg(format!("-D{}={}", name, value));
    }

    // Staged .pc files sit in the build dir; make pkg-config look there
    // first, ahead of anything already on the path.
    let mut pc_path = build_dir.to_string_lossy().into_owned();
    if let Ok(existing) = std::env::var("PKG_CONFIG_PATH") {
        if !existing.is_empty() {
            pc_path.push(PATH_LIST_SEP);
            pc_path.push_str(&existing);
        }
    }
    cmd.env("PKG_CONFIG_PATH", pc_path)
}

#[cfg(unix)]
const PATH_LIST_SEP: char = ':';
#[cfg(windows)]
const PATH_LIST_SEP: char = ';';

/// Run a Meson invocation, mapping non-zero exit to `BuildToolError`.
fn run_meson(cmd: &ProcessBuilder) -> Result<()> {
    tracing::debug!("running: {}", cmd.display_command());

    let status = cmd.status()?;
    if !status.success() {
        return Err(BuildToolError {
            command: cmd.display_command(),
            code: status.code(),
        }
        .into());
    }
    Ok(())
}

/// Copy dependency pkg-config files into the build directory.
///
/// Each dependency prefix is searched at `lib/pkgconfig/*.pc`, falling back
/// to `*.pc` at the prefix root (some packages install there).
fn stage_pkg_config_files(
    recipe: &Recipe,
    dep_prefixes: &[PathBuf],
    build_dir: &Path,
) -> Result<()> {
    if recipe.pkg_config_deps.is_empty() || dep_prefixes.is_empty() {
        return Ok(());
    }

    for prefix in dep_prefixes {
        let mut pc_files = list_pc_files(&prefix.join("lib").join("pkgconfig"))?;
        if pc_files.is_empty() {
            pc_files = list_pc_files(prefix)?;
        }

        for pc in pc_files {
            let name = pc.file_name().map(PathBuf::from).unwrap_or_default();
            let dest = build_dir.join(&name);
            tracing::debug!("staging {}", name.display());
            std::fs::copy(&pc, &dest).with_context(|| {
                format!("failed to copy {} to {}", pc.display(), dest.display())
            })?;
        }
    }

    Ok(())
}

fn list_pc_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let pattern = dir.join("*.pc");
    let mut files: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
        .with_context(|| format!("invalid glob: {}", pattern.display()))?
        .filter_map(|entry| entry.ok())
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Compiler, MsvcRuntime, TargetOs};
    use crate::recipe::options::{resolve_configuration, OptionOverrides};
    use tempfile::TempDir;

    #[test]
    fn test_setup_command_shape() {
        let recipe = Recipe::gst_plugins_good();
        let env = BuildEnv {
            os: TargetOs::Linux,
            arch: "x86_64".to_string(),
            compiler: Compiler::Gcc,
            msvc_runtime: None,
            msvc_toolset: None,
        };
        let options =
            resolve_configuration(&recipe, &env, &OptionOverrides::default()).unwrap();
        let source = SourceTree {
            root: PathBuf::from("/work/src"),
        };

        let cmd = setup_command(
            &options,
            &env,
            &source,
            Path::new("/work/build"),
            Path::new("/work/pkg"),
        );
        let display = cmd.display_command();

        assert!(display.starts_with("meson setup /work/build /work/src --prefix=/work/pkg"));
        assert!(display.contains("-Dtools=disabled"));
        assert!(display.contains("-Dexamples=disabled"));
        assert!(display.contains("-Dbenchmarks=disabled"));
        assert!(display.contains("-Dtests=disabled"));
        assert!(display.contains("-Dmultifile=auto"));
        assert!(display.contains("-Ddefault_library=static"));
    }

    #[test]
    fn test_setup_command_msvc_flags() {
        let recipe = Recipe::gst_plugins_good();
        let env = BuildEnv {
            os: TargetOs::Windows,
            arch: "x86_64".to_string(),
            compiler: Compiler::Msvc,
            msvc_runtime: Some(MsvcRuntime::Md),
            msvc_toolset: Some(12),
        };
        let options =
            resolve_configuration(&recipe, &env, &OptionOverrides::default()).unwrap();
        let source = SourceTree {
            root: PathBuf::from("/work/src"),
        };

        let display = setup_command(
            &options,
            &env,
            &source,
            Path::new("/work/build"),
            Path::new("/work/pkg"),
        )
        .display_command();

        assert!(display.contains("-Dc_link_args=-lws2_32"));
        assert!(display.contains("-Db_vscrt=md"));
        assert!(display.contains("-Dsnprintf=_snprintf"));
    }

    #[test]
    fn test_stage_pkg_config_files() {
        let tmp = TempDir::new().unwrap();
        let prefix = tmp.path().join("glib");
        let build_dir = tmp.path().join("build");
        std::fs::create_dir_all(prefix.join("lib/pkgconfig")).unwrap();
        std::fs::create_dir_all(&build_dir).unwrap();
        std::fs::write(
            prefix.join("lib/pkgconfig/glib-2.0.pc"),
            "Name: glib\n",
        )
        .unwrap();

        let recipe = Recipe::gst_plugins_good();
        stage_pkg_config_files(&recipe, &[prefix], &build_dir).unwrap();

        assert!(build_dir.join("glib-2.0.pc").exists());
    }

    #[test]
    fn test_stage_pkg_config_root_fallback() {
        let tmp = TempDir::new().unwrap();
        let prefix = tmp.path().join("zlib");
        let build_dir = tmp.path().join("build");
        // zlib-style: .pc at the prefix root
        std::fs::create_dir_all(&prefix).unwrap();
        std::fs::create_dir_all(&build_dir).unwrap();
        std::fs::write(prefix.join("zlib.pc"), "Name: zlib\n").unwrap();

        let recipe = Recipe::gst_plugins_good();
        stage_pkg_config_files(&recipe, &[prefix], &build_dir).unwrap();

        assert!(build_dir.join("zlib.pc").exists());
    }

    #[test]
    fn test_build_tool_error_propagates_exit_status() {
        let cmd = ProcessBuilder::new("false");
        let err = run_meson(&cmd).unwrap_err();
        let tool_err = err.downcast_ref::<BuildToolError>().unwrap();
        assert_eq!(tool_err.code, Some(1));
    }
}
