//! The recipe lifecycle.
//!
//! One invocation runs a fixed, linear stage sequence:
//!
//! Configure → Ensure tools → Fetch → Patch → Build → Package
//!
//! Each stage is a hard precondition for the next; the first failure aborts
//! the remaining stages. There is no internal concurrency and no
//! coordination between invocations — the work directories belong to one
//! in-flight build.

pub mod build;
pub mod fetch;
pub mod package;
pub mod patch;
pub mod tools;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::manifest::ArtifactManifest;
use crate::platform::BuildEnv;
use crate::recipe::options::ResolvedOptions;
use crate::recipe::Recipe;
use crate::util::fs::{ensure_dir, remove_dir_all_if_exists};

/// Filesystem layout for one package build.
#[derive(Debug, Clone)]
pub struct WorkDirs {
    pub root: PathBuf,
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
    pub package_dir: PathBuf,
}

impl WorkDirs {
    /// Lay out work directories under `root`.
    pub fn at(root: PathBuf) -> WorkDirs {
        WorkDirs {
            source_dir: root.join("src"),
            build_dir: root.join("build"),
            package_dir: root.join("pkg"),
            root,
        }
    }

    /// Default location under the user cache directory.
    pub fn for_recipe(recipe: &Recipe, root_override: Option<PathBuf>) -> Result<WorkDirs> {
        let root = match root_override {
            Some(root) => root,
            None => {
                let base = directories::BaseDirs::new()
                    .context("could not determine a cache directory; pass --work-dir")?;
                base.cache_dir()
                    .join("slipway")
                    .join(format!("{}-{}", recipe.package.name, recipe.package.version))
            }
        };

        Ok(WorkDirs::at(root))
    }

    pub fn create(&self) -> Result<()> {
        ensure_dir(&self.root)?;
        ensure_dir(&self.build_dir)?;
        ensure_dir(&self.package_dir)
    }

    /// Remove everything this invocation would produce.
    pub fn clean(&self) -> Result<()> {
        remove_dir_all_if_exists(&self.root)
    }
}

/// Drives one recipe through the full lifecycle.
pub struct Runner {
    pub recipe: Recipe,
    pub options: ResolvedOptions,
    pub env: BuildEnv,
    pub dirs: WorkDirs,
    /// Installed prefixes of dependencies whose pkg-config files are staged.
    pub dep_prefixes: Vec<PathBuf>,
    pub jobs: Option<usize>,
    /// Directory holding the recipe's patch files, if any.
    pub patch_dir: Option<PathBuf>,
}

impl Runner {
    /// Run fetch and patch only.
    pub fn fetch(&self) -> Result<fetch::SourceTree> {
        tracing::info!(
            "stage fetch: {} {}",
            self.recipe.package.name,
            self.recipe.package.version
        );
        let source = fetch::fetch_source(&self.recipe, &self.dirs.source_dir)?;

        if let Some(ref patch_dir) = self.patch_dir {
            tracing::info!("stage patch: {}", patch_dir.display());
            patch::apply_patches(&source.root, patch_dir)?;
        }

        Ok(source)
    }

    /// Run the full lifecycle and return the artifact manifest.
    pub fn run(&self) -> Result<ArtifactManifest> {
        self.dirs.create()?;

        tracing::info!("stage tools");
        tools::ensure_build_tools_present()?;

        let source = self.fetch()?;

        tracing::info!("stage build: {}", self.dirs.build_dir.display());
        let output = build::build(
            &self.recipe,
            &self.options,
            &self.env,
            &source,
            &self.dirs,
            &self.dep_prefixes,
            self.jobs,
        )?;

        tracing::info!("stage package: {}", self.dirs.package_dir.display());
        package::package(
            &self.recipe,
            &self.options,
            &self.env,
            &output,
            &self.dirs.package_dir,
        )
    }

    /// Resolve the patch directory relative to a recipe file location.
    pub fn patch_dir_for(recipe: &Recipe, recipe_path: Option<&Path>) -> Option<PathBuf> {
        let dir = recipe.patch_dir.as_ref()?;
        match recipe_path.and_then(|p| p.parent()) {
            Some(base) => Some(base.join(dir)),
            None => Some(dir.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workdirs_layout() {
        let dirs = WorkDirs::at(PathBuf::from("/work"));
        assert_eq!(dirs.source_dir, PathBuf::from("/work/src"));
        assert_eq!(dirs.build_dir, PathBuf::from("/work/build"));
        assert_eq!(dirs.package_dir, PathBuf::from("/work/pkg"));
    }

    #[test]
    fn test_workdirs_override() {
        let recipe = Recipe::gst_plugins_good();
        let dirs =
            WorkDirs::for_recipe(&recipe, Some(PathBuf::from("/tmp/slipway-test"))).unwrap();
        assert_eq!(dirs.root, PathBuf::from("/tmp/slipway-test"));
    }

    #[test]
    fn test_workdirs_default_names_package() {
        let recipe = Recipe::gst_plugins_good();
        if let Ok(dirs) = WorkDirs::for_recipe(&recipe, None) {
            assert!(dirs
                .root
                .to_string_lossy()
                .contains("gst-plugins-good-1.16.2"));
        }
    }

    #[test]
    fn test_patch_dir_resolution() {
        let recipe = Recipe::gst_plugins_good();

        let relative = Runner::patch_dir_for(&recipe, None).unwrap();
        assert_eq!(relative, PathBuf::from("patches"));

        let resolved =
            Runner::patch_dir_for(&recipe, Some(Path::new("/recipes/gst/Recipe.toml"))).unwrap();
        assert_eq!(resolved, PathBuf::from("/recipes/gst/patches"));
    }
}
