//! Command implementations.

pub mod build;
pub mod clean;
pub mod completions;
pub mod doctor;
pub mod fetch;
pub mod manifest;

use std::path::PathBuf;

use anyhow::Result;

use slipway::{BuildEnv, OptionOverrides, Recipe};

use crate::cli::{EnvArgs, OptionArgs, RecipeArgs};

/// Load the recipe named on the command line, or the built-in one.
///
/// Returns the recipe along with the path it was loaded from (used to
/// resolve a relative patch directory).
pub fn load_recipe(args: &RecipeArgs) -> Result<(Recipe, Option<PathBuf>)> {
    match &args.recipe {
        Some(path) => Ok((Recipe::load(path)?, Some(path.clone()))),
        None => Ok((Recipe::gst_plugins_good(), None)),
    }
}

/// Build environment from host detection plus CLI overrides.
pub fn build_env(args: &EnvArgs) -> BuildEnv {
    let mut env = BuildEnv::host();

    if let Some(os) = args.target_os {
        env.os = os;
    }
    if let Some(compiler) = args.compiler {
        env.compiler = compiler;
    }
    if let Some(runtime) = args.msvc_runtime {
        env.msvc_runtime = Some(runtime);
    }
    if let Some(version) = args.msvc_version {
        env.msvc_toolset = Some(version);
    }

    env
}

/// Collect raw option overrides from the command line.
///
/// Feature values stay unparsed here; domain validation happens during
/// configuration resolution so that a bad value is always an
/// InvalidOptionError.
pub fn option_overrides(args: &OptionArgs) -> OptionOverrides {
    let features = args
        .features
        .iter()
        .map(|spec| match spec.split_once('=') {
            Some((name, value)) => (name.to_string(), value.to_string()),
            None => (spec.clone(), String::new()),
        })
        .collect();

    OptionOverrides {
        shared: args.shared.then_some(true),
        fpic: args.no_fpic.then_some(false),
        features,
    }
}
