//! `slipway manifest` - print the artifact manifest without building.
//!
//! The manifest is a static function of the resolved options and the target
//! platform, so consumers can inspect the contract for any combination
//! without a toolchain present.

use anyhow::Result;

use slipway::{resolve_configuration, ArtifactManifest, WorkDirs};

use crate::cli::ManifestArgs;
use crate::commands::{build_env, load_recipe, option_overrides};

pub fn execute(args: ManifestArgs) -> Result<()> {
    let (recipe, _) = load_recipe(&args.recipe)?;
    let env = build_env(&args.env);
    let options = resolve_configuration(&recipe, &env, &option_overrides(&args.options))?;
    let dirs = WorkDirs::for_recipe(&recipe, args.recipe.work_dir.clone())?;

    let manifest = ArtifactManifest::assemble(&recipe, &options, &env, &dirs.package_dir);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&manifest)?);
    } else {
        print!("{}", manifest.render_text());
    }

    Ok(())
}
