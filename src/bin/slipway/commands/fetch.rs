//! `slipway fetch` - fetch and patch the source without building.

use anyhow::Result;

use slipway::{resolve_configuration, OptionOverrides, Runner, WorkDirs};

use crate::cli::FetchArgs;
use crate::commands::load_recipe;

pub fn execute(args: FetchArgs) -> Result<()> {
    let (recipe, recipe_path) = load_recipe(&args.recipe)?;
    let env = slipway::BuildEnv::host();
    let options = resolve_configuration(&recipe, &env, &OptionOverrides::default())?;
    let dirs = WorkDirs::for_recipe(&recipe, args.recipe.work_dir.clone())?;
    dirs.create()?;
    let patch_dir = Runner::patch_dir_for(&recipe, recipe_path.as_deref());

    let runner = Runner {
        recipe,
        options,
        env,
        dirs,
        dep_prefixes: Vec::new(),
        jobs: None,
        patch_dir,
    };

    let source = runner.fetch()?;
    println!("source ready at {}", source.root.display());

    Ok(())
}
