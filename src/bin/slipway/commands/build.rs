//! `slipway build` - run the full lifecycle.

use anyhow::Result;

use slipway::{resolve_configuration, Runner, WorkDirs};

use crate::cli::BuildArgs;
use crate::commands::{build_env, load_recipe, option_overrides};

pub fn execute(args: BuildArgs) -> Result<()> {
    let (recipe, recipe_path) = load_recipe(&args.recipe)?;
    let env = build_env(&args.env);
    let options = resolve_configuration(&recipe, &env, &option_overrides(&args.options))?;
    let dirs = WorkDirs::for_recipe(&recipe, args.recipe.work_dir.clone())?;
    let patch_dir = Runner::patch_dir_for(&recipe, recipe_path.as_deref());

    let runner = Runner {
        recipe,
        options,
        env,
        dirs,
        dep_prefixes: args.dep_prefixes,
        jobs: args.jobs,
        patch_dir,
    };

    let manifest = runner.run()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&manifest)?);
    } else {
        print!("{}", manifest.render_text());
    }

    Ok(())
}
