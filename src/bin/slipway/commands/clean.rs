//! `slipway clean` - remove the work directories.

use anyhow::Result;

use slipway::WorkDirs;

use crate::cli::CleanArgs;
use crate::commands::load_recipe;

pub fn execute(args: CleanArgs) -> Result<()> {
    let (recipe, _) = load_recipe(&args.recipe)?;
    let dirs = WorkDirs::for_recipe(&recipe, args.recipe.work_dir.clone())?;

    if dirs.root.exists() {
        dirs.clean()?;
        println!("removed {}", dirs.root.display());
    } else {
        println!("nothing to clean at {}", dirs.root.display());
    }

    Ok(())
}
