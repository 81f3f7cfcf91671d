//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use slipway::{Compiler, MsvcRuntime, TargetOs};

/// Slipway - a recipe runner for Meson-based source packages
#[derive(Parser)]
#[command(name = "slipway")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full lifecycle: fetch, patch, build, package
    Build(BuildArgs),

    /// Fetch and patch the source without building
    Fetch(FetchArgs),

    /// Print the artifact manifest for an option/platform combination
    Manifest(ManifestArgs),

    /// Check that the required build tools are available
    Doctor(DoctorArgs),

    /// Remove the work directories
    Clean(CleanArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Which recipe to run.
#[derive(Args)]
pub struct RecipeArgs {
    /// Path to a Recipe.toml (defaults to the built-in gst-plugins-good
    /// recipe)
    #[arg(long)]
    pub recipe: Option<PathBuf>,

    /// Work directory root (defaults under the user cache dir)
    #[arg(long)]
    pub work_dir: Option<PathBuf>,
}

/// Recipe option overrides.
#[derive(Args)]
pub struct OptionArgs {
    /// Build shared plugin modules instead of static archives
    #[arg(long)]
    pub shared: bool,

    /// Disable position-independent code (not available on Windows)
    #[arg(long)]
    pub no_fpic: bool,

    /// Override a feature, e.g. --feature multifile=enabled (repeatable)
    #[arg(long = "feature", value_name = "NAME=STATE")]
    pub features: Vec<String>,
}

/// Build environment overrides; defaults come from host detection.
#[derive(Args)]
pub struct EnvArgs {
    /// Target operating system (linux, macos, windows)
    #[arg(long)]
    pub target_os: Option<TargetOs>,

    /// Compiler family (gcc, clang, msvc)
    #[arg(long)]
    pub compiler: Option<Compiler>,

    /// MSVC runtime library (MD, MDd, MT, MTd)
    #[arg(long)]
    pub msvc_runtime: Option<MsvcRuntime>,

    /// MSVC toolset major version
    #[arg(long)]
    pub msvc_version: Option<u32>,
}

#[derive(Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub recipe: RecipeArgs,

    #[command(flatten)]
    pub options: OptionArgs,

    #[command(flatten)]
    pub env: EnvArgs,

    /// Installed dependency prefix to take pkg-config files from
    /// (repeatable)
    #[arg(long = "dep-prefix", value_name = "DIR")]
    pub dep_prefixes: Vec<PathBuf>,

    /// Number of parallel compile jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Emit the resulting manifest as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct FetchArgs {
    #[command(flatten)]
    pub recipe: RecipeArgs,
}

#[derive(Args)]
pub struct ManifestArgs {
    #[command(flatten)]
    pub recipe: RecipeArgs,

    #[command(flatten)]
    pub options: OptionArgs,

    #[command(flatten)]
    pub env: EnvArgs,

    /// Emit JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct DoctorArgs {}

#[derive(Args)]
pub struct CleanArgs {
    #[command(flatten)]
    pub recipe: RecipeArgs,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
