//! Slipway - a recipe runner for Meson-based source packages
//!
//! This crate drives one package recipe through a fixed lifecycle —
//! configure options, verify build tools, fetch and checksum the source
//! archive, apply local patches, build through Meson, and install into a
//! package layout — then reports an artifact manifest (libraries, include
//! directories, plugin paths) to downstream consumers.

pub mod errors;
pub mod flags;
pub mod manifest;
pub mod platform;
pub mod recipe;
pub mod stages;
pub mod util;

pub use manifest::ArtifactManifest;
pub use platform::{BuildEnv, Compiler, MsvcRuntime, TargetOs};
pub use recipe::options::{resolve_configuration, FeatureState, OptionOverrides, ResolvedOptions};
pub use recipe::Recipe;
pub use stages::{Runner, WorkDirs};
