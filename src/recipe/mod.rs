//! Recipe model: everything the runner needs to know about one package.
//!
//! A recipe names the package, pins its source archive (URL template plus
//! sha256), lists the tri-state feature options it exposes, and carries the
//! manifest tables consumers see after packaging. Recipes load from a
//! `Recipe.toml` file; the GStreamer "good" plugin collection ships built in
//! and is used when no file is given.

pub mod options;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::platform::TargetOs;

/// Feature options exposed by the built-in gst-plugins-good recipe.
const GST_FEATURES: &[&str] = &[
    "ximagesrc",
    "ximagesrc-xshm",
    "ximagesrc-xfixes",
    "ximagesrc-xdamage",
    "multifile",
];

/// A package recipe.
#[derive(Debug, Clone, Deserialize)]
pub struct Recipe {
    pub package: PackageSpec,
    pub source: SourceSpec,
    /// Directory of `*.patch` files applied in lexicographic filename order.
    #[serde(default)]
    pub patch_dir: Option<PathBuf>,
    /// Tri-state feature option names, each valued disabled/enabled/auto.
    #[serde(default)]
    pub features: Vec<String>,
    /// Dependency names whose pkg-config files are staged into the build
    /// directory before configuring.
    #[serde(default)]
    pub pkg_config_deps: Vec<String>,
    pub manifest: ManifestTables,
}

/// Package identity.
#[derive(Debug, Clone, Deserialize)]
pub struct PackageSpec {
    pub name: String,
    pub version: String,
    /// License file name inside the source tree, copied into `licenses/`.
    #[serde(default = "default_license_file")]
    pub license_file: String,
}

fn default_license_file() -> String {
    "LICENSE".to_string()
}

/// Where the source archive comes from and how it is verified.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceSpec {
    /// URL template with `{name}` and `{version}` placeholders.
    pub url: String,
    /// Required SHA-256 of the downloaded archive.
    pub sha256: String,
}

/// Static description of what the package produces, conditioned on platform
/// and the shared/static option when the manifest is assembled.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestTables {
    /// Preprocessor define consumers set when linking the static build.
    pub static_define: String,
    /// Subdirectory of `lib/` holding dynamically loaded plugin modules.
    pub plugin_subdir: String,
    /// Plugin libraries, exposed as link libraries only for static builds.
    pub plugin_libs: Vec<LibEntry>,
    /// Helper libraries exposed for every build.
    pub runtime_libs: Vec<LibEntry>,
    /// Include directories relative to the package prefix.
    pub include_dirs: Vec<String>,
}

/// A produced library, optionally absent on one platform.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "LibEntryDe")]
pub struct LibEntry {
    pub name: String,
    /// Platform the library is excluded on; `None` means present everywhere.
    pub exclude_on: Option<TargetOs>,
}

impl LibEntry {
    pub fn everywhere(name: &str) -> LibEntry {
        LibEntry {
            name: name.to_string(),
            exclude_on: None,
        }
    }

    pub fn except(name: &str, os: TargetOs) -> LibEntry {
        LibEntry {
            name: name.to_string(),
            exclude_on: Some(os),
        }
    }

    /// Whether this library is produced for the given platform.
    pub fn present_on(&self, os: TargetOs) -> bool {
        self.exclude_on != Some(os)
    }
}

/// TOML form: either a bare name or `{ name = "...", exclude_on = "linux" }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum LibEntryDe {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        exclude_on: Option<TargetOs>,
    },
}

impl From<LibEntryDe> for LibEntry {
    fn from(de: LibEntryDe) -> LibEntry {
        match de {
            LibEntryDe::Name(name) => LibEntry {
                name,
                exclude_on: None,
            },
            LibEntryDe::Full { name, exclude_on } => LibEntry { name, exclude_on },
        }
    }
}

impl Recipe {
    /// Load a recipe from a TOML file.
    pub fn load(path: &Path) -> Result<Recipe> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read recipe: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse recipe: {}", path.display()))
    }

    /// The fully expanded source archive URL.
    pub fn source_url(&self) -> String {
        self.source
            .url
            .replace("{name}", &self.package.name)
            .replace("{version}", &self.package.version)
    }

    /// The top-level directory inside the source archive, stripped during
    /// extraction.
    pub fn archive_root(&self) -> String {
        format!("{}-{}", self.package.name, self.package.version)
    }

    /// Plugin directory relative to the package prefix.
    pub fn plugin_dir(&self) -> PathBuf {
        PathBuf::from("lib").join(&self.manifest.plugin_subdir)
    }

    /// The built-in recipe for the GStreamer "good" plugin collection.
    pub fn gst_plugins_good() -> Recipe {
        Recipe {
            package: PackageSpec {
                name: "gst-plugins-good".to_string(),
                version: "1.16.2".to_string(),
                license_file: "LICENSE".to_string(),
            },
            source: SourceSpec {
                url: "https://gstreamer.freedesktop.org/src/{name}/{name}-{version}.tar.xz"
                    .to_string(),
                sha256: "40bb3bafda25c0b739c8fc36e48380fccf61c4d3f83747e97ac3f9b0171b1319"
                    .to_string(),
            },
            patch_dir: Some(PathBuf::from("patches")),
            features: GST_FEATURES.iter().map(|f| f.to_string()).collect(),
            pkg_config_deps: vec![
                "glib".to_string(),
                "gstreamer".to_string(),
                "gst-plugins-base".to_string(),
            ],
            manifest: ManifestTables {
                static_define: "GST_PLUGINS_BASE_STATIC".to_string(),
                plugin_subdir: "gstreamer-1.0".to_string(),
                plugin_libs: vec![
                    LibEntry::everywhere("gstaudiotestsrc"),
                    LibEntry::everywhere("gstaudioconvert"),
                    LibEntry::everywhere("gstaudiomixer"),
                    LibEntry::everywhere("gstaudiorate"),
                    LibEntry::everywhere("gstaudioresample"),
                    LibEntry::everywhere("gstvideotestsrc"),
                    LibEntry::everywhere("gstvideoconvert"),
                    LibEntry::everywhere("gstvideorate"),
                    LibEntry::everywhere("gstvideoscale"),
                    LibEntry::everywhere("gstadder"),
                    LibEntry::everywhere("gstapp"),
                    LibEntry::everywhere("gstcompositor"),
                    LibEntry::everywhere("gstencoding"),
                    LibEntry::everywhere("gstgio"),
                    LibEntry::except("gstopengl", TargetOs::Linux),
                    LibEntry::everywhere("gstoverlaycomposition"),
                    LibEntry::everywhere("gstpbtypes"),
                    LibEntry::everywhere("gstplayback"),
                    LibEntry::everywhere("gstrawparse"),
                    LibEntry::everywhere("gstsubparse"),
                    LibEntry::everywhere("gsttcp"),
                    LibEntry::everywhere("gsttypefindfunctions"),
                    LibEntry::everywhere("gstvolume"),
                ],
                runtime_libs: vec![
                    LibEntry::everywhere("gstallocators-1.0"),
                    LibEntry::everywhere("gstapp-1.0"),
                    LibEntry::everywhere("gstaudio-1.0"),
                    LibEntry::everywhere("gstfft-1.0"),
                    LibEntry::everywhere("gstpbutils-1.0"),
                    LibEntry::everywhere("gstriff-1.0"),
                    LibEntry::everywhere("gstrtp-1.0"),
                    LibEntry::everywhere("gstrtsp-1.0"),
                    LibEntry::everywhere("gstsdp-1.0"),
                    LibEntry::everywhere("gsttag-1.0"),
                    LibEntry::everywhere("gstvideo-1.0"),
                    LibEntry::except("gstgl-1.0", TargetOs::Linux),
                ],
                include_dirs: vec!["include".to_string(), "include/gstreamer-1.0".to_string()],
            },
        }
    }
}
