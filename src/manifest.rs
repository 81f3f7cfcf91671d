//! Artifact manifest: what the packaged build exposes to consumers.
//!
//! The manifest is assembled statically from the resolved options and the
//! target platform — platform-conditional libraries are included or skipped
//! at assembly time, never removed from an already-built list.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::platform::BuildEnv;
use crate::recipe::options::ResolvedOptions;
use crate::recipe::Recipe;

/// Read-only consumption contract for a packaged build.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactManifest {
    pub package: String,
    pub version: String,
    /// Include directories under the package prefix.
    pub include_dirs: Vec<PathBuf>,
    /// Library search directories.
    pub lib_dirs: Vec<PathBuf>,
    /// Library names to link against.
    pub libs: Vec<String>,
    /// Preprocessor defines consumers must set.
    pub defines: Vec<String>,
    /// Plugin module directory, appended to the plugin search path for
    /// shared builds.
    pub plugin_path: Option<PathBuf>,
}

impl ArtifactManifest {
    /// Assemble the manifest for one option/platform combination.
    pub fn assemble(
        recipe: &Recipe,
        options: &ResolvedOptions,
        env: &BuildEnv,
        package_dir: &Path,
    ) -> ArtifactManifest {
        let tables = &recipe.manifest;
        let plugin_dir = package_dir.join(recipe.plugin_dir());

        let mut lib_dirs = vec![package_dir.join("lib")];
        let mut libs = Vec::new();
        let mut defines = Vec::new();
        let mut plugin_path = None;

        if options.shared {
            // Plugins are dlopen'd modules; consumers find them through the
            // plugin search path rather than the linker.
            plugin_path = Some(plugin_dir);
        } else {
            defines.push(tables.static_define.clone());
            lib_dirs.push(plugin_dir);
            libs.extend(
                tables
                    .plugin_libs
                    .iter()
                    .filter(|lib| lib.present_on(env.os))
                    .map(|lib| lib.name.clone()),
            );
        }

        libs.extend(
            tables
                .runtime_libs
                .iter()
                .filter(|lib| lib.present_on(env.os))
                .map(|lib| lib.name.clone()),
        );

        let include_dirs = tables
            .include_dirs
            .iter()
            .map(|dir| package_dir.join(dir))
            .collect();

        ArtifactManifest {
            package: recipe.package.name.clone(),
            version: recipe.package.version.clone(),
            include_dirs,
            lib_dirs,
            libs,
            defines,
            plugin_path,
        }
    }

    /// Render a human-readable summary.
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!("{} {}\n", self.package, self.version));

        out.push_str("include dirs:\n");
        for dir in &self.include_dirs {
            out.push_str(&format!("  {}\n", dir.display()));
        }

        out.push_str("lib dirs:\n");
        for dir in &self.lib_dirs {
            out.push_str(&format!("  {}\n", dir.display()));
        }

        if !self.libs.is_empty() {
            out.push_str("libs:\n");
            for lib in &self.libs {
                out.push_str(&format!("  {}\n", lib));
            }
        }

        if !self.defines.is_empty() {
            out.push_str("defines:\n");
            for define in &self.defines {
                out.push_str(&format!("  {}\n", define));
            }
        }

        if let Some(ref path) = self.plugin_path {
            out.push_str(&format!("plugin path:\n  {}\n", path.display()));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::TargetOs;
    use crate::recipe::options::{resolve_configuration, OptionOverrides};

    fn env_for(os: TargetOs) -> BuildEnv {
        let mut env = BuildEnv::host();
        env.os = os;
        env
    }

    fn manifest_for(os: TargetOs, shared: bool) -> ArtifactManifest {
        let recipe = Recipe::gst_plugins_good();
        let env = env_for(os);
        let overrides = OptionOverrides {
            shared: Some(shared),
            ..Default::default()
        };
        let options = resolve_configuration(&recipe, &env, &overrides).unwrap();
        ArtifactManifest::assemble(&recipe, &options, &env, Path::new("/pkg"))
    }

    #[test]
    fn test_linux_excludes_gl_libraries() {
        let manifest = manifest_for(TargetOs::Linux, false);
        assert!(!manifest.libs.iter().any(|l| l == "gstopengl"));
        assert!(!manifest.libs.iter().any(|l| l == "gstgl-1.0"));
    }

    #[test]
    fn test_other_platforms_include_gl_libraries() {
        for os in [TargetOs::Macos, TargetOs::Windows] {
            let manifest = manifest_for(os, false);
            assert!(manifest.libs.iter().any(|l| l == "gstopengl"));
            assert!(manifest.libs.iter().any(|l| l == "gstgl-1.0"));
        }
    }

    #[test]
    fn test_shared_build_exposes_plugin_path() {
        let manifest = manifest_for(TargetOs::Linux, true);

        assert_eq!(
            manifest.plugin_path,
            Some(PathBuf::from("/pkg/lib/gstreamer-1.0"))
        );
        assert!(manifest.defines.is_empty());
        // Plugins are not link libraries in a shared build
        assert!(!manifest.libs.iter().any(|l| l == "gstvolume"));
        // Runtime helper libs are still exposed
        assert!(manifest.libs.iter().any(|l| l == "gstvideo-1.0"));
    }

    #[test]
    fn test_static_build_exposes_define_and_libdir() {
        let manifest = manifest_for(TargetOs::Linux, false);

        assert!(manifest.plugin_path.is_none());
        assert_eq!(manifest.defines, vec!["GST_PLUGINS_BASE_STATIC"]);
        assert!(manifest
            .lib_dirs
            .contains(&PathBuf::from("/pkg/lib/gstreamer-1.0")));
        assert!(manifest.libs.iter().any(|l| l == "gstvolume"));
    }

    #[test]
    fn test_include_dirs() {
        let manifest = manifest_for(TargetOs::Linux, false);
        assert_eq!(
            manifest.include_dirs,
            vec![
                PathBuf::from("/pkg/include"),
                PathBuf::from("/pkg/include/gstreamer-1.0"),
            ]
        );
    }

    #[test]
    fn test_render_text_mentions_libs() {
        let manifest = manifest_for(TargetOs::Macos, false);
        let text = manifest.render_text();
        assert!(text.contains("gst-plugins-good 1.16.2"));
        assert!(text.contains("gstopengl"));
    }
}
