//! Recipe option resolution.
//!
//! Options merge defaults with caller overrides into an immutable
//! [`ResolvedOptions`] value that is passed through every stage. Every
//! feature must resolve to exactly one enumerated value before the build
//! stage runs; anything outside a declared domain is an
//! [`InvalidOptionError`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::errors::InvalidOptionError;
use crate::platform::BuildEnv;
use crate::recipe::Recipe;

/// State of a tri-state feature option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureState {
    Disabled,
    Enabled,
    Auto,
}

impl FeatureState {
    /// The value Meson expects for a feature option.
    pub fn as_meson(&self) -> &'static str {
        match self {
            FeatureState::Disabled => "disabled",
            FeatureState::Enabled => "enabled",
            FeatureState::Auto => "auto",
        }
    }
}

impl fmt::Display for FeatureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_meson())
    }
}

impl FromStr for FeatureState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "disabled" => Ok(FeatureState::Disabled),
            "enabled" => Ok(FeatureState::Enabled),
            "auto" => Ok(FeatureState::Auto),
            other => Err(format!("unknown feature state: {}", other)),
        }
    }
}

/// Raw caller overrides, as collected from the CLI.
///
/// Values are kept as strings so that domain validation happens in one place,
/// during resolution.
#[derive(Debug, Clone, Default)]
pub struct OptionOverrides {
    pub shared: Option<bool>,
    pub fpic: Option<bool>,
    /// `(feature name, state string)` pairs.
    pub features: Vec<(String, String)>,
}

/// Immutable resolved configuration for one build invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOptions {
    /// Build shared plugin modules instead of static archives.
    pub shared: bool,
    /// Position-independent code. `Some` on every target except Windows,
    /// where the option does not exist.
    pub fpic: Option<bool>,
    /// One state per feature the recipe declares.
    pub features: BTreeMap<String, FeatureState>,
}

/// Merge recipe defaults with caller overrides.
///
/// Defaults: `shared = false`, `fPIC = true` (where it exists), every
/// feature `auto`.
pub fn resolve_configuration(
    recipe: &Recipe,
    env: &BuildEnv,
    overrides: &OptionOverrides,
) -> Result<ResolvedOptions> {
    let mut features: BTreeMap<String, FeatureState> = recipe
        .features
        .iter()
        .map(|name| (name.clone(), FeatureState::Auto))
        .collect();

    for (name, value) in &overrides.features {
        if !features.contains_key(name) {
            let declared = recipe.features.join(", ");
            return Err(InvalidOptionError::new(name, value)
                .with_allowed(format!("declared features: {}", declared))
                .into());
        }

        let state: FeatureState = value.parse().map_err(|_| {
            InvalidOptionError::new(name, value).with_allowed("disabled, enabled, auto")
        })?;
        features.insert(name.clone(), state);
    }

    let fpic = if env.supports_fpic() {
        Some(overrides.fpic.unwrap_or(true))
    } else {
        if let Some(value) = overrides.fpic {
            return Err(InvalidOptionError::new("fPIC", value.to_string())
                .with_allowed("fPIC does not exist on Windows targets")
                .into());
        }
        None
    };

    Ok(ResolvedOptions {
        shared: overrides.shared.unwrap_or(false),
        fpic,
        features,
    })
}
