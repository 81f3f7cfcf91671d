//! Build tool detection.
//!
//! The build stage shells out to Meson (which in turn needs Ninja), locates
//! dependencies through pkg-config, and the wrapped source tree runs the
//! parser generators bison and flex. All of them must be present before any
//! network or build work starts.

use std::path::PathBuf;

use anyhow::Result;
use semver::{Version, VersionReq};

use crate::errors::MissingToolError;
use crate::util::process::{find_executable, ProcessBuilder};

/// Minimum Meson version the recipe's build definition requires.
const MESON_FLOOR: &str = ">=0.53";

/// Tools required on PATH, besides Meson.
const REQUIRED_TOOLS: &[(&str, &str)] = &[
    ("ninja", "install ninja: https://ninja-build.org/"),
    ("pkg-config", "install pkg-config from your package manager"),
    ("bison", "install bison from your package manager"),
    ("flex", "install flex from your package manager"),
];

/// Outcome of probing one tool, for `doctor` reporting.
#[derive(Debug, Clone)]
pub struct ToolCheck {
    pub name: String,
    pub found: Option<PathBuf>,
    pub version: Option<Version>,
    pub ok: bool,
    pub hint: Option<String>,
}

/// Fail unless every required build tool is present and new enough.
pub fn ensure_build_tools_present() -> Result<()> {
    for check in probe_tools() {
        if !check.ok {
            let mut err = MissingToolError::new(&check.name);
            if let Some(hint) = check.hint {
                err = err.with_hint(hint);
            }
            return Err(err.into());
        }
    }
    Ok(())
}

/// Probe every required tool without failing; used by `doctor`.
pub fn probe_tools() -> Vec<ToolCheck> {
    let mut checks = Vec::new();

    let meson_req = VersionReq::parse(MESON_FLOOR).unwrap_or_else(|_| VersionReq::STAR);
    let meson_path = find_executable("meson");
    let meson_version = meson_path.as_ref().and_then(|_| detect_meson_version().ok());
    let meson_ok = match (&meson_path, &meson_version) {
        (Some(_), Some(version)) => meson_req.matches(version),
        _ => false,
    };
    checks.push(ToolCheck {
        name: "meson".to_string(),
        found: meson_path,
        version: meson_version.clone(),
        ok: meson_ok,
        hint: if meson_ok {
            None
        } else if let Some(version) = meson_version {
            Some(format!(
                "meson {} required, found {}; upgrade with `pip install --upgrade meson`",
                MESON_FLOOR, version
            ))
        } else {
            Some("install meson: pip install meson, or https://mesonbuild.com/Getting-meson.html".to_string())
        },
    });

    for (name, hint) in REQUIRED_TOOLS {
        let found = find_executable(name);
        let ok = found.is_some();
        checks.push(ToolCheck {
            name: name.to_string(),
            found,
            version: None,
            ok,
            hint: if ok { None } else { Some(hint.to_string()) },
        });
    }

    checks
}

/// Detect the installed Meson version from `meson --version`.
fn detect_meson_version() -> Result<Version> {
    let output = ProcessBuilder::new("meson").arg("--version").exec()?;
    if !output.status.success() {
        anyhow::bail!("meson --version failed");
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_meson_version(stdout.trim())
}

/// Parse Meson's version output, tolerating dev suffixes and short versions.
fn parse_meson_version(raw: &str) -> Result<Version> {
    let clean = raw
        .split(|c: char| !c.is_ascii_digit() && c != '.')
        .next()
        .unwrap_or(raw);

    let parts: Vec<&str> = clean.split('.').collect();
    let major = parts.first().and_then(|s| s.parse().ok()).unwrap_or(0);
    let minor = parts.get(1).and_then(|s| s.parse().ok()).unwrap_or(0);
    let patch = parts.get(2).and_then(|s| s.parse().ok()).unwrap_or(0);

    Ok(Version::new(major, minor, patch))
}
