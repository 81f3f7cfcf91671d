//! Build environment descriptor: target OS, architecture, compiler family.
//!
//! The descriptor is computed once per invocation (host detection, optionally
//! overridden from the CLI) and never mutated afterward. Everything
//! platform-specific downstream — flag computation, library renaming, the
//! manifest tables — keys off this value instead of probing the host again.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Target operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetOs {
    Linux,
    Macos,
    Windows,
}

impl TargetOs {
    /// Detect the host OS.
    pub fn host() -> TargetOs {
        if cfg!(target_os = "windows") {
            TargetOs::Windows
        } else if cfg!(target_os = "macos") {
            TargetOs::Macos
        } else {
            TargetOs::Linux
        }
    }

    /// The platform's static library file extension.
    pub fn static_lib_ext(&self) -> &'static str {
        match self {
            TargetOs::Windows => "lib",
            _ => "a",
        }
    }
}

impl fmt::Display for TargetOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetOs::Linux => write!(f, "linux"),
            TargetOs::Macos => write!(f, "macos"),
            TargetOs::Windows => write!(f, "windows"),
        }
    }
}

impl FromStr for TargetOs {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linux" => Ok(TargetOs::Linux),
            "macos" | "darwin" => Ok(TargetOs::Macos),
            "windows" | "win32" => Ok(TargetOs::Windows),
            other => Err(format!("unknown target os: {}", other)),
        }
    }
}

/// Compiler family driving the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compiler {
    Gcc,
    Clang,
    Msvc,
}

impl fmt::Display for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compiler::Gcc => write!(f, "gcc"),
            Compiler::Clang => write!(f, "clang"),
            Compiler::Msvc => write!(f, "msvc"),
        }
    }
}

impl FromStr for Compiler {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gcc" => Ok(Compiler::Gcc),
            "clang" => Ok(Compiler::Clang),
            "msvc" | "cl" => Ok(Compiler::Msvc),
            other => Err(format!("unknown compiler: {}", other)),
        }
    }
}

/// MSVC runtime library selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MsvcRuntime {
    #[serde(rename = "MD")]
    Md,
    #[serde(rename = "MDd")]
    Mdd,
    #[serde(rename = "MT")]
    Mt,
    #[serde(rename = "MTd")]
    Mtd,
}

impl MsvcRuntime {
    /// The compiler flag selecting this runtime (e.g. `-MD`).
    pub fn as_flag(&self) -> &'static str {
        match self {
            MsvcRuntime::Md => "-MD",
            MsvcRuntime::Mdd => "-MDd",
            MsvcRuntime::Mt => "-MT",
            MsvcRuntime::Mtd => "-MTd",
        }
    }

    /// The lower-cased name Meson expects for `b_vscrt`.
    pub fn vscrt(&self) -> &'static str {
        match self {
            MsvcRuntime::Md => "md",
            MsvcRuntime::Mdd => "mdd",
            MsvcRuntime::Mt => "mt",
            MsvcRuntime::Mtd => "mtd",
        }
    }
}

impl FromStr for MsvcRuntime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MD" | "md" => Ok(MsvcRuntime::Md),
            "MDd" | "mdd" => Ok(MsvcRuntime::Mdd),
            "MT" | "mt" => Ok(MsvcRuntime::Mt),
            "MTd" | "mtd" => Ok(MsvcRuntime::Mtd),
            other => Err(format!("unknown msvc runtime: {}", other)),
        }
    }
}

impl fmt::Display for MsvcRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MsvcRuntime::Md => write!(f, "MD"),
            MsvcRuntime::Mdd => write!(f, "MDd"),
            MsvcRuntime::Mt => write!(f, "MT"),
            MsvcRuntime::Mtd => write!(f, "MTd"),
        }
    }
}

/// Resolved build environment for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildEnv {
    pub os: TargetOs,
    pub arch: String,
    pub compiler: Compiler,
    /// Runtime library selection; only meaningful for MSVC.
    pub msvc_runtime: Option<MsvcRuntime>,
    /// MSVC toolset major version (e.g. 14 for VS 2015); only meaningful
    /// for MSVC. Toolsets older than 14 lack a conforming `snprintf`.
    pub msvc_toolset: Option<u32>,
}

impl BuildEnv {
    /// Detect the host environment.
    pub fn host() -> BuildEnv {
        let os = TargetOs::host();
        let compiler = match os {
            TargetOs::Windows => Compiler::Msvc,
            TargetOs::Macos => Compiler::Clang,
            TargetOs::Linux => Compiler::Gcc,
        };

        BuildEnv {
            os,
            arch: std::env::consts::ARCH.to_string(),
            compiler,
            msvc_runtime: if compiler == Compiler::Msvc {
                Some(MsvcRuntime::Md)
            } else {
                None
            },
            msvc_toolset: if compiler == Compiler::Msvc {
                Some(14)
            } else {
                None
            },
        }
    }

    pub fn is_msvc(&self) -> bool {
        self.compiler == Compiler::Msvc
    }

    /// Whether the fPIC option exists for this target.
    ///
    /// Position-independent code is not a concept on Windows; the option is
    /// absent there rather than ignored.
    pub fn supports_fpic(&self) -> bool {
        self.os != TargetOs::Windows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_os_parse() {
        assert_eq!("linux".parse::<TargetOs>().unwrap(), TargetOs::Linux);
        assert_eq!("darwin".parse::<TargetOs>().unwrap(), TargetOs::Macos);
        assert_eq!("Windows".parse::<TargetOs>().unwrap(), TargetOs::Windows);
        assert!("beos".parse::<TargetOs>().is_err());
    }

    #[test]
    fn test_msvc_runtime_flags() {
        assert_eq!(MsvcRuntime::Md.as_flag(), "-MD");
        assert_eq!(MsvcRuntime::Mtd.as_flag(), "-MTd");
        assert_eq!(MsvcRuntime::Md.vscrt(), "md");
        assert_eq!(MsvcRuntime::Mdd.vscrt(), "mdd");
    }

    #[test]
    fn test_fpic_presence() {
        let mut env = BuildEnv::host();

        env.os = TargetOs::Linux;
        assert!(env.supports_fpic());

        env.os = TargetOs::Windows;
        assert!(!env.supports_fpic());
    }

    #[test]
    fn test_static_lib_ext() {
        assert_eq!(TargetOs::Linux.static_lib_ext(), "a");
        assert_eq!(TargetOs::Windows.static_lib_ext(), "lib");
    }
}
