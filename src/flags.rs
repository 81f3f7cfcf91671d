//! Meson define computation.
//!
//! Flags accumulate as typed entries per channel and are rendered into
//! `-D` defines once, deterministically, just before the build tool is
//! invoked.

use std::collections::BTreeMap;

use crate::platform::BuildEnv;
use crate::recipe::options::ResolvedOptions;

/// Auxiliary Meson targets always disabled: the recipe builds the library,
/// nothing else.
const AUXILIARY_TARGETS: &[&str] = &["tools", "examples", "benchmarks", "tests"];

/// MSVC toolsets older than this lack a conforming `snprintf`.
const MSVC_SNPRINTF_TOOLSET: u32 = 14;

/// A flag channel Meson exposes as a `*_args` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FlagChannel {
    CArgs,
    CppArgs,
    CLinkArgs,
    CppLinkArgs,
}

impl FlagChannel {
    fn meson_name(&self) -> &'static str {
        match self {
            FlagChannel::CArgs => "c_args",
            FlagChannel::CppArgs => "cpp_args",
            FlagChannel::CLinkArgs => "c_link_args",
            FlagChannel::CppLinkArgs => "cpp_link_args",
        }
    }
}

/// Ordered accumulation of compiler/linker flags per channel.
#[derive(Debug, Clone, Default)]
pub struct FlagSet {
    channels: BTreeMap<FlagChannel, Vec<String>>,
}

impl FlagSet {
    pub fn new() -> FlagSet {
        FlagSet::default()
    }

    /// Append a flag to one channel.
    pub fn push(&mut self, channel: FlagChannel, flag: impl Into<String>) {
        self.channels.entry(channel).or_default().push(flag.into());
    }

    /// Append a flag to both compiler channels.
    pub fn compiler_flag(&mut self, flag: impl Into<String>) {
        let flag = flag.into();
        self.push(FlagChannel::CArgs, flag.clone());
        self.push(FlagChannel::CppArgs, flag);
    }

    /// Append a flag to both linker channels.
    pub fn linker_flag(&mut self, flag: impl Into<String>) {
        let flag = flag.into();
        self.push(FlagChannel::CLinkArgs, flag.clone());
        self.push(FlagChannel::CppLinkArgs, flag);
    }

    /// Render non-empty channels into Meson defines, in channel order.
    fn render_into(&self, defs: &mut BTreeMap<String, String>) {
        for (channel, flags) in &self.channels {
            if !flags.is_empty() {
                defs.insert(channel.meson_name().to_string(), flags.join(" "));
            }
        }
    }
}

/// Compute the full `-Dname=value` define set for `meson setup`.
///
/// Returned sorted by name so repeated invocations produce identical command
/// lines.
pub fn meson_defs(options: &ResolvedOptions, env: &BuildEnv) -> Vec<(String, String)> {
    let mut defs: BTreeMap<String, String> = BTreeMap::new();
    let mut flags = FlagSet::new();

    if env.is_msvc() {
        flags.linker_flag("-lws2_32");
        if let Some(runtime) = env.msvc_runtime {
            flags.compiler_flag(runtime.as_flag());
            defs.insert("b_vscrt".to_string(), runtime.vscrt().to_string());
        }
        if env.msvc_toolset.map_or(false, |v| v < MSVC_SNPRINTF_TOOLSET) {
            flags.compiler_flag("-Dsnprintf=_snprintf");
        }
    }
    flags.render_into(&mut defs);

    defs.insert(
        "default_library".to_string(),
        if options.shared { "shared" } else { "static" }.to_string(),
    );
    if let Some(fpic) = options.fpic {
        defs.insert("b_staticpic".to_string(), fpic.to_string());
    }

    for target in AUXILIARY_TARGETS {
        defs.insert(target.to_string(), "disabled".to_string());
    }

    for (feature, state) in &options.features {
        defs.insert(feature.clone(), state.as_meson().to_string());
    }

    defs.into_iter().collect()
}
