//! Typed errors for the recipe lifecycle.
//!
//! Every stage failure is fatal: the pipeline surfaces the first failing
//! stage's error with its identifying detail (tool name, patch filename,
//! checksum pair) and aborts the remaining stages. There is no retry and no
//! rollback of partially applied patches or partially written directories.

use miette::Diagnostic;
use thiserror::Error;

/// A configuration option was set to a value outside its enumerated domain,
/// or does not exist for the target platform.
#[derive(Debug, Error, Diagnostic)]
#[error("invalid value `{value}` for option `{option}`")]
#[diagnostic(code(slipway::config::invalid_option))]
pub struct InvalidOptionError {
    pub option: String,
    pub value: String,
    #[help]
    pub allowed: Option<String>,
}

impl InvalidOptionError {
    pub fn new(option: impl Into<String>, value: impl Into<String>) -> Self {
        InvalidOptionError {
            option: option.into(),
            value: value.into(),
            allowed: None,
        }
    }

    pub fn with_allowed(mut self, allowed: impl Into<String>) -> Self {
        self.allowed = Some(format!("allowed values: {}", allowed.into()));
        self
    }
}

/// A required external build tool could not be located.
#[derive(Debug, Error, Diagnostic)]
#[error("required build tool `{tool}` not found")]
#[diagnostic(code(slipway::tools::missing))]
pub struct MissingToolError {
    pub tool: String,
    #[help]
    pub hint: Option<String>,
}

impl MissingToolError {
    pub fn new(tool: impl Into<String>) -> Self {
        MissingToolError {
            tool: tool.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// The source archive could not be downloaded.
#[derive(Debug, Error, Diagnostic)]
#[error("failed to download `{url}`: {reason}")]
#[diagnostic(
    code(slipway::fetch::network),
    help("check your network connection and the source URL, then re-run")
)]
pub struct NetworkError {
    pub url: String,
    pub reason: String,
}

/// The downloaded archive did not match its required checksum.
#[derive(Debug, Error, Diagnostic)]
#[error("checksum mismatch for `{url}`\n  expected: {expected}\n  actual:   {actual}")]
#[diagnostic(
    code(slipway::fetch::integrity),
    help("the recipe pins a sha256 for this archive; a mismatch usually means a corrupted or tampered download")
)]
pub struct IntegrityError {
    pub url: String,
    pub expected: String,
    pub actual: String,
}

/// A patch failed to apply to the extracted source tree.
#[derive(Debug, Error, Diagnostic)]
#[error("patch `{patch}` failed to apply: {detail}")]
#[diagnostic(
    code(slipway::patch::conflict),
    help("earlier patches stay applied; fix or drop the conflicting patch and re-run from scratch")
)]
pub struct PatchConflictError {
    pub patch: String,
    pub detail: String,
}

/// The external build tool exited with a non-zero status.
#[derive(Debug, Error, Diagnostic)]
#[error("`{command}` failed with exit code {code:?}")]
#[diagnostic(code(slipway::build::tool_failed))]
pub struct BuildToolError {
    pub command: String,
    pub code: Option<i32>,
}
