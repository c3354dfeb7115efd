// Network Manager - Dispatcher Results
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Per-script result types carried in a dispatcher reply.

use std::fmt;

/// Outcome of running one dispatcher script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptOutcome {
    Unknown,
    Success,
    ExecFailed,
    Failed,
    TimedOut,
}

impl ScriptOutcome {
    /// Map a wire result code. Codes outside the known set yield `None`.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Unknown),
            1 => Some(Self::Success),
            2 => Some(Self::ExecFailed),
            3 => Some(Self::Failed),
            4 => Some(Self::TimedOut),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Human-readable name used in log messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Success => "success",
            Self::ExecFailed => "exec failed",
            Self::Failed => "failed",
            Self::TimedOut => "timed out",
        }
    }
}

impl fmt::Display for ScriptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One field of a reply tuple, as received off the wire.
///
/// Replies are decoded without assuming their shape so that a single bad
/// tuple can be skipped instead of failing the whole reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyField {
    Str(String),
    U32(u32),
    /// Any other type, identified by its D-Bus signature.
    Other(String),
}

impl ReplyField {
    pub fn type_name(&self) -> &str {
        match self {
            Self::Str(_) => "s",
            Self::U32(_) => "u",
            Self::Other(signature) => signature,
        }
    }
}

/// One raw result tuple from a reply.
pub type ReplyEntry = Vec<ReplyField>;

/// A well-formed per-script result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptResult {
    pub script: String,
    pub outcome: ScriptOutcome,
    pub error: String,
}

/// How one dispatch ended, as reported to its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchCompletion {
    /// No scripts are installed; nothing was sent.
    Skipped,
    /// The service replied. Individual scripts may still have failed.
    Completed(Vec<ScriptResult>),
    /// The call itself failed.
    Failed(String),
}

impl DispatchCompletion {
    /// Whether the dispatch was accepted. Script outcomes do not count.
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }

    /// Results of the scripts that ran, if any.
    pub fn results(&self) -> &[ScriptResult] {
        match self {
            Self::Completed(results) => results,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_codes() {
        assert_eq!(ScriptOutcome::from_code(0), Some(ScriptOutcome::Unknown));
        assert_eq!(ScriptOutcome::from_code(1), Some(ScriptOutcome::Success));
        assert_eq!(ScriptOutcome::from_code(2), Some(ScriptOutcome::ExecFailed));
        assert_eq!(ScriptOutcome::from_code(3), Some(ScriptOutcome::Failed));
        assert_eq!(ScriptOutcome::from_code(4), Some(ScriptOutcome::TimedOut));
        assert!(ScriptOutcome::from_code(5).is_none());
    }

    #[test]
    fn test_outcome_names() {
        assert_eq!(ScriptOutcome::ExecFailed.as_str(), "exec failed");
        assert_eq!(ScriptOutcome::TimedOut.to_string(), "timed out");
        assert!(ScriptOutcome::Success.is_success());
        assert!(!ScriptOutcome::Unknown.is_success());
    }

    #[test]
    fn test_failed_scripts_do_not_fail_dispatch() {
        let failed = ScriptResult {
            script: "/etc/NetworkManager/dispatcher.d/10-ifup".to_string(),
            outcome: ScriptOutcome::Failed,
            error: "exit status 1".to_string(),
        };
        let completion = DispatchCompletion::Completed(vec![failed]);
        assert!(completion.is_accepted());
        assert_eq!(completion.results().len(), 1);
        assert!(DispatchCompletion::Skipped.is_accepted());
        assert!(!DispatchCompletion::Failed("timeout".into()).is_accepted());
    }
}
