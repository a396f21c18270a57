//! Error Types
//!
//! The runtime has no recoverable-error taxonomy of its own. The only
//! failures it reports are the ones a host adapter raises while the runtime
//! is creating or mutating host nodes, plus configuration parse errors.

use std::fmt;

use thiserror::Error;

/// A failure reported by a [`HostAdapter`](crate::host::HostAdapter) primitive.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The adapter was handed a node handle it does not know about.
    #[error("host node {0} does not exist")]
    MissingNode(String),

    /// The adapter refused to perform a mutation.
    #[error("host rejected {op}: {reason}")]
    Rejected {
        /// Name of the primitive that failed, e.g. `append_child`.
        op: &'static str,
        /// Adapter supplied reason.
        reason: String,
    },
}

/// The phase of a render cycle in which a host failure surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Host node creation inside the work-unit processor.
    Render,
    /// Mutation application inside the commit phase.
    Commit,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Render => f.write_str("render"),
            Phase::Commit => f.write_str("commit"),
        }
    }
}

/// Errors surfaced by the runtime.
#[derive(Debug, Error)]
pub enum Error {
    /// A host adapter primitive failed. The cycle that hit the failure is
    /// abandoned; mutations already applied to the host tree stay applied.
    #[error("host adapter failed during {phase}")]
    Host {
        phase: Phase,
        #[source]
        source: HostError,
    },

    /// A runtime configuration document could not be parsed.
    #[error("invalid runtime configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn render(source: HostError) -> Self {
        Error::Host {
            phase: Phase::Render,
            source,
        }
    }

    pub(crate) fn commit(source: HostError) -> Self {
        Error::Host {
            phase: Phase::Commit,
            source,
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_error_messages() {
        let err = HostError::Rejected {
            op: "append_child",
            reason: "detached parent".into(),
        };
        assert_eq!(err.to_string(), "host rejected append_child: detached parent");

        let wrapped = Error::commit(err.clone());
        assert_eq!(wrapped.to_string(), "host adapter failed during commit");
        let source = std::error::Error::source(&wrapped).map(|s| s.to_string());
        assert_eq!(source, Some(err.to_string()));
    }
}
