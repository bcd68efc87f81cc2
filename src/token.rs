//! The externally supplied "current phase" token.

use std::fmt;
use std::str::FromStr;

use crate::registry::PhaseRegistry;

/// Sentinel reported once the whole pipeline has finished.
pub const COMPLETED: &str = "completed";
/// Sentinel reported when the pipeline stopped on an error.
pub const FAILED: &str = "failed";

/// Which phase the external pipeline says is executing.
///
/// A token is either a terminal sentinel or a phase name. Whether a name is a
/// registered phase or an unrecognized string is only decided against a
/// registry, see [`PhaseToken::locate`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PhaseToken {
    /// A phase name as reported by the pipeline
    Phase(String),
    /// Every phase finished
    Completed,
    /// The pipeline failed, optionally naming the phase that failed
    Failed { phase: Option<String> },
}

/// Where a token lands in a specific registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPosition {
    /// The token names the phase at this index
    At(usize),
    Completed,
    /// Failed at the given index; `None` when the failing phase is unknown
    Failed(Option<usize>),
    /// Not a sentinel and not a registered phase
    Unrecognized,
}

impl PhaseToken {
    /// Parse a raw token string. Never fails: unknown strings stay as `Phase`.
    pub fn parse(raw: &str) -> Self {
        match raw {
            COMPLETED => Self::Completed,
            FAILED => Self::Failed { phase: None },
            other => Self::Phase(other.to_string()),
        }
    }

    /// Mark a `failed` token with the phase that failed. Other tokens are unchanged.
    pub fn with_failed_phase(self, failed_phase: Option<String>) -> Self {
        match self {
            Self::Failed { phase } => Self::Failed {
                phase: failed_phase.or(phase),
            },
            other => other,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed { .. })
    }

    /// Resolve this token against a registry.
    pub fn locate(&self, registry: &PhaseRegistry) -> TokenPosition {
        match self {
            Self::Completed => TokenPosition::Completed,
            Self::Failed { phase } => {
                TokenPosition::Failed(phase.as_deref().and_then(|id| registry.index_of(id)))
            }
            Self::Phase(id) => match registry.index_of(id) {
                Some(index) => TokenPosition::At(index),
                None => TokenPosition::Unrecognized,
            },
        }
    }
}

impl FromStr for PhaseToken {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for PhaseToken {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl fmt::Display for PhaseToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Phase(id) => write!(f, "{}", id),
            Self::Completed => write!(f, "{}", COMPLETED),
            Self::Failed { phase: Some(id) } => write!(f, "{} ({})", FAILED, id),
            Self::Failed { phase: None } => write!(f, "{}", FAILED),
        }
    }
}
