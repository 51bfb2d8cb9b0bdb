//! Shared types for the MotionGen workspace.
//!
//! Holds the opaque identifiers and the request lifecycle enum that every
//! other crate speaks in, plus tracing initialization for binaries.

pub mod logging;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifier of one generation request, minted at submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RequestId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Identifier of one uploaded model asset, minted at upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(Uuid);

impl AssetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AssetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AssetId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Lifecycle status of one generation request, as polled by callers.
///
/// Transitions are strictly monotonic in the order
/// `RequestReceived → GenerationStarted → GenerationFinished → Success`,
/// with `Failed` reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Failed,
    RequestReceived,
    GenerationStarted,
    GenerationFinished,
    Success,
}

impl RequestStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::Success)
    }

    /// Position in the forward progression. `Failed` sits outside it.
    pub fn forward_rank(self) -> Option<u8> {
        match self {
            Self::RequestReceived => Some(0),
            Self::GenerationStarted => Some(1),
            Self::GenerationFinished => Some(2),
            Self::Success => Some(3),
            Self::Failed => None,
        }
    }

    /// Whether moving from `self` to `next` respects the lifecycle order.
    pub fn can_transition(self, next: RequestStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.forward_rank(), next.forward_rank()) {
            // Failed is reachable from any non-terminal state.
            (_, None) => true,
            (Some(a), Some(b)) => b > a,
            (None, _) => false,
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::Failed => "Process failed.",
            Self::RequestReceived => "Request received.",
            Self::GenerationStarted => "Generation started.",
            Self::GenerationFinished => "Generation finished.",
            Self::Success => "Ready for download.",
        };
        write!(f, "{}", msg)
    }
}
