//! Expected-version semantics for conditional writes

use serde::{Deserialize, Serialize};

/// The version a conditional write expects the remote node to hold.
///
/// Replaces the wire-level `-1` sentinel with a typed contract: `Any`
/// matches unconditionally, `Exact` fails the write with a version
/// conflict when the remote version has moved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum ExpectedVersion {
    #[default]
    Any,
    Exact(i32),
}

impl ExpectedVersion {
    /// Whether a node at `actual` satisfies this expectation.
    pub fn matches(&self, actual: i32) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(expected) => *expected == actual,
        }
    }

    /// Wire representation: `Any` is `-1`.
    pub fn as_raw(&self) -> i32 {
        match self {
            Self::Any => -1,
            Self::Exact(v) => *v,
        }
    }
}

impl From<i32> for ExpectedVersion {
    fn from(raw: i32) -> Self {
        if raw < 0 { Self::Any } else { Self::Exact(raw) }
    }
}

impl From<ExpectedVersion> for i32 {
    fn from(v: ExpectedVersion) -> i32 {
        v.as_raw()
    }
}
