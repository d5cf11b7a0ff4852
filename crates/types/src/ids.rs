//! Stable integer handles for processes and resources
//!
//! Handles index directly into the registries. The `P<n>` / `R<n>` string
//! forms exist only at the boundary (CLI input, snapshots, events).

use dlsim_errors::UsageError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! handle {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(into = "String", try_from = "String")]
        pub struct $name(u32);

        impl $name {
            /// Create a handle from a registry index
            #[must_use]
            pub const fn new(index: u32) -> Self {
                Self(index)
            }

            /// Registry index of this handle
            #[must_use]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }

        impl FromStr for $name {
            type Err = UsageError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let invalid = || UsageError::InvalidIdentifier {
                    value: s.to_string(),
                };
                let digits = s
                    .strip_prefix($prefix)
                    .or_else(|| s.strip_prefix(&$prefix.to_ascii_lowercase()))
                    .ok_or_else(invalid)?;
                digits.parse::<u32>().map(Self).map_err(|_| invalid())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.to_string()
            }
        }

        impl TryFrom<String> for $name {
            type Error = UsageError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

handle!(
    /// Handle of a simulated process (`P0`, `P1`, ...)
    ProcessId,
    "P"
);

handle!(
    /// Handle of a resource type (`R0`, `R1`, ...)
    ResourceId,
    "R"
);
