//! Newtype domain identifiers.
//!
//! Every domain concept that has an identity is represented as a distinct newtype
//! wrapping a primitive, so a [`Topic`] cannot be passed where a
//! [`DeploymentName`] is expected even though both are strings under the hood.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new value, returning `None` if it is empty or only
            /// whitespace. Surrounding whitespace is trimmed.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                let trimmed = v.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(Self(trimmed.to_string()))
                }
            }

            /// Returns the value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single workflow run (one call to the orchestrator).
///
/// Generated fresh for every run; recorded on the `workflow` tracing span and
/// in the [`crate::WorkflowResult`] so all activity from a single run can be
/// correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkflowRunId(Uuid);

impl WorkflowRunId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a [`WorkflowRunId`] from an existing UUID (e.g. deserialised from an export).
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for WorkflowRunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers: String-backed
// ---------------------------------------------------------------------------

string_id! {
    /// The subject a workflow produces content about (e.g. `"sustainable fashion trends"`).
    ///
    /// The only mandatory field of a [`crate::WorkflowRequest`].
    Topic
}

string_id! {
    /// Names the model a provider should serve: an Azure OpenAI deployment name
    /// or an OpenAI model identifier (e.g. `"gpt-4"`).
    DeploymentName
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_rejects_blank_values() {
        assert!(Topic::new("").is_none());
        assert!(Topic::new("   \n").is_none());
    }

    #[test]
    fn topic_trims_surrounding_whitespace() {
        let topic = Topic::new("  sustainable fashion trends ").unwrap();
        assert_eq!(topic.as_str(), "sustainable fashion trends");
        assert_eq!(topic.to_string(), "sustainable fashion trends");
    }

    #[test]
    fn run_ids_are_unique() {
        assert_ne!(WorkflowRunId::new_random(), WorkflowRunId::new_random());
    }
}
