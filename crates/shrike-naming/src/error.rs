use thiserror::Error;

/// Fatal minification failures.
///
/// Missing types and unresolvable non-rebound references are recovered from
/// locally and never surface here.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MinifyError {
    /// A reserved name was already claimed by a different member. This is
    /// almost always an apply-mapping conflict.
    #[error("reserved name `{name}` for {member} is already claimed by a different member")]
    InvariantViolation { member: String, name: String },

    /// Contradictory keep rules, e.g. an apply-mapping that renames a member
    /// whose original name is kept.
    #[error("illegal configuration: {0}")]
    IllegalConfiguration(String),
}
