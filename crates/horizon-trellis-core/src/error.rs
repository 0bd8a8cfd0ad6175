//! Error types for the trellis service framework.

/// Result type alias for trellis operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the registry, layout, and service machinery.
///
/// The variants mirror the framework's failure taxonomy: configuration
/// errors come from malformed or inconsistent declarations, lifecycle
/// violations from operations applied in the wrong state, and dispatch
/// errors from misuse or loss of the UI executor. Absent registry entries
/// are not errors; lookups return `Option` and callers branch.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed or inconsistent configuration declaration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Operation applied to a service or layout in the wrong state.
    #[error("lifecycle violation: {0}")]
    Lifecycle(String),

    /// UI executor misuse or a queue that is no longer serviced.
    #[error("dispatch error: {0}")]
    Dispatch(String),
}

impl Error {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a lifecycle violation.
    pub fn lifecycle(message: impl Into<String>) -> Self {
        Self::Lifecycle(message.into())
    }

    /// Create a dispatch error.
    pub fn dispatch(message: impl Into<String>) -> Self {
        Self::Dispatch(message.into())
    }

    /// Whether this is a configuration error.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Whether this is a lifecycle violation.
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, Self::Lifecycle(_))
    }

    /// Whether this is a dispatch error.
    pub fn is_dispatch(&self) -> bool {
        matches!(self, Self::Dispatch(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_predicates() {
        assert!(Error::configuration("bad tag").is_configuration());
        assert!(Error::lifecycle("already started").is_lifecycle());
        assert!(Error::dispatch("queue gone").is_dispatch());
        assert!(!Error::configuration("bad tag").is_lifecycle());
    }

    #[test]
    fn test_display_includes_message() {
        let err = Error::configuration("duplicate sid 'open'");
        assert_eq!(
            err.to_string(),
            "configuration error: duplicate sid 'open'"
        );
    }
}
