use thiserror::Error;

/// Main error type for proxidex operations
///
/// Only external failures are representable here. Configuration
/// preconditions (such as a minimum-should-match threshold that is not
/// smaller than the clause count) are programmer errors and panic at
/// construction; broken internal invariants are fatal assertions. A document
/// that simply has no match is never an error — absence is reported through
/// `None` returns and the `NO_MORE_INTERVALS`/`NO_MORE_DOCS` sentinels.
#[derive(Error, Debug)]
pub enum ProxidexError {
    /// Failure from the underlying postings/enumeration layer, propagated
    /// unmodified through whichever navigation call observed it.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Character offsets were requested for a field indexed without them.
    #[error("Offsets not indexed for field: {0}")]
    OffsetsUnavailable(String),
}

/// Result type alias for proxidex operations
pub type Result<T> = std::result::Result<T, ProxidexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProxidexError::OffsetsUnavailable("body".to_string());
        assert_eq!(err.to_string(), "Offsets not indexed for field: body");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "truncated postings");
        let err: ProxidexError = io.into();
        assert!(matches!(err, ProxidexError::Io(_)));
    }
}
