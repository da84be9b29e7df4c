//! Error types for the processing pipeline.

use std::time::Duration;

/// Failures a caller can observe from [`crate::Processor`].
///
/// Everything else that can go wrong during serialization is a programmer
/// error and panics.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The source did not match the document grammar.
    #[error("markdown source did not match the document grammar")]
    Syntax,

    /// The parsing deadline was exceeded before the document completed.
    ///
    /// Distinguishable from [`Error::Syntax`] so callers can decide whether
    /// to retry with a larger budget. Partial output is never surfaced.
    #[error("parsing exceeded the configured deadline of {0:?}")]
    Timeout(Duration),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_display_names_the_budget() {
        let message = Error::Timeout(Duration::from_millis(250)).to_string();
        assert!(message.contains("250ms"));
    }

    #[test]
    fn variants_are_distinguishable() {
        assert!(matches!(Error::Syntax, Error::Syntax));
        assert!(matches!(
            Error::Timeout(Duration::from_secs(2)),
            Error::Timeout(_)
        ));
    }
}
