//! Error types for the catalog, codec and favorites store.

use crate::codepoint_ty::Codepoint;
use thiserror::Error;

/// Main error type for uniquity operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The value is above U+10FFFF or inside the surrogate range.
    #[error("invalid Unicode scalar value: {0:#X}")]
    InvalidScalar(u32),

    /// The text is not a hexadecimal codepoint.
    #[error("malformed codepoint: {0:?}")]
    MalformedCodepoint(String),

    /// The codepoint is already in the favorites set.
    #[error("{0} is already a favorite")]
    AlreadyFavorite(Codepoint),

    /// The reference dataset could not be loaded.
    #[error("dataset unavailable: {0}")]
    DatasetUnavailable(String),

    /// Reading or writing durable storage failed.
    #[error("storage failure: {context}")]
    StorageFailure {
        /// What the store was doing.
        context: String,
        /// Underlying cause.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The configuration file is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub(crate) fn storage<E>(context: impl Into<String>, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::StorageFailure {
            context: context.into(),
            source: source.into(),
        }
    }
}

/// Result type alias
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn display_invalid_scalar() {
        let err = Error::InvalidScalar(0xD800);
        assert_eq!(err.to_string(), "invalid Unicode scalar value: 0xD800");
    }

    #[test]
    fn display_malformed_codepoint() {
        let err = Error::MalformedCodepoint("xyz".into());
        assert_eq!(err.to_string(), "malformed codepoint: \"xyz\"");
    }

    #[test]
    fn display_already_favorite() {
        let err = Error::AlreadyFavorite(Codepoint::from_scalar(0x1F600).unwrap());
        assert_eq!(err.to_string(), "1F600 is already a favorite");
    }

    #[test]
    fn storage_failure_keeps_source() {
        let err = Error::storage(
            "writing favorites",
            io::Error::new(io::ErrorKind::Other, "disk full"),
        );
        assert_eq!(err.to_string(), "storage failure: writing favorites");
        let std_err: &dyn std::error::Error = &err;
        assert_eq!(std_err.source().unwrap().to_string(), "disk full");
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn variants_are_distinguishable() {
        let err = Error::DatasetUnavailable("missing".into());
        assert!(matches!(err, Error::DatasetUnavailable(_)));
        assert!(!matches!(err, Error::InvalidConfig(_)));
    }
}
