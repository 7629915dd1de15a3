//! Error types for binned database access.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GshhsError>;

/// Alias used by the query surface.
pub type QueryError = GshhsError;

/// Boxed error produced by a data collaborator (file library or network transport).
pub type SourceError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum GshhsError {
    /// A database or one of its variables could not be resolved at open time.
    #[error("Cannot open {target}: {reason}")]
    Open { target: String, reason: String },

    /// A bin's raw arrays disagree with the database index arrays.
    #[error("Corrupt bin {bin}: {error}")]
    Decode { bin: usize, error: DecodeError },

    /// An underlying local or network read failed.
    #[error("Backend read failed ({context}): {source}")]
    Backend {
        context: String,
        #[source]
        source: SourceError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl GshhsError {
    pub(crate) fn open(target: impl Into<String>, reason: impl ToString) -> Self {
        GshhsError::Open {
            target: target.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn backend<E>(context: impl Into<String>, source: E) -> Self
    where
        E: Into<SourceError>,
    {
        GshhsError::Backend {
            context: context.into(),
            source: source.into(),
        }
    }
}

/// Inconsistency between a bin's segment arrays and the database globals.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("expected {expected} segment levels, found {found}")]
    LevelCount { expected: usize, found: usize },

    #[error("expected {expected} segment point counts, found {found}")]
    PointCountLength { expected: usize, found: usize },

    #[error("dx has {dx} points but dy has {dy}")]
    OffsetLength { dx: usize, dy: usize },

    #[error("segment {segment} claims {count} points but the index gives it {indexed}")]
    PointCount {
        segment: usize,
        count: usize,
        indexed: usize,
    },

    #[error("segment {segment} spans points {start}..{end} but the bin holds {available}")]
    SegmentRange {
        segment: usize,
        start: usize,
        end: usize,
        available: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "server went away");
        let err = GshhsError::backend("bins 10..=12", io);

        let message = err.to_string();
        assert!(message.contains("bins 10..=12"));
        assert!(message.contains("server went away"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_decode_error_display() {
        let err = GshhsError::Decode {
            bin: 42,
            error: DecodeError::OffsetLength { dx: 3, dy: 2 },
        };
        assert_eq!(err.to_string(), "Corrupt bin 42: dx has 3 points but dy has 2");
    }
}
