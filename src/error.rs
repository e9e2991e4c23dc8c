use std::sync::Arc;

/// Represents a result type for operations in the Hypertune SDK.
///
/// This `Result` type is a standard Rust `Result` type where the error variant is defined by the
/// hypertune-specific [`Error`] enum.
pub type Result<T> = std::result::Result<T, Error>;

/// Enum representing errors that the SDK surfaces to the caller.
///
/// Most failures of the evaluation engine are not errors in this sense: they are reported as an
/// error flag on the returned [`Node`](crate::Node) and absorbed by the typed accessors, which
/// return the caller's fallback instead.
#[derive(thiserror::Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// The engine flagged the evaluation of a node as failed.
    #[error("evaluation error")]
    Evaluation,

    /// The engine returned bytes that are not valid JSON.
    #[error("failed to decode evaluation result")]
    // serde_json::Error is not clonable, so we're wrapping it in an Arc.
    Decode(#[source] Arc<serde_json::Error>),

    /// Arguments, variable values, or SDK options could not be serialized to JSON.
    #[error("failed to marshal {what}")]
    Encode {
        /// What was being serialized.
        what: &'static str,
        /// The underlying serialization error.
        #[source]
        source: Arc<serde_json::Error>,
    },
}

impl Error {
    pub(crate) fn encode(what: &'static str, source: serde_json::Error) -> Error {
        Error::Encode {
            what,
            source: Arc::new(source),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::Decode(Arc::new(value))
    }
}
