//! Error taxonomy for the client.
//!
//! Failures are values: [`gql`](crate::gql) always returns, carrying either
//! data or one of the [`GqlError`] kinds below, so callers match on the
//! outcome instead of catching panics. GraphQL-level failures (a non-empty
//! `errors` array on an otherwise successful response) are kept distinct in
//! shape from transport-level ones.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Line/column pointer inside the query text, as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLocation {
    /// Line number (1-based).
    pub line: u32,
    /// Column number (1-based).
    pub column: u32,
}

/// A structured GraphQL error from the response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLError {
    /// Human-readable message.
    pub message: String,
    /// Location(s) within the query.
    #[serde(default)]
    pub locations: Vec<ErrorLocation>,
    /// Path within the response where the error occurred, when supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<serde_json::Value>>,
    /// Extensions metadata, when supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<serde_json::Value>,
}

/// Failure below the GraphQL envelope: the request produced no usable body.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    /// Underlying cause.
    pub message: String,
    /// HTTP status code, when one was received.
    pub status: Option<u16>,
    /// Whether the transport itself reported a timeout.
    pub is_timeout: bool,
    /// Whether the connection could not be established.
    pub is_connect: bool,
}

impl TransportError {
    /// Builds a transport error from a bare message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            is_timeout: false,
            is_connect: false,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self {
            message: err.to_string(),
            status: err.status().map(|status| status.as_u16()),
            is_timeout: err.is_timeout(),
            is_connect: err.is_connect(),
        }
    }
}

/// Everything a [`gql`](crate::gql) call can fail with.
#[derive(Debug, Clone, Error)]
pub enum GqlError {
    /// Network-level failure carrying the underlying cause.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The configured deadline elapsed; the in-flight request was aborted.
    #[error("request timed out after {elapsed:?}")]
    Timeout {
        /// The deadline that expired.
        elapsed: Duration,
    },

    /// The response body was not parseable JSON.
    #[error("failed to decode response body: {message}")]
    Json {
        /// Decoder message, prefixed with the HTTP status.
        message: String,
    },

    /// The supplied variables could not be serialized to JSON. Surfaced when
    /// the call runs; no request is issued.
    #[error("failed to serialize variables: {message}")]
    Variables {
        /// Serializer message.
        message: String,
    },

    /// The server answered with a non-empty `errors` array. HTTP success with
    /// GraphQL errors is a failure, not a partial success.
    #[error("GraphQL errors: {0:?}")]
    Graphql(Vec<GraphQLError>),

    /// The envelope carried neither data nor errors.
    #[error("protocol error: {message}")]
    Protocol {
        /// Details.
        message: String,
    },
}

impl GqlError {
    /// The GraphQL error list, when this is a GraphQL-level failure.
    pub fn graphql_errors(&self) -> Option<&[GraphQLError]> {
        match self {
            Self::Graphql(errors) => Some(errors),
            _ => None,
        }
    }

    /// Returns `true` for the deadline-expiry failure.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graphql_error_deserializes_wire_shape() {
        let err: GraphQLError = serde_json::from_str(
            r#"{"message": "boom", "locations": [{"line": 1, "column": 2}]}"#,
        )
        .unwrap();
        assert_eq!(err.message, "boom");
        assert_eq!(err.locations, vec![ErrorLocation { line: 1, column: 2 }]);
        assert_eq!(err.path, None);
    }

    #[test]
    fn test_graphql_error_tolerates_missing_locations() {
        let err: GraphQLError = serde_json::from_str(r#"{"message": "boom"}"#).unwrap();
        assert!(err.locations.is_empty());
    }

    #[test]
    fn test_error_kinds_are_distinguishable() {
        let graphql = GqlError::Graphql(vec![]);
        let transport = GqlError::Transport(TransportError::message("refused"));
        assert!(graphql.graphql_errors().is_some());
        assert!(transport.graphql_errors().is_none());
        assert!(GqlError::Timeout { elapsed: Duration::from_millis(50) }.is_timeout());
        assert!(!transport.is_timeout());
    }
}
