//! Per-call operation values and the operation-name heuristic.

use serde_json::Value;

/// Sentinel returned when no operation name can be extracted.
pub const ANONYMOUS_OPERATION: &str = "_";

/// Keywords scanned for, in the priority order the scan tries them.
const OPERATION_KEYWORDS: [&str; 3] = ["query", "mutation", "subscription"];

/// One GraphQL call. Created fresh per [`gql`](crate::gql) invocation and
/// alive only for the call's duration; the query text is never mutated.
#[derive(Debug, Clone)]
pub struct Operation {
    /// Name extracted from the query text, or [`ANONYMOUS_OPERATION`].
    pub operation_name: String,
    /// Variables as a JSON object.
    pub variables: Value,
    /// Raw query text, treated as opaque.
    pub query: String,
}

impl Operation {
    /// Builds an operation for the given query text, deriving the name.
    pub fn new(query: impl Into<String>, variables: Option<Value>) -> Self {
        let query = query.into();
        Self {
            operation_name: operation_name(&query).to_owned(),
            variables: variables.unwrap_or_else(|| Value::Object(serde_json::Map::new())),
            query,
        }
    }
}

/// An [`Operation`] together with the result payload flowing through the
/// afterware chain.
#[derive(Debug, Clone)]
pub struct DataOperation {
    /// The operation the data belongs to.
    pub operation: Operation,
    /// Latest result payload. `None` on the failure path.
    pub data: Option<Value>,
    /// Whether the result came from a middleware short-circuit instead of a
    /// network round trip.
    pub from_cache: bool,
}

/// Extracts the declared operation name from raw query text.
///
/// This is a lightweight scan, not a GraphQL parser: the name starts after
/// the first operation keyword and its following whitespace, and ends at the
/// first `(` or whitespace (whichever comes first). Anonymous operations and
/// malformed text yield [`ANONYMOUS_OPERATION`]. A keyword occurring inside
/// a string literal or comment is a documented limitation of the scan.
///
/// Total and side-effect-free; never panics.
pub fn operation_name(query: &str) -> &str {
    let Some(rest) = after_keyword(query) else {
        return ANONYMOUS_OPERATION;
    };
    let Some(end) = name_delimiter(rest) else {
        return ANONYMOUS_OPERATION;
    };
    let name = &rest[..end];
    if name.is_empty() || name.starts_with('{') {
        return ANONYMOUS_OPERATION;
    }
    name
}

/// Text following the first operation keyword plus one whitespace character.
fn after_keyword(query: &str) -> Option<&str> {
    for keyword in OPERATION_KEYWORDS {
        if let Some(index) = query.find(keyword) {
            return query.get(index + keyword.len() + 1..);
        }
    }
    None
}

/// Byte offset of the first `(` or whitespace, whichever occurs first.
fn name_delimiter(rest: &str) -> Option<usize> {
    let bracket = rest.find('(');
    let space = rest.find(char::is_whitespace);
    match (bracket, space) {
        (Some(bracket), Some(space)) => Some(bracket.min(space)),
        (only, None) => only,
        (None, only) => only,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_query_with_parameters() {
        let name = operation_name("query GetUserById($id: Int!) { user(id: $id) { name } }");
        assert_eq!(name, "GetUserById");
    }

    #[test]
    fn test_named_query_without_parameters() {
        assert_eq!(operation_name("query GetUsers { users { name } }"), "GetUsers");
    }

    #[test]
    fn test_named_mutation_and_subscription() {
        assert_eq!(
            operation_name("mutation CreateUser($name: String!) { createUser(name: $name) }"),
            "CreateUser"
        );
        assert_eq!(
            operation_name("subscription OnUserCreated { userCreated { id } }"),
            "OnUserCreated"
        );
    }

    #[test]
    fn test_anonymous_query_is_sentinel() {
        assert_eq!(operation_name("query { field }"), ANONYMOUS_OPERATION);
        assert_eq!(operation_name("query {field}"), ANONYMOUS_OPERATION);
        assert_eq!(operation_name("{ field }"), ANONYMOUS_OPERATION);
    }

    #[test]
    fn test_no_keyword_is_sentinel() {
        assert_eq!(operation_name("fragment Foo on User { id }"), ANONYMOUS_OPERATION);
        assert_eq!(operation_name(""), ANONYMOUS_OPERATION);
    }

    #[test]
    fn test_no_delimiter_is_sentinel() {
        // Name runs to the end of the text without `(`, whitespace or brace.
        assert_eq!(operation_name("query GetUsers"), ANONYMOUS_OPERATION);
        assert_eq!(operation_name("query"), ANONYMOUS_OPERATION);
    }

    #[test]
    fn test_newline_delimits_the_name() {
        assert_eq!(operation_name("query GetUsers\n{ users }"), "GetUsers");
    }

    #[test]
    fn test_multibyte_text_does_not_panic() {
        assert_eq!(operation_name("query\u{3000}{ field }"), ANONYMOUS_OPERATION);
        assert_eq!(operation_name("запрос"), ANONYMOUS_OPERATION);
    }

    #[test]
    fn test_operation_defaults_variables_to_empty_object() {
        let operation = Operation::new("query Q { f }", None);
        assert_eq!(operation.operation_name, "Q");
        assert_eq!(operation.variables, serde_json::json!({}));
    }
}
