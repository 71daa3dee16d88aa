//! featherql — a lightweight GraphQL-over-HTTP client.
//!
//! A call primitive lighter than a full GraphQL client: no caching, no
//! normalized store, no subscriptions. Cross-cutting behavior is injected
//! through composable plugins instead of a fixed feature set:
//! - **middlewares** run before the request and may short-circuit the
//!   network call by resolving a value (the usual cache hook),
//! - **afterwares** run after the response and may transform the data the
//!   caller receives.
//!
//! # Example
//!
//! ```ignore
//! use featherql::{client, gql, ConfigOptions, GqlOptions};
//!
//! client().configure("https://api.example.com/graphql", ConfigOptions::new());
//!
//! let data = gql(
//!     "query GetUser($id: Int!) { user(id: $id) { name } }",
//!     GqlOptions::new().variables(serde_json::json!({ "id": 1 })),
//! )
//! .await?;
//! ```
//!
//! # Plugins
//!
//! ```ignore
//! use featherql::{Outcome, Plugin};
//!
//! let logger = Plugin::new()
//!     .with_middleware(|op| async move {
//!         tracing::info!(operation = %op.operation_name, "outgoing");
//!         Outcome::Pass
//!     })
//!     .with_afterware(|op| async move {
//!         tracing::info!(from_cache = op.from_cache, "incoming");
//!         Outcome::Pass
//!     });
//! ```
//!
//! The pipeline runs every middleware even after one has resolved a value;
//! the first resolved value wins and later ones are discarded. Afterwares
//! run on the short-circuit path (`from_cache = true`), the network path,
//! and the failure path (with `data = None`, return values discarded).

pub mod client;
pub mod error;
pub mod operation;
pub mod plugin;
pub(crate) mod request;
pub mod transport;

pub use client::{
    client, gql, Client, ClientConfig, ConfigOptions, FetchConfig, GqlOptions, DEFAULT_TIMEOUT,
};
pub use error::{ErrorLocation, GqlError, GraphQLError, TransportError};
pub use operation::{operation_name, DataOperation, Operation, ANONYMOUS_OPERATION};
pub use plugin::{afterware, middleware, Afterware, HookFuture, Middleware, Outcome, Plugin};
pub use transport::{HttpTransport, Transport, TransportRequest, TransportResponse};
