//! Client registry and the `gql` entry point.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::error::GqlError;
use crate::operation::Operation;
use crate::plugin::{run_afterwares, run_middlewares, Plugin};
use crate::request;
use crate::transport::{HttpTransport, Transport};

/// Deadline applied when [`Client::configure`] does not set one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Transport options layered under each request: a method override plus a
/// header map. Merge-compatible across the client-default and call levels.
#[derive(Debug, Clone, Default)]
pub struct FetchConfig {
    /// HTTP method override.
    pub method: Option<String>,
    /// Headers; matched case-insensitively on merge.
    pub headers: HashMap<String, String>,
}

impl FetchConfig {
    /// Creates an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP method.
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Adds a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// The registry record: everything [`Client::configure`] replaces in one
/// shot, and everything a call in flight snapshots at its start.
#[derive(Clone)]
pub struct ClientConfig {
    /// Endpoint URL; empty until configured.
    pub endpoint: String,
    /// Base transport options.
    pub fetch: FetchConfig,
    /// Base plugin list; list order is execution order, duplicates allowed.
    pub plugins: Vec<Plugin>,
    /// Network deadline; zero disables it.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            fetch: FetchConfig::default(),
            plugins: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Options accepted by [`Client::configure`]. Fields left unset revert to
/// their defaults: configuring is a full overwrite, never a per-field merge.
#[derive(Clone, Default)]
pub struct ConfigOptions {
    /// Base transport options.
    pub fetch: FetchConfig,
    /// Base plugin list.
    pub plugins: Vec<Plugin>,
    /// Network deadline; defaults to [`DEFAULT_TIMEOUT`].
    pub timeout: Option<Duration>,
}

impl ConfigOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base transport options.
    pub fn fetch(mut self, fetch: FetchConfig) -> Self {
        self.fetch = fetch;
        self
    }

    /// Appends a plugin.
    pub fn plugin(mut self, plugin: Plugin) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Replaces the plugin list.
    pub fn plugins(mut self, plugins: Vec<Plugin>) -> Self {
        self.plugins = plugins;
        self
    }

    /// Sets the network deadline.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Per-call options for [`gql`] and [`Client::gql`].
#[derive(Clone, Default)]
pub struct GqlOptions {
    /// GraphQL variables; defaults to an empty object.
    pub variables: Option<Value>,
    /// Call-level transport overrides, merged over the client defaults.
    pub config: FetchConfig,
    /// Call-scoped plugins, appended after the client's plugins.
    pub plugins: Vec<Plugin>,
    /// Endpoint override.
    pub endpoint: Option<String>,
    /// Method override; takes precedence over both fetch configs.
    pub method: Option<String>,
    /// Alternate registry instance; the process default when unset.
    pub client: Option<Client>,
    /// Serialization failure captured by [`variables`](GqlOptions::variables),
    /// surfaced when the call runs.
    variables_error: Option<String>,
}

impl GqlOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the variables from any serializable value.
    ///
    /// A value that fails to serialize (say a map with non-string keys) is
    /// not silently dropped: the failure is kept and the call returns
    /// [`GqlError::Variables`] before anything runs.
    pub fn variables<V: Serialize>(mut self, variables: V) -> Self {
        match serde_json::to_value(variables) {
            Ok(value) => self.variables = Some(value),
            Err(err) => self.variables_error = Some(err.to_string()),
        }
        self
    }

    /// Sets the call-level transport overrides.
    pub fn config(mut self, config: FetchConfig) -> Self {
        self.config = config;
        self
    }

    /// Appends a call-scoped plugin.
    pub fn plugin(mut self, plugin: Plugin) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Overrides the endpoint for this call.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Overrides the HTTP method for this call.
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Routes this call through an alternate client.
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }
}

struct ClientInner {
    config: RwLock<ClientConfig>,
    transport: Arc<dyn Transport>,
}

/// A client registry: the default endpoint, transport options, plugins and
/// timeout shared by every call routed through it.
///
/// Cloning is cheap and shares the registry. Multiple independent clients
/// may coexist; a process-wide default is reachable through [`client`].
/// The registry is meant to be configured once at startup — a `configure`
/// racing calls already in flight leaves those calls on the snapshot they
/// captured, which is documented behavior rather than a guarded case.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// Creates a client with the default `reqwest`-backed transport.
    pub fn new() -> Self {
        Self::with_transport(Arc::new(HttpTransport::new()))
    }

    /// Creates a client with an injected transport.
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                config: RwLock::new(ClientConfig::default()),
                transport,
            }),
        }
    }

    /// Replaces the whole configuration record atomically.
    ///
    /// Every field is overwritten; options left unset revert to their
    /// defaults (empty fetch config, empty plugin list, 10 s timeout).
    pub fn configure(&self, endpoint: impl Into<String>, options: ConfigOptions) {
        let next = ClientConfig {
            endpoint: endpoint.into(),
            fetch: options.fetch,
            plugins: options.plugins,
            timeout: options.timeout.unwrap_or(DEFAULT_TIMEOUT),
        };
        let mut config = self
            .inner
            .config
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *config = next;
    }

    /// Snapshot of the current configuration. A call in flight keeps the
    /// snapshot it captured and does not observe a later [`configure`].
    ///
    /// [`configure`]: Client::configure
    pub fn config(&self) -> ClientConfig {
        self.inner
            .config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Issues one GraphQL operation through this client.
    ///
    /// Pipeline: snapshot config → extract the operation name → run every
    /// middleware (first resolved value short-circuits the network step) →
    /// execute the request if nothing short-circuited → run every afterware
    /// → return the final data or the failure as a value.
    pub async fn gql(&self, query: &str, options: GqlOptions) -> Result<Value, GqlError> {
        // Unserializable variables fail the call up front; no request, no
        // pipeline.
        if let Some(message) = options.variables_error.clone() {
            return Err(GqlError::Variables { message });
        }

        let snapshot = self.config();
        let operation = Operation::new(query, options.variables.clone());

        // Client plugins first, then call-scoped ones; middleware and
        // afterware share this order.
        let mut plugins = snapshot.plugins.clone();
        plugins.extend(options.plugins.iter().cloned());

        if let Some(cached) = run_middlewares(&plugins, &operation).await {
            let data = run_afterwares(&plugins, &operation, Some(cached), true).await;
            return Ok(data.unwrap_or(Value::Null));
        }

        match request::execute(
            self.inner.transport.as_ref(),
            &snapshot,
            &options,
            &operation,
        )
        .await
        {
            Ok(data) => {
                let data = run_afterwares(&plugins, &operation, Some(data), false).await;
                Ok(data.unwrap_or(Value::Null))
            }
            Err(err) => {
                // Afterwares still observe the failure (data = None) so a
                // cache plugin can evict a pending entry; their return
                // values are discarded on this path.
                run_afterwares(&plugins, &operation, None, false).await;
                Err(err)
            }
        }
    }
}

static DEFAULT_CLIENT: OnceLock<Client> = OnceLock::new();

/// Process-wide default client, created on first use by the same factory as
/// [`Client::new`].
///
/// Convenient for application startup (`client().configure(...)`); tests
/// should construct their own [`Client`] instead of sharing this one to
/// avoid cross-test leakage.
pub fn client() -> &'static Client {
    DEFAULT_CLIENT.get_or_init(Client::new)
}

/// Issues one GraphQL operation using the process default client, or the
/// client named in `options`.
pub async fn gql(query: &str, options: GqlOptions) -> Result<Value, GqlError> {
    match options.client.clone() {
        Some(instance) => instance.gql(query, options).await,
        None => client().gql(query, options).await,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_configure_is_a_full_overwrite() {
        let client = Client::new();
        client.configure(
            "http://one/graphql",
            ConfigOptions::new()
                .fetch(FetchConfig::new().header("authorization", "Bearer t"))
                .plugin(Plugin::new())
                .timeout(Duration::from_millis(500)),
        );

        // Reconfiguring with bare options reverts every omitted field.
        client.configure("http://two/graphql", ConfigOptions::new());

        let config = client.config();
        assert_eq!(config.endpoint, "http://two/graphql");
        assert!(config.fetch.headers.is_empty());
        assert!(config.plugins.is_empty());
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_snapshot_does_not_observe_later_configure() {
        let client = Client::new();
        client.configure("http://one/graphql", ConfigOptions::new());
        let snapshot = client.config();

        client.configure("http://two/graphql", ConfigOptions::new());
        assert_eq!(snapshot.endpoint, "http://one/graphql");
        assert_eq!(client.config().endpoint, "http://two/graphql");
    }

    #[test]
    fn test_clients_are_independent() {
        let a = Client::new();
        let b = Client::new();
        a.configure("http://a/graphql", ConfigOptions::new());
        assert_eq!(b.config().endpoint, "");
    }

    #[test]
    fn test_options_serialize_variables() {
        let options = GqlOptions::new().variables(json!({ "id": 1 }));
        assert_eq!(options.variables, Some(json!({ "id": 1 })));
        assert!(options.variables_error.is_none());
    }

    #[tokio::test]
    async fn test_unserializable_variables_fail_the_call() {
        // Tuple keys cannot become JSON object keys.
        let mut variables = std::collections::HashMap::new();
        variables.insert((1u8, 2u8), 3);

        let options = GqlOptions::new().variables(variables);
        assert!(options.variables.is_none());

        let client = Client::new();
        client.configure("http://unused/graphql", ConfigOptions::new());
        let err = client
            .gql("query Q { f }", options)
            .await
            .expect_err("serialization failure must surface");
        assert!(matches!(err, GqlError::Variables { .. }));
    }
}
