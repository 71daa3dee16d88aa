//! Plugin pipeline: middleware and afterware hooks composed in list order.
//!
//! A [`Plugin`] bundles two ordered hook sequences:
//! - middlewares run before the network step and may short-circuit it,
//! - afterwares run after it (or after a short-circuit) and may replace the
//!   data the caller ultimately receives.
//!
//! Hooks are awaited one at a time, never concurrently, in plugin-list
//! order. Any state a plugin needs (a cache store, a logger) lives inside
//! the hook closures, not in the pipeline.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::operation::{DataOperation, Operation};

/// What a hook has to say about the value flowing through the pipeline.
///
/// The two variants make "short-circuit or continue" explicit: a
/// [`Resolve`](Outcome::Resolve) carrying `null`, `false` or `0` is a
/// legitimate value, not a pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The hook defers; the pipeline keeps whatever value it already has.
    Pass,
    /// The hook supplies a value: a short-circuit result for middleware, a
    /// replacement payload for afterware.
    Resolve(Value),
}

/// Future returned by a hook invocation.
pub type HookFuture = Pin<Box<dyn Future<Output = Outcome> + Send>>;

/// Pre-request hook. Receives the operation; may short-circuit the network
/// call by resolving a value.
pub type Middleware = Arc<dyn Fn(Operation) -> HookFuture + Send + Sync>;

/// Post-response hook. Receives the operation plus the latest data; may
/// replace the data for the hooks after it.
pub type Afterware = Arc<dyn Fn(DataOperation) -> HookFuture + Send + Sync>;

/// Wraps an async closure as a [`Middleware`].
pub fn middleware<F, Fut>(hook: F) -> Middleware
where
    F: Fn(Operation) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Outcome> + Send + 'static,
{
    Arc::new(move |operation| -> HookFuture { Box::pin(hook(operation)) })
}

/// Wraps an async closure as an [`Afterware`].
pub fn afterware<F, Fut>(hook: F) -> Afterware
where
    F: Fn(DataOperation) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Outcome> + Send + 'static,
{
    Arc::new(move |operation| -> HookFuture { Box::pin(hook(operation)) })
}

/// A capability bundle: ordered middlewares plus ordered afterwares, both
/// optional. Cloning a plugin shares the underlying hooks.
#[derive(Clone, Default)]
pub struct Plugin {
    /// Hooks run before the network step, in order.
    pub middlewares: Vec<Middleware>,
    /// Hooks run after the network step (or short-circuit), in order.
    pub afterwares: Vec<Afterware>,
}

impl Plugin {
    /// Creates an empty plugin.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a middleware hook.
    pub fn with_middleware<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Operation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        self.middlewares.push(middleware(hook));
        self
    }

    /// Appends an afterware hook.
    pub fn with_afterware<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(DataOperation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        self.afterwares.push(afterware(hook));
        self
    }
}

/// Runs every middleware in plugin-list order and returns the first resolved
/// value, if any.
///
/// All hooks run to completion even once a value exists: a later plugin (say
/// a logger) must not be skipped because an earlier one (say a cache)
/// already resolved. Later resolved values are discarded.
pub(crate) async fn run_middlewares(plugins: &[Plugin], operation: &Operation) -> Option<Value> {
    let mut resolved: Option<Value> = None;
    for plugin in plugins {
        for hook in &plugin.middlewares {
            match hook(operation.clone()).await {
                Outcome::Resolve(value) if resolved.is_none() => {
                    debug!(
                        operation = %operation.operation_name,
                        "middleware short-circuited the request"
                    );
                    resolved = Some(value);
                }
                Outcome::Resolve(_) | Outcome::Pass => {}
            }
        }
    }
    resolved
}

/// Threads `data` through every afterware in plugin-list order; each resolved
/// value replaces the data seen by the hooks after it.
pub(crate) async fn run_afterwares(
    plugins: &[Plugin],
    operation: &Operation,
    data: Option<Value>,
    from_cache: bool,
) -> Option<Value> {
    let mut current = DataOperation {
        operation: operation.clone(),
        data,
        from_cache,
    };
    for plugin in plugins {
        for hook in &plugin.afterwares {
            if let Outcome::Resolve(value) = hook(current.clone()).await {
                current.data = Some(value);
            }
        }
    }
    current.data
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;

    fn operation() -> Operation {
        Operation::new("query Q { f }", None)
    }

    #[tokio::test]
    async fn test_first_resolved_value_wins_but_all_middlewares_run() {
        let calls = Arc::new(AtomicUsize::new(0));
        let first_calls = calls.clone();
        let second_calls = calls.clone();

        let plugin = Plugin::new()
            .with_middleware(move |_| {
                first_calls.fetch_add(1, Ordering::SeqCst);
                async { Outcome::Resolve(json!({"cached": 1})) }
            })
            .with_middleware(move |_| {
                second_calls.fetch_add(1, Ordering::SeqCst);
                async { Outcome::Resolve(json!({"cached": 2})) }
            });

        let resolved = run_middlewares(&[plugin], &operation()).await;
        assert_eq!(resolved, Some(json!({"cached": 1})));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_all_pass_yields_no_value() {
        let plugin = Plugin::new().with_middleware(|_| async { Outcome::Pass });
        assert_eq!(run_middlewares(&[plugin], &operation()).await, None);
    }

    #[tokio::test]
    async fn test_null_is_a_legitimate_short_circuit() {
        let plugin = Plugin::new().with_middleware(|_| async { Outcome::Resolve(Value::Null) });
        let resolved = run_middlewares(&[plugin], &operation()).await;
        assert_eq!(resolved, Some(Value::Null));
    }

    #[tokio::test]
    async fn test_afterware_replacement_is_not_overwritten_by_pass() {
        let plugin = Plugin::new()
            .with_afterware(|_| async { Outcome::Resolve(json!({"replaced": true})) })
            .with_afterware(|_| async { Outcome::Pass });

        let data = run_afterwares(&[plugin], &operation(), Some(json!({"raw": true})), false).await;
        assert_eq!(data, Some(json!({"replaced": true})));
    }

    #[tokio::test]
    async fn test_afterware_sees_previous_replacement() {
        let plugin = Plugin::new()
            .with_afterware(|_| async { Outcome::Resolve(json!(1)) })
            .with_afterware(|op| async move {
                assert_eq!(op.data, Some(json!(1)));
                Outcome::Resolve(json!(2))
            });

        let data = run_afterwares(&[plugin], &operation(), Some(json!(0)), false).await;
        assert_eq!(data, Some(json!(2)));
    }

    #[tokio::test]
    async fn test_afterware_observes_failure_placeholder() {
        let saw_none = Arc::new(AtomicUsize::new(0));
        let counter = saw_none.clone();
        let plugin = Plugin::new().with_afterware(move |op| {
            if op.data.is_none() {
                counter.fetch_add(1, Ordering::SeqCst);
            }
            async { Outcome::Pass }
        });

        let data = run_afterwares(&[plugin], &operation(), None, false).await;
        assert_eq!(data, None);
        assert_eq!(saw_none.load(Ordering::SeqCst), 1);
    }
}
