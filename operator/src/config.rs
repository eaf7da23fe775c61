use std::time::Duration;

#[derive(Clone, Debug)]
pub struct OperatorConfig {
    /// Service name reported on every span created by the operator.
    pub service_name: String,

    /// Namespace to watch. `None` watches all namespaces.
    pub watch_namespace: Option<String>,

    /// Delay before a failed reconcile is retried.
    ///
    /// Reconcilers never retry internally; the controller requeues the
    /// object after this delay.
    pub error_backoff: Duration,

    /// Cluster calls slower than this are logged under the
    /// `performance` target.
    pub slow_call_threshold: Duration,

    /// Emit JSON logs instead of the pretty development format.
    pub json_logs: bool,
}

impl OperatorConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let service_name = var("OTEL_SERVICE_NAME")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "hierarchy-operator".to_string());

        let watch_namespace = var("WATCH_NAMESPACE").filter(|v| !v.is_empty());

        let error_backoff_secs = var("RECONCILE_ERROR_BACKOFF_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(5);

        let slow_call_ms = var("SLOW_CALL_MS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(250);

        Self {
            service_name,
            watch_namespace,
            error_backoff: Duration::from_secs(error_backoff_secs),
            slow_call_threshold: Duration::from_millis(slow_call_ms),
            json_logs: var("APP_ENV").as_deref() == Some("production"),
        }
    }
}
