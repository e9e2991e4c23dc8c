use std::time::Duration;

use serde::Serialize;

use crate::LANGUAGE;

/// Options for the evaluation engine.
///
/// Every option is optional; anything left unset uses the engine's default.
///
/// # Examples
/// ```
/// # use std::time::Duration;
/// # use hypertune::SdkOptions;
/// let options = SdkOptions::new()
///     .branch_name("staging")
///     .init_data_refresh_interval(Duration::from_secs(10))
///     .logs_flush_interval(Duration::ZERO);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SdkOptions {
    pub(crate) branch_name: Option<String>,
    pub(crate) init_data_refresh_interval: Option<Duration>,
    pub(crate) logs_flush_interval: Option<Duration>,
    pub(crate) edge_base_url: Option<String>,
    pub(crate) remote_logging_base_url: Option<String>,
}

impl SdkOptions {
    /// Create options that use the engine defaults for everything.
    pub fn new() -> SdkOptions {
        SdkOptions::default()
    }

    /// Branch of the project to fetch flag logic from.
    ///
    /// Defaults to `"main"`.
    pub fn branch_name(mut self, branch_name: impl Into<String>) -> Self {
        self.branch_name = Some(branch_name.into());
        self
    }

    /// How often the engine checks for updated flag logic.
    ///
    /// Defaults to 2 seconds. `Duration::ZERO` disables periodic updates.
    pub fn init_data_refresh_interval(mut self, interval: Duration) -> Self {
        self.init_data_refresh_interval = Some(interval);
        self
    }

    /// How often the engine flushes logs in the background.
    ///
    /// Defaults to 2 seconds. `Duration::ZERO` disables background flushing, in which case logs
    /// are only sent by [`Node::flush_logs`](crate::Node::flush_logs).
    pub fn logs_flush_interval(mut self, interval: Duration) -> Self {
        self.logs_flush_interval = Some(interval);
        self
    }

    /// Override base URL for fetching flag logic. Clients should use the default setting in most
    /// cases.
    pub fn edge_base_url(mut self, url: impl Into<String>) -> Self {
        self.edge_base_url = Some(url.into());
        self
    }

    /// Override base URL for delivering logs. Clients should use the default setting in most
    /// cases.
    pub fn remote_logging_base_url(mut self, url: impl Into<String>) -> Self {
        self.remote_logging_base_url = Some(url.into());
        self
    }

    /// The JSON document the engine receives.
    pub(crate) fn to_wire(&self) -> WireOptions<'_> {
        WireOptions {
            language: LANGUAGE,
            branch_name: self.branch_name.as_deref(),
            init_data_refresh_interval_ms: self.init_data_refresh_interval.map(whole_millis),
            logs_flush_interval_ms: self.logs_flush_interval.map(whole_millis),
            edge_base_url: self.edge_base_url.as_deref(),
            remote_logging_base_url: self.remote_logging_base_url.as_deref(),
        }
    }
}

fn whole_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[derive(Debug, Serialize)]
pub(crate) struct WireOptions<'a> {
    language: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    init_data_refresh_interval_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    logs_flush_interval_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    edge_base_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    remote_logging_base_url: Option<&'a str>,
}

/// Everything needed to create the root [`Node`](crate::Node).
///
/// Generated code usually fills in the queries (and optionally the token and fallback snapshot),
/// leaving variable values and options to the application.
#[derive(Debug, Clone)]
pub struct CreateConfig<V = serde_json::Value> {
    /// Project token. Can be omitted when running purely from `fallback_init_data_json`.
    pub token: Option<String>,
    /// Variable bindings for the runtime query, serialized to JSON.
    pub variable_values: V,
    /// The runtime query document, as JSON.
    pub query_json: String,
    /// The initialization query document, as JSON.
    pub init_query_json: String,
    /// A static snapshot of flag logic to evaluate against until the first fetch completes, and
    /// whenever the server is unreachable.
    pub fallback_init_data_json: Option<String>,
    /// Engine options.
    pub options: SdkOptions,
}

impl<V> CreateConfig<V> {
    /// Create a config with the mandatory fields and nothing else.
    pub fn new(
        variable_values: V,
        query_json: impl Into<String>,
        init_query_json: impl Into<String>,
    ) -> Self {
        CreateConfig {
            token: None,
            variable_values,
            query_json: query_json.into(),
            init_query_json: init_query_json.into(),
            fallback_init_data_json: None,
            options: SdkOptions::default(),
        }
    }

    /// Set the project token.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the fallback snapshot of flag logic.
    pub fn fallback_init_data_json(mut self, json: impl Into<String>) -> Self {
        self.fallback_init_data_json = Some(json.into());
        self
    }

    /// Replace the engine options.
    pub fn options(mut self, options: SdkOptions) -> Self {
        self.options = options;
        self
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::SdkOptions;

    fn wire(options: &SdkOptions) -> serde_json::Value {
        serde_json::to_value(options.to_wire()).unwrap()
    }

    #[test]
    fn default_options_only_carry_language() {
        assert_eq!(wire(&SdkOptions::new()), json!({"language": "rust"}));
    }

    #[test]
    fn all_options_are_serialized() {
        let options = SdkOptions::new()
            .branch_name("dev")
            .init_data_refresh_interval(Duration::from_secs(5))
            .logs_flush_interval(Duration::from_millis(1500))
            .edge_base_url("https://edge.example.com")
            .remote_logging_base_url("https://logs.example.com");

        assert_eq!(
            wire(&options),
            json!({
                "language": "rust",
                "branch_name": "dev",
                "init_data_refresh_interval_ms": 5000,
                "logs_flush_interval_ms": 1500,
                "edge_base_url": "https://edge.example.com",
                "remote_logging_base_url": "https://logs.example.com",
            })
        );
    }

    #[test]
    fn zero_intervals_are_passed_through() {
        let options = SdkOptions::new()
            .init_data_refresh_interval(Duration::ZERO)
            .logs_flush_interval(Duration::ZERO);

        assert_eq!(
            wire(&options),
            json!({
                "language": "rust",
                "init_data_refresh_interval_ms": 0,
                "logs_flush_interval_ms": 0,
            })
        );
    }

    #[test]
    fn intervals_are_truncated_to_whole_milliseconds() {
        let options = SdkOptions::new().logs_flush_interval(Duration::from_micros(2999));
        assert_eq!(wire(&options)["logs_flush_interval_ms"], json!(2));
    }
}
