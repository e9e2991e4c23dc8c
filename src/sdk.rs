use std::sync::Arc;

use serde::Serialize;

use crate::engine::{CreateRequest, EvaluationEngine};
use crate::{CreateConfig, Error, Node, Result};

/// Create the root [`Node`] using the native evaluation engine.
///
/// The call blocks while the engine processes the configuration, but it doesn't wait for flag
/// logic to be fetched. Use [`Node::wait_for_initialization`] for that.
///
/// # Errors
///
/// Returns [`Error::Encode`] if variable values or options cannot be serialized. Failures inside
/// the engine are reported through [`Node::has_error`] on the returned node instead.
///
/// # Examples
///
/// ```no_run
/// # use hypertune::{CreateConfig, SdkOptions};
/// # fn test(query_json: &str, init_query_json: &str) -> hypertune::Result<()> {
/// let root = hypertune::create(
///     CreateConfig::new(serde_json::json!({"user": {"id": "u1"}}), query_json, init_query_json)
///         .token("token")
///         .options(SdkOptions::new().branch_name("main")),
/// )?;
/// root.wait_for_initialization();
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "native")]
pub fn create<V: Serialize>(config: CreateConfig<V>) -> Result<Node> {
    create_with_engine(Arc::new(crate::NativeEngine), config)
}

/// Create the root [`Node`] using `engine`.
///
/// Same as [`create()`](crate::create), but lets the caller supply the
/// [`EvaluationEngine`], e.g. a test double.
pub fn create_with_engine<V: Serialize>(
    engine: Arc<dyn EvaluationEngine>,
    config: CreateConfig<V>,
) -> Result<Node> {
    let options_json = serde_json::to_string(&config.options.to_wire())
        .map_err(|err| Error::encode("sdk options", err))?;
    let variable_values_json = serde_json::to_string(&config.variable_values)
        .map_err(|err| Error::encode("variable values", err))?;

    let request = CreateRequest {
        variable_values_json,
        fallback_init_data_json: config.fallback_init_data_json,
        token: config.token,
        init_query_json: config.init_query_json,
        query_json: config.query_json,
        options_json,
    };

    log::debug!(target: "hypertune", "creating root node");
    let raw = engine.create(&request);
    if raw.error {
        log::warn!(target: "hypertune", "failed to create root node");
    }

    Ok(Node::new(engine, raw))
}
