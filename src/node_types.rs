//! Typed views over a [`Node`].
//!
//! Every accessor follows the same contract: `get(fallback)` evaluates the node and returns the
//! fallback whenever evaluation fails or the value has the wrong shape. A wrong shape is also
//! reported through [`Node::log_unexpected_value_error`] with the value as it was decoded.
//! Accessors never return errors, so a broken or unreachable configuration cannot take the host
//! application down with it.
use crate::{Node, Value};

/// Evaluate `node` and convert the result with `convert`.
///
/// Returns `None` (without logging) if evaluation failed, and `None` after logging if `convert`
/// rejected the value.
fn evaluate_as<T>(node: &Node, convert: impl FnOnce(&Value) -> Option<T>) -> Option<T> {
    let value = match node.evaluate() {
        Ok(value) => value,
        Err(err) => {
            log::debug!(target: "hypertune", "evaluation failed, using fallback: {err}");
            return None;
        }
    };

    let converted = convert(&value);
    if converted.is_none() {
        node.log_unexpected_value_error(&value);
    }
    converted
}

/// A boolean flag.
#[derive(Debug, Clone, Copy)]
pub struct BoolNode<'a> {
    node: &'a Node,
}

impl<'a> BoolNode<'a> {
    /// Wrap `node`.
    pub fn new(node: &'a Node) -> Self {
        BoolNode { node }
    }

    /// The flag's value, or `fallback`.
    pub fn get(&self, fallback: bool) -> bool {
        evaluate_as(self.node, Value::as_bool).unwrap_or(fallback)
    }
}

/// An integer flag. Floating point values are truncated toward zero.
#[derive(Debug, Clone, Copy)]
pub struct IntNode<'a> {
    node: &'a Node,
}

impl<'a> IntNode<'a> {
    /// Wrap `node`.
    pub fn new(node: &'a Node) -> Self {
        IntNode { node }
    }

    /// The flag's value, or `fallback`. Values outside the `i64` range saturate.
    pub fn get(&self, fallback: i64) -> i64 {
        evaluate_as(self.node, Value::as_i64).unwrap_or(fallback)
    }
}

/// A floating point flag.
#[derive(Debug, Clone, Copy)]
pub struct FloatNode<'a> {
    node: &'a Node,
}

impl<'a> FloatNode<'a> {
    /// Wrap `node`.
    pub fn new(node: &'a Node) -> Self {
        FloatNode { node }
    }

    /// The flag's value, or `fallback`.
    pub fn get(&self, fallback: f64) -> f64 {
        evaluate_as(self.node, Value::as_f64).unwrap_or(fallback)
    }
}

/// A string flag.
#[derive(Debug, Clone, Copy)]
pub struct StringNode<'a> {
    node: &'a Node,
}

impl<'a> StringNode<'a> {
    /// Wrap `node`.
    pub fn new(node: &'a Node) -> Self {
        StringNode { node }
    }

    /// The flag's value, or `fallback`.
    pub fn get(&self, fallback: impl Into<String>) -> String {
        evaluate_as(self.node, |value| value.as_str().map(str::to_owned))
            .unwrap_or_else(|| fallback.into())
    }
}

/// An enum flag restricted to a fixed set of literals.
///
/// `T` is whatever type represents the literals in calling code: `&'static str`, or a generated
/// Rust enum implementing `AsRef<str>`. The value returned by [`EnumNode::get`] is always either
/// the fallback or a clone of one of the allowed values.
///
/// # Examples
///
/// ```
/// # fn test(node: &hypertune::Node) {
/// let plan = hypertune::EnumNode::new(vec!["Free", "Pro"], node).get("Free");
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct EnumNode<'a, T> {
    node: &'a Node,
    allowed_values: Vec<T>,
}

impl<'a, T> EnumNode<'a, T>
where
    T: AsRef<str> + Clone,
{
    /// Wrap `node`, accepting only `allowed_values`.
    ///
    /// The literals must be non-empty and unique; debug builds assert this.
    pub fn new(allowed_values: impl Into<Vec<T>>, node: &'a Node) -> Self {
        let allowed_values = allowed_values.into();
        debug_assert!(
            allowed_values.iter().all(|v| !v.as_ref().is_empty()),
            "enum literals must not be empty"
        );
        debug_assert!(
            allowed_values
                .iter()
                .enumerate()
                .all(|(i, v)| !allowed_values[..i].iter().any(|w| w.as_ref() == v.as_ref())),
            "enum literals must be unique"
        );
        EnumNode {
            node,
            allowed_values,
        }
    }

    /// The literals this accessor accepts.
    pub fn allowed_values(&self) -> &[T] {
        &self.allowed_values
    }

    /// The allowed value the node evaluates to, or `fallback` when it evaluates to anything
    /// else (including the empty string).
    pub fn get(&self, fallback: T) -> T {
        evaluate_as(self.node, |value| {
            let literal = value.as_str().filter(|s| !s.is_empty())?;
            self.allowed_values
                .iter()
                .find(|allowed| allowed.as_ref() == literal)
                .cloned()
        })
        .unwrap_or(fallback)
    }
}

/// A field evaluated only for its side effects, such as logging an event.
///
/// The engine confirms success by evaluating to `true`.
#[derive(Debug, Clone, Copy)]
pub struct VoidNode<'a> {
    node: &'a Node,
}

impl<'a> VoidNode<'a> {
    /// Wrap `node`.
    pub fn new(node: &'a Node) -> Self {
        VoidNode { node }
    }

    /// Evaluate the node. Anything but `true` is reported as a value error.
    pub fn get(&self) {
        let _ = evaluate_as(self.node, |value| value.as_bool().filter(|b| *b));
    }
}
