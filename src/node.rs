use std::{fmt, iter::FusedIterator, sync::Arc};

use serde::Serialize;

use crate::engine::{EvaluationEngine, IteratorHandle, IteratorStep, NodeHandle, NodeType, RawNode};
use crate::{Error, Result, Value};

/// A live reference into the evaluation graph of a Hypertune project.
///
/// The root node is returned by [`create()`](crate::create) (or
/// [`create_with_engine()`](crate::create_with_engine)); every other node is reached through
/// [`Node::get_field`] or [`Node::get_items`]. Generated code wraps nodes into typed accessors
/// like [`BoolNode`](crate::BoolNode).
///
/// # Errors
///
/// Navigation never fails loudly. If the engine could not resolve a field, the returned node
/// carries an error flag (see [`Node::has_error`]), and evaluating it fails, which the typed
/// accessors turn into the caller's fallback.
///
/// # Releasing handles
///
/// Each `Node` owns at most one engine handle and releases it exactly once: either explicitly via
/// [`Node::close`], or when the `Node` is dropped. A node whose inputs never reached the engine
/// (e.g. a field name containing a NUL byte) owns no handle and releases nothing. Dropping is deterministic, so scoping a node is
/// enough to release it on every exit path. A node that is leaked (e.g. with
/// [`std::mem::forget`] or through a reference cycle) is never released, and the engine keeps its
/// resources until the process exits.
pub struct Node {
    engine: Arc<dyn EvaluationEngine>,
    /// `None` for failures that never reached the engine; such nodes own nothing.
    handle: Option<NodeHandle>,
    error: bool,
    node_type: NodeType,
    enum_value: Option<String>,
    object_type_name: Option<String>,
    /// Set by `close()` so that `drop()` doesn't release the handle a second time.
    closed: bool,
}

impl Node {
    pub(crate) fn new(engine: Arc<dyn EvaluationEngine>, raw: RawNode) -> Node {
        let RawNode {
            handle,
            error,
            node_type,
            enum_value,
            object_type_name,
        } = raw;

        // Metadata of a failed node is meaningless.
        let (enum_value, object_type_name) = if error {
            (None, None)
        } else {
            (enum_value, object_type_name)
        };

        Node {
            engine,
            handle,
            error,
            node_type,
            enum_value,
            object_type_name,
            closed: false,
        }
    }

    /// Returns `true` if the engine failed to produce this node.
    pub fn has_error(&self) -> bool {
        self.error
    }

    /// Declared type of this node.
    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    /// Enum literal of this node, if it is an enum.
    pub fn enum_value(&self) -> Option<&str> {
        self.enum_value.as_deref()
    }

    /// Schema type name of this node, if it is an object.
    pub fn object_type_name(&self) -> Option<&str> {
        self.object_type_name.as_deref()
    }

    /// Navigate to the field `field`, passing `arguments` serialized as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encode`] if `arguments` cannot be serialized. Failure to resolve the
    /// field is reported through [`Node::has_error`] on the returned node instead.
    ///
    /// # Examples
    ///
    /// ```
    /// # use serde_json::json;
    /// # fn test(root: &hypertune::Node) -> hypertune::Result<()> {
    /// let flag = root.get_field("showNewEditor", &json!({}))?;
    /// let enabled = hypertune::BoolNode::new(&flag).get(false);
    /// # Ok(())
    /// # }
    /// ```
    pub fn get_field<A>(&self, field: &str, arguments: &A) -> Result<Node>
    where
        A: Serialize + ?Sized,
    {
        let arguments_json =
            serde_json::to_string(arguments).map_err(|err| Error::encode("field arguments", err))?;
        Ok(self.get_field_with_json_arguments(field, &arguments_json))
    }

    /// Navigate to the field `field` with already serialized arguments.
    pub fn get_field_with_json_arguments(&self, field: &str, arguments_json: &str) -> Node {
        let raw = match self.handle {
            Some(handle) => self.engine.get_field(handle, field, arguments_json),
            None => RawNode::not_issued(),
        };
        if raw.error {
            log::debug!(target: "hypertune", "failed to get field {field:?}");
        }
        Node::new(self.engine.clone(), raw)
    }

    /// Lazily iterate the items of a list node.
    ///
    /// The returned iterator walks a single cursor inside the engine: it is forward-only and
    /// cannot be restarted. Call `get_items()` again for another pass. Iteration stops at the
    /// end of the list and also on the first engine error.
    pub fn get_items(&self) -> NodeItems<'_> {
        let iterator = self.handle.and_then(|handle| {
            let raw = self.engine.get_items(handle);
            if raw.error {
                log::debug!(target: "hypertune", "failed to get items");
                None
            } else {
                Some(raw.handle)
            }
        });
        NodeItems {
            node: self,
            iterator,
        }
    }

    /// Resolve this node to a concrete value.
    ///
    /// Returns [`Value::Absent`] if the engine produced no value.
    ///
    /// # Errors
    ///
    /// - [`Error::Evaluation`] if the engine flagged the evaluation as failed.
    /// - [`Error::Decode`] if the engine produced bytes that are not valid JSON.
    pub fn evaluate(&self) -> Result<Value> {
        let Some(handle) = self.handle else {
            return Err(Error::Evaluation);
        };
        let result = self.engine.evaluate(handle);
        if result.error {
            return Err(Error::Evaluation);
        }
        Value::from_bytes(&result.bytes)
    }

    /// Report that this node's type doesn't match what the calling code expected.
    pub fn log_unexpected_type_error(&self) {
        log::warn!(target: "hypertune", "unexpected type {:?}", self.node_type);
        if let Some(handle) = self.handle {
            self.engine.log_unexpected_type_error(handle);
        }
    }

    /// Report that `value`, as decoded from this node, doesn't match what the calling code
    /// expected.
    pub fn log_unexpected_value_error(&self, value: &Value) {
        log::warn!(target: "hypertune", value:serde; "unexpected value for {:?} node", self.node_type);
        if let Some(handle) = self.handle {
            self.engine.log_unexpected_value_error(handle, value);
        }
    }

    /// Block until the engine has its first configuration snapshot.
    ///
    /// There is no timeout. If you need one, call this from a separate thread and stop waiting
    /// for it after your deadline.
    pub fn wait_for_initialization(&self) {
        if let Some(handle) = self.handle {
            self.engine.wait_for_initialization(handle);
        }
    }

    /// Send buffered log events now. Blocks until done.
    pub fn flush_logs(&self) {
        if let Some(handle) = self.handle {
            self.engine.flush_logs(handle);
        }
    }

    /// Close this node, releasing its handle now.
    ///
    /// Dropping the node releases the handle as well, so there's no need to call `close()` on
    /// nodes that go out of scope anyway. Calling it on the root node makes the shutdown point
    /// explicit.
    pub fn close(mut self) {
        if let Some(handle) = self.handle {
            self.engine.close_node(handle);
        }
        self.closed = true;
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        if let (false, Some(handle)) = (self.closed, self.handle) {
            self.engine.free_node(handle);
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("handle", &self.handle)
            .field("error", &self.error)
            .field("node_type", &self.node_type)
            .field("enum_value", &self.enum_value)
            .field("object_type_name", &self.object_type_name)
            .finish()
    }
}

/// Iterator over the items of a list node. See [`Node::get_items`].
pub struct NodeItems<'a> {
    node: &'a Node,
    /// `None` once the cursor is exhausted or failed.
    iterator: Option<IteratorHandle>,
}

impl<'a> Iterator for NodeItems<'a> {
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        let iterator = self.iterator?;
        match self.node.engine.iterator_next(iterator) {
            IteratorStep::Next(raw) => Some(Node::new(self.node.engine.clone(), raw)),
            IteratorStep::Failed => {
                log::debug!(target: "hypertune", "failed to get next item");
                self.iterator = None;
                None
            }
            IteratorStep::Consumed => {
                self.iterator = None;
                None
            }
        }
    }
}

impl<'a> FusedIterator for NodeItems<'a> {}
