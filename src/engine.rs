//! The boundary between the SDK and the evaluation engine.
//!
//! Flag evaluation itself (query parsing, configuration refresh, remote logging) happens inside
//! the prebuilt `libhypertune` engine. [`EvaluationEngine`] describes the narrow, handle-based
//! surface the SDK needs from it, so the rest of the crate can be written and tested against any
//! implementation. The `native` feature provides [`NativeEngine`](crate::NativeEngine), which
//! forwards every call over the C ABI.
//!
//! None of the operations return `Result`: the engine reports failures through the `error` flag
//! of the returned records, and callers check it before using the result.

/// Opaque reference to a node living inside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle(pub u32);

/// Opaque reference to an item cursor living inside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IteratorHandle(pub u32);

/// Declared type of a node in the project's schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// A string field.
    String,
    /// An enum field. Its value is one of the enum's literals.
    Enum,
    /// An integer field.
    Int,
    /// A floating point field.
    Float,
    /// A boolean field.
    Bool,
    /// An object; see [`Node::object_type_name`](crate::Node::object_type_name).
    Object,
    /// A void field, evaluated for its side effects (e.g. event logging).
    Void,
    /// Anything the engine reports that this SDK doesn't know about.
    Unknown,
}

impl NodeType {
    /// Returns `true` for node types whose value is a string.
    pub fn is_string(self) -> bool {
        matches!(self, NodeType::String | NodeType::Enum)
    }

    /// Returns `true` for node types whose value is a number.
    pub fn is_number(self) -> bool {
        matches!(self, NodeType::Int | NodeType::Float)
    }

    /// Map the engine's numeric type tag.
    pub fn from_tag(tag: u32) -> NodeType {
        match tag {
            0 => NodeType::String,
            1 => NodeType::Enum,
            2 => NodeType::Int,
            3 => NodeType::Float,
            4 => NodeType::Bool,
            5 => NodeType::Object,
            6 => NodeType::Void,
            _ => NodeType::Unknown,
        }
    }
}

/// A node as returned by the engine from construction, field access, or iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct RawNode {
    /// Handle issued by the engine. `None` if the adapter failed before reaching the engine, in
    /// which case there is nothing to release.
    pub handle: Option<NodeHandle>,
    /// Set when the engine failed to produce the node.
    pub error: bool,
    /// Declared type of the node.
    pub node_type: NodeType,
    /// Literal of an enum node. Only populated when `error` is `false`.
    pub enum_value: Option<String>,
    /// Schema type name of an object node. Only populated when `error` is `false`.
    pub object_type_name: Option<String>,
}

impl RawNode {
    /// An error-flagged node the engine issued `handle` for.
    pub fn failed(handle: NodeHandle) -> RawNode {
        RawNode {
            handle: Some(handle),
            ..RawNode::not_issued()
        }
    }

    /// An error-flagged node that never reached the engine, e.g. because an input could not be
    /// passed across the ABI.
    pub fn not_issued() -> RawNode {
        RawNode {
            handle: None,
            error: true,
            node_type: NodeType::Unknown,
            enum_value: None,
            object_type_name: None,
        }
    }
}

/// An item cursor as returned by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawIterator {
    /// Cursor handle. Meaningless when `error` is set.
    pub handle: IteratorHandle,
    /// Set when the engine could not open a cursor.
    pub error: bool,
}

/// Outcome of advancing an item cursor.
#[derive(Debug, Clone, PartialEq)]
pub enum IteratorStep {
    /// The next item.
    Next(RawNode),
    /// The engine failed to produce the next item.
    Failed,
    /// The cursor has no more items.
    Consumed,
}

/// Bytes produced by evaluating a node. An empty buffer means "no value".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawEvaluation {
    /// Set when the engine failed to evaluate the node.
    pub error: bool,
    /// UTF-8 JSON, owned by the caller.
    pub bytes: Vec<u8>,
}

/// Everything the engine needs to build the root node, already serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    /// Variable bindings for the runtime query.
    pub variable_values_json: String,
    /// Static snapshot of flag logic, if any.
    pub fallback_init_data_json: Option<String>,
    /// Project token, if any.
    pub token: Option<String>,
    /// The initialization query document.
    pub init_query_json: String,
    /// The runtime query document.
    pub query_json: String,
    /// Engine options, see [`SdkOptions`](crate::SdkOptions).
    pub options_json: String,
}

/// The operations the SDK needs from an evaluation engine.
///
/// Handles passed in must have been returned by the same engine and not yet released with
/// [`free_node`](EvaluationEngine::free_node) or [`close_node`](EvaluationEngine::close_node).
/// What happens otherwise is up to the implementation.
pub trait EvaluationEngine: Send + Sync {
    /// Build the root node. Blocks until the engine has processed the request.
    fn create(&self, request: &CreateRequest) -> RawNode;

    /// Navigate to a field of `node`. `arguments_json` is a JSON object.
    fn get_field(&self, node: NodeHandle, field: &str, arguments_json: &str) -> RawNode;

    /// Open a cursor over the items of a list node.
    fn get_items(&self, node: NodeHandle) -> RawIterator;

    /// Advance a cursor opened by [`get_items`](EvaluationEngine::get_items).
    fn iterator_next(&self, iterator: IteratorHandle) -> IteratorStep;

    /// Evaluate `node` to JSON bytes.
    fn evaluate(&self, node: NodeHandle) -> RawEvaluation;

    /// Release a handle that was not closed explicitly.
    fn free_node(&self, node: NodeHandle);

    /// Explicitly close a handle.
    fn close_node(&self, node: NodeHandle);

    /// Emit buffered log events now. Blocks until done.
    fn flush_logs(&self, node: NodeHandle);

    /// Block until the first configuration snapshot is ready. There is no timeout.
    fn wait_for_initialization(&self, node: NodeHandle);

    /// Report a type mismatch detected by the caller.
    fn log_unexpected_type_error(&self, node: NodeHandle);

    /// Report a value mismatch detected by the caller.
    ///
    /// `value` is the decoded value that failed to match the expected type.
    fn log_unexpected_value_error(&self, node: NodeHandle, value: &crate::Value);
}
