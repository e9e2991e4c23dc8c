//! An in-memory [`EvaluationEngine`] that replays a scripted graph and records every call.
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use crate::engine::{
    CreateRequest, EvaluationEngine, IteratorHandle, IteratorStep, NodeHandle, NodeType,
    RawEvaluation, RawIterator, RawNode,
};
use crate::{Node, Value};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Create(CreateRequest),
    GetField {
        field: String,
        arguments_json: String,
    },
    GetItems(NodeHandle),
    Evaluate(NodeHandle),
    Free(NodeHandle),
    Close(NodeHandle),
    FlushLogs(NodeHandle),
    WaitForInitialization(NodeHandle),
    LogUnexpectedType(NodeHandle),
    LogUnexpectedValue(NodeHandle, Value),
}

#[derive(Debug, Clone)]
pub(crate) struct ScriptedNode {
    node_type: NodeType,
    error: bool,
    enum_value: Option<String>,
    object_type_name: Option<String>,
    evaluation: RawEvaluation,
    fields: HashMap<String, NodeHandle>,
    items: Option<Vec<NodeHandle>>,
    fail_iteration_at: Option<usize>,
}

impl ScriptedNode {
    pub(crate) fn evaluating(bytes: &[u8]) -> ScriptedNode {
        ScriptedNode {
            node_type: NodeType::Unknown,
            error: false,
            enum_value: None,
            object_type_name: None,
            evaluation: RawEvaluation {
                error: false,
                bytes: bytes.to_vec(),
            },
            fields: HashMap::new(),
            items: None,
            fail_iteration_at: None,
        }
    }

    pub(crate) fn evaluation_error() -> ScriptedNode {
        let mut node = ScriptedNode::evaluating(b"");
        node.evaluation.error = true;
        node
    }

    pub(crate) fn object(type_name: &str) -> ScriptedNode {
        let mut node = ScriptedNode::evaluating(b"{}");
        node.node_type = NodeType::Object;
        node.object_type_name = Some(type_name.to_owned());
        node
    }

    pub(crate) fn enum_literal(literal: &str) -> ScriptedNode {
        let mut node = ScriptedNode::evaluating(format!("{literal:?}").as_bytes());
        node.node_type = NodeType::Enum;
        node.enum_value = Some(literal.to_owned());
        node
    }

    pub(crate) fn list(items: Vec<NodeHandle>) -> ScriptedNode {
        let mut node = ScriptedNode::evaluating(b"");
        node.items = Some(items);
        node
    }

    /// Make the engine report this node as failed.
    pub(crate) fn failed(mut self) -> ScriptedNode {
        self.error = true;
        self
    }

    pub(crate) fn field(mut self, name: &str, child: NodeHandle) -> ScriptedNode {
        self.fields.insert(name.to_owned(), child);
        self
    }

    pub(crate) fn fail_iteration_at(mut self, position: usize) -> ScriptedNode {
        self.fail_iteration_at = Some(position);
        self
    }
}

#[derive(Default)]
struct Script {
    nodes: Vec<ScriptedNode>,
    root: Option<NodeHandle>,
    /// Node and position of every cursor handed out.
    cursors: Vec<(NodeHandle, usize)>,
    calls: Vec<Call>,
}

impl Script {
    fn get(&self, handle: NodeHandle) -> Option<&ScriptedNode> {
        let index = usize::try_from(handle.0).ok()?.checked_sub(1)?;
        self.nodes.get(index)
    }

    fn raw(&self, handle: NodeHandle) -> RawNode {
        match self.get(handle) {
            Some(node) => RawNode {
                handle: Some(handle),
                error: node.error,
                node_type: node.node_type,
                enum_value: node.enum_value.clone(),
                object_type_name: node.object_type_name.clone(),
            },
            None => RawNode::failed(handle),
        }
    }

    /// Issue a fresh handle for a node the engine failed to produce.
    fn issue_failed(&mut self) -> RawNode {
        self.nodes.push(ScriptedNode::evaluation_error().failed());
        RawNode::failed(NodeHandle(self.nodes.len() as u32))
    }
}

/// Cloning shares the script, so the test keeps observing calls made through nodes.
#[derive(Clone, Default)]
pub(crate) struct ScriptedEngine(Arc<Mutex<Script>>);

impl ScriptedEngine {
    pub(crate) fn new() -> ScriptedEngine {
        ScriptedEngine::default()
    }

    /// Register a node. Handles start at 1.
    pub(crate) fn add_node(&self, node: ScriptedNode) -> NodeHandle {
        let mut script = self.0.lock().unwrap();
        script.nodes.push(node);
        NodeHandle(script.nodes.len() as u32)
    }

    pub(crate) fn set_root(&self, root: NodeHandle) {
        self.0.lock().unwrap().root = Some(root);
    }

    /// Wrap a registered node the way the engine would hand it out.
    pub(crate) fn node(&self, handle: NodeHandle) -> Node {
        let raw = self.0.lock().unwrap().raw(handle);
        Node::new(Arc::new(self.clone()), raw)
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().calls.clone()
    }

    /// `Free` and `Close` calls made for `handle`.
    pub(crate) fn released(&self, handle: NodeHandle) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Free(h) | Call::Close(h) if *h == handle))
            .collect()
    }

    /// Values reported through `log_unexpected_value_error` for `handle`.
    pub(crate) fn value_errors(&self, handle: NodeHandle) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::LogUnexpectedValue(h, value) if h == handle => Some(value),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.0.lock().unwrap().calls.push(call);
    }
}

impl EvaluationEngine for ScriptedEngine {
    fn create(&self, request: &CreateRequest) -> RawNode {
        let mut script = self.0.lock().unwrap();
        script.calls.push(Call::Create(request.clone()));
        match script.root {
            Some(root) => script.raw(root),
            None => script.issue_failed(),
        }
    }

    fn get_field(&self, node: NodeHandle, field: &str, arguments_json: &str) -> RawNode {
        // Like the native adapter, which cannot pass interior NULs across the ABI.
        if field.contains('\0') || arguments_json.contains('\0') {
            return RawNode::not_issued();
        }
        let mut script = self.0.lock().unwrap();
        script.calls.push(Call::GetField {
            field: field.to_owned(),
            arguments_json: arguments_json.to_owned(),
        });
        match script.get(node).and_then(|n| n.fields.get(field)).copied() {
            Some(child) => script.raw(child),
            None => script.issue_failed(),
        }
    }

    fn get_items(&self, node: NodeHandle) -> RawIterator {
        let mut script = self.0.lock().unwrap();
        script.calls.push(Call::GetItems(node));
        let is_list = script.get(node).is_some_and(|n| n.items.is_some());
        if !is_list {
            return RawIterator {
                handle: IteratorHandle(0),
                error: true,
            };
        }
        script.cursors.push((node, 0));
        RawIterator {
            handle: IteratorHandle(script.cursors.len() as u32 - 1),
            error: false,
        }
    }

    fn iterator_next(&self, iterator: IteratorHandle) -> IteratorStep {
        let mut script = self.0.lock().unwrap();
        let Some(&(node, position)) = script.cursors.get(iterator.0 as usize) else {
            return IteratorStep::Failed;
        };
        let Some(scripted) = script.get(node) else {
            return IteratorStep::Failed;
        };
        if scripted.fail_iteration_at == Some(position) {
            return IteratorStep::Failed;
        }
        let items = scripted.items.as_deref().unwrap_or_default();
        let Some(&item) = items.get(position) else {
            return IteratorStep::Consumed;
        };
        script.cursors[iterator.0 as usize].1 += 1;
        IteratorStep::Next(script.raw(item))
    }

    fn evaluate(&self, node: NodeHandle) -> RawEvaluation {
        let mut script = self.0.lock().unwrap();
        script.calls.push(Call::Evaluate(node));
        match script.get(node) {
            Some(scripted) if !scripted.error => scripted.evaluation.clone(),
            _ => RawEvaluation {
                error: true,
                bytes: Vec::new(),
            },
        }
    }

    fn free_node(&self, node: NodeHandle) {
        self.record(Call::Free(node));
    }

    fn close_node(&self, node: NodeHandle) {
        self.record(Call::Close(node));
    }

    fn flush_logs(&self, node: NodeHandle) {
        self.record(Call::FlushLogs(node));
    }

    fn wait_for_initialization(&self, node: NodeHandle) {
        self.record(Call::WaitForInitialization(node));
    }

    fn log_unexpected_type_error(&self, node: NodeHandle) {
        self.record(Call::LogUnexpectedType(node));
    }

    fn log_unexpected_value_error(&self, node: NodeHandle, value: &Value) {
        self.record(Call::LogUnexpectedValue(node, value.clone()));
    }
}
