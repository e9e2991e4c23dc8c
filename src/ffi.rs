//! [`EvaluationEngine`] over the C ABI of the prebuilt `libhypertune`.
//!
//! Declarations mirror `hypertune.h` shipped with the native library. `build.rs` puts the library
//! on the link line.
#![allow(unsafe_code)]

use std::{
    ffi::{c_char, CString},
    ptr,
};

use crate::engine::{
    CreateRequest, EvaluationEngine, IteratorHandle, IteratorStep, NodeHandle, NodeType,
    RawEvaluation, RawIterator, RawNode,
};
use crate::Value;

#[repr(C)]
#[derive(Clone, Copy)]
struct SizedString {
    bytes: *const u8,
    length: usize,
}

#[repr(C)]
#[derive(Clone, Copy)]
struct NodeResult {
    id: u32,
    error: bool,
    node_type: u32,
    enum_value: SizedString,
    object_type_name: SizedString,
}

#[repr(C)]
#[derive(Clone, Copy)]
struct NodeIteratorResult {
    id: u32,
    error: bool,
}

const NODE_ITERATOR_STATE_CONSUMED: u32 = 1;

#[repr(C)]
#[derive(Clone, Copy)]
struct NodeIteratorNextResult {
    node: NodeResult,
    error: bool,
    state: u32,
}

#[repr(C)]
#[derive(Clone, Copy)]
struct EvaluateResult {
    value: *const u8,
    length: usize,
    error: bool,
}

extern "C" {
    fn create(
        variable_values_json: *const c_char,
        fallback_init_data_json: *const c_char,
        token: *const c_char,
        init_query_json: *const c_char,
        query_json: *const c_char,
        options_json: *const c_char,
    ) -> NodeResult;
    fn node_get_field(id: u32, field: *const c_char, arguments_json: *const c_char) -> NodeResult;
    fn node_get_items(id: u32) -> NodeIteratorResult;
    fn node_iterator_next(id: u32) -> NodeIteratorNextResult;
    fn node_evaluate(id: u32) -> EvaluateResult;
    fn node_free(id: u32);
    fn node_close(id: u32);
    fn node_flush_logs(id: u32);
    fn wait_for_initialization(id: u32);
    fn node_log_unexpected_type_error(id: u32);
    fn node_log_unexpected_value_error(id: u32);
}

/// The prebuilt native evaluation engine.
///
/// Stateless: all state lives inside the native library, keyed by handle.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeEngine;

/// Copy a native sized string. Empty strings become `None`.
///
/// # Safety
///
/// `s.bytes` must point to at least `s.length` readable bytes when `s.length` is non-zero.
unsafe fn read_sized_string(s: SizedString) -> Option<String> {
    if s.length == 0 || s.bytes.is_null() {
        return None;
    }
    let bytes = std::slice::from_raw_parts(s.bytes, s.length);
    Some(String::from_utf8_lossy(bytes).into_owned())
}

/// # Safety
///
/// String fields of `result` must be valid as described in [`read_sized_string`].
unsafe fn to_raw_node(result: NodeResult) -> RawNode {
    let mut raw = RawNode {
        handle: Some(NodeHandle(result.id)),
        error: result.error,
        node_type: NodeType::from_tag(result.node_type),
        enum_value: None,
        object_type_name: None,
    };
    if !raw.error {
        raw.enum_value = read_sized_string(result.enum_value);
        raw.object_type_name = read_sized_string(result.object_type_name);
    }
    raw
}

fn c_string(what: &str, value: &str) -> Option<CString> {
    match CString::new(value) {
        Ok(s) => Some(s),
        Err(err) => {
            log::error!(target: "hypertune", "{what} contains a NUL byte at {}", err.nul_position());
            None
        }
    }
}

fn optional_ptr(value: &Option<CString>) -> *const c_char {
    value.as_ref().map_or(ptr::null(), |s| s.as_ptr())
}

impl EvaluationEngine for NativeEngine {
    fn create(&self, request: &CreateRequest) -> RawNode {
        let (Some(variable_values), Some(init_query), Some(query), Some(options)) = (
            c_string("variable values", &request.variable_values_json),
            c_string("init query", &request.init_query_json),
            c_string("query", &request.query_json),
            c_string("options", &request.options_json),
        ) else {
            return RawNode::not_issued();
        };

        let fallback = match request.fallback_init_data_json.as_deref() {
            Some(json) => match c_string("fallback init data", json) {
                Some(s) => Some(s),
                None => return RawNode::not_issued(),
            },
            None => None,
        };
        let token = match request.token.as_deref() {
            Some(token) => match c_string("token", token) {
                Some(s) => Some(s),
                None => return RawNode::not_issued(),
            },
            None => None,
        };

        // SAFETY: all pointers are either null (where the ABI allows it) or point to
        // NUL-terminated strings that outlive the call.
        unsafe {
            to_raw_node(create(
                variable_values.as_ptr(),
                optional_ptr(&fallback),
                optional_ptr(&token),
                init_query.as_ptr(),
                query.as_ptr(),
                options.as_ptr(),
            ))
        }
    }

    fn get_field(&self, node: NodeHandle, field: &str, arguments_json: &str) -> RawNode {
        let (Some(field), Some(arguments)) = (
            c_string("field name", field),
            c_string("field arguments", arguments_json),
        ) else {
            return RawNode::not_issued();
        };

        // SAFETY: both strings are NUL-terminated and outlive the call.
        unsafe { to_raw_node(node_get_field(node.0, field.as_ptr(), arguments.as_ptr())) }
    }

    fn get_items(&self, node: NodeHandle) -> RawIterator {
        // SAFETY: plain value call.
        let result = unsafe { node_get_items(node.0) };
        RawIterator {
            handle: IteratorHandle(result.id),
            error: result.error,
        }
    }

    fn iterator_next(&self, iterator: IteratorHandle) -> IteratorStep {
        // SAFETY: plain value call.
        let result = unsafe { node_iterator_next(iterator.0) };
        if result.state == NODE_ITERATOR_STATE_CONSUMED {
            return IteratorStep::Consumed;
        }
        if result.error {
            return IteratorStep::Failed;
        }
        // SAFETY: the engine returns valid sized strings for successful nodes.
        IteratorStep::Next(unsafe { to_raw_node(result.node) })
    }

    fn evaluate(&self, node: NodeHandle) -> RawEvaluation {
        // SAFETY: plain value call.
        let result = unsafe { node_evaluate(node.0) };
        if result.error {
            return RawEvaluation {
                error: true,
                bytes: Vec::new(),
            };
        }
        if result.value.is_null() || result.length == 0 {
            return RawEvaluation::default();
        }
        // SAFETY: the engine returns a buffer of `length` readable bytes, which we copy before
        // making any further call into the engine.
        let bytes = unsafe { std::slice::from_raw_parts(result.value, result.length) }.to_vec();
        RawEvaluation {
            error: false,
            bytes,
        }
    }

    fn free_node(&self, node: NodeHandle) {
        // SAFETY: plain value call.
        unsafe { node_free(node.0) }
    }

    fn close_node(&self, node: NodeHandle) {
        // SAFETY: plain value call.
        unsafe { node_close(node.0) }
    }

    fn flush_logs(&self, node: NodeHandle) {
        // SAFETY: plain value call.
        unsafe { node_flush_logs(node.0) }
    }

    fn wait_for_initialization(&self, node: NodeHandle) {
        // SAFETY: plain value call.
        unsafe { wait_for_initialization(node.0) }
    }

    fn log_unexpected_type_error(&self, node: NodeHandle) {
        // SAFETY: plain value call.
        unsafe { node_log_unexpected_type_error(node.0) }
    }

    fn log_unexpected_value_error(&self, node: NodeHandle, value: &Value) {
        // The native call takes no value; the caller already logged it.
        let _ = value;
        // SAFETY: plain value call.
        unsafe { node_log_unexpected_value_error(node.0) }
    }
}
