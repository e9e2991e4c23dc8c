//! The Rust SDK for Hypertune, a feature flag, A/B testing and app configuration platform.
//!
//! # Overview
//!
//! Flag logic is evaluated locally by the Hypertune evaluation engine, a prebuilt native library
//! that fetches your project's logic, keeps it up to date in the background, and sends evaluation
//! logs back to Hypertune. This crate is a thin, safe layer over that engine.
//!
//! [`create()`] builds the root [`Node`] of your project from your runtime query, initialization
//! query, and variable values. From there, [`Node::get_field`] and [`Node::get_items`] navigate
//! the evaluation graph, and typed accessors turn nodes into Rust values:
//! - [`BoolNode`]
//! - [`IntNode`]
//! - [`FloatNode`]
//! - [`StringNode`]
//! - [`EnumNode`]
//! - [`VoidNode`]
//!
//! In practice you rarely call these directly: `hypertune-gen` generates a typed client for your
//! project on top of them.
//!
//! # Evaluation engine
//!
//! The native engine is linked with the `native` feature, which also enables [`create()`].
//! Everything else in this crate is written against the [`EvaluationEngine`] trait, and
//! [`create_with_engine()`] accepts any implementation of it.
//!
//! # Error Handling
//!
//! Typed accessors never fail: every `get()` takes a fallback that is returned whenever the
//! value cannot be determined (the engine failed, the flag doesn't exist, or the value has an
//! unexpected type). Type mismatches are reported to Hypertune through the engine, so they show up
//! in your project's logs rather than in your application.
//!
//! [`Error`] is only returned where this crate itself serializes or deserializes JSON.
//!
//! # Releasing resources
//!
//! Each [`Node`] owns an engine handle that is released when the node is dropped or explicitly
//! [closed](Node::close). Keep nodes scoped; a leaked node keeps its engine resources alive.
//!
//! # Logging
//!
//! The package uses the [`log`](https://docs.rs/log/latest/log/) crate for logging messages
//! under the `hypertune` target. Consider integrating a `log`-compatible logger implementation
//! for better visibility into SDK operations.

#![warn(rustdoc::missing_crate_level_docs)]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod engine;

mod config;
mod error;
#[cfg(feature = "native")]
mod ffi;
mod node;
mod node_types;
mod sdk;
#[cfg(test)]
mod testing;
mod value;

pub use config::{CreateConfig, SdkOptions};
pub use engine::{EvaluationEngine, NodeType};
pub use error::{Error, Result};
#[cfg(feature = "native")]
pub use ffi::NativeEngine;
pub use node::{Node, NodeItems};
pub use node_types::{BoolNode, EnumNode, FloatNode, IntNode, StringNode, VoidNode};
#[cfg(feature = "native")]
pub use sdk::create;
pub use sdk::create_with_engine;
pub use value::Value;

/// Language tag this SDK reports to the engine and to the codegen service.
pub const LANGUAGE: &str = "rust";

/// Name of this crate, as it appears in `Cargo.toml` dependency tables.
pub const SDK_NAME: &str = env!("CARGO_PKG_NAME");
