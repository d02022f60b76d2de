//! Core abstractions for pom.xml editing.
//!
//! This crate provides the pieces the editing layer runs against:
//!
//! - [`Document`]: a whitespace-preserving XML tree with exact round-trip
//!   serialization
//! - [`Formatter`]: re-indentation of inserted subtrees
//! - [`SharedModel`]: a reference-counted document with dirty tracking, undo
//!   history and change listeners
//! - [`ModelProvider`] / [`ModelManager`]: acquisition and release of shared
//!   models per file
//! - [`PomError`]: the error type used across the workspace

pub mod config;
pub mod dom;
pub mod error;
pub mod formatter;
pub mod manager;
pub mod model;
pub mod parser;
pub mod writer;

pub use config::{EditConfig, FormatConfig};
pub use dom::{Attribute, Document, ElementData, NodeId, NodeKind};
pub use error::{PomError, Result, WorkItemFailure};
pub use formatter::{Formatter, NoopFormatter, XmlFormatter};
pub use manager::{ModelManager, ModelProvider};
pub use model::{FileHandle, ModelListener, SharedModel};
