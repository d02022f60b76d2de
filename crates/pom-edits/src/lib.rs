//! Transactional, formatting-preserving pom.xml edits.
//!
//! Edits are written as [`Operation`]s against a [`PomEditor`], bound to a
//! file with [`WorkItem`] and applied by a [`TransactionRunner`]:
//!
//! ```no_run
//! use pom_core::{FileHandle, ModelManager, XmlFormatter};
//! use pom_edits::{CompoundOperation, TransactionRunner, WorkItem, add_dependency, remove_dependency};
//!
//! # fn main() -> pom_core::Result<()> {
//! let manager = ModelManager::new();
//! let formatter = XmlFormatter::default();
//! let runner = TransactionRunner::new(&manager, &formatter);
//!
//! let upgrade = CompoundOperation::default()
//!     .then(remove_dependency("junit:junit".parse()?))
//!     .then(add_dependency("org.junit.jupiter:junit-jupiter:5.10.2".parse()?));
//! runner.apply_all(&[WorkItem::new(FileHandle::new("pom.xml")?, upgrade)])?;
//! # Ok(())
//! # }
//! ```

mod builder;
pub mod editor;
mod mutators;
mod navigator;
pub mod operation;
pub mod transaction;
pub mod types;

pub use editor::PomEditor;
pub use operation::{
    CompoundOperation, FnOperation, Operation, WorkItem, add_dependency, add_managed_dependency,
    add_plugin, from_fn, remove_dependency,
};
pub use transaction::TransactionRunner;
pub use types::Coordinates;
