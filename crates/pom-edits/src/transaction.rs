//! Applying work items to shared models.
//!
//! Every work item runs through the same cycle:
//!
//! 1. acquire the model for the item's file
//! 2. notify listeners that the model is about to change and open an undo
//!    boundary
//! 3. run the operation
//! 4. close the undo boundary and notify listeners that the model changed,
//!    whether or not the operation succeeded
//! 5. save the model if it is dirty and the runner is its only holder
//! 6. release the model
//!
//! A failing item does not stop the batch. All failures are collected and
//! returned together once every item has been attempted.

use crate::editor::PomEditor;
use crate::operation::WorkItem;
use pom_core::{
    FileHandle, Formatter, ModelProvider, PomError, Result, SharedModel, WorkItemFailure,
};
use std::sync::Arc;

/// Runs work items against models obtained from a [`ModelProvider`].
pub struct TransactionRunner<'a> {
    provider: &'a dyn ModelProvider,
    formatter: &'a dyn Formatter,
}

impl std::fmt::Debug for TransactionRunner<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionRunner").finish_non_exhaustive()
    }
}

/// A model held for the duration of one work item. Released on drop.
struct ModelLease<'a> {
    provider: &'a dyn ModelProvider,
    model: Arc<SharedModel>,
}

impl Drop for ModelLease<'_> {
    fn drop(&mut self) {
        self.provider.release_from_edit(&self.model);
    }
}

/// An open undo boundary. Closed on drop, followed by the change
/// notification.
struct Recording<'a>(&'a SharedModel);

impl<'a> Recording<'a> {
    fn begin(model: &'a SharedModel) -> Self {
        model.about_to_change();
        model.begin_recording(&format!("Edit {}", model.file()));
        Self(model)
    }
}

impl Drop for Recording<'_> {
    fn drop(&mut self) {
        self.0.end_recording();
        self.0.changed();
    }
}

impl<'a> TransactionRunner<'a> {
    pub fn new(provider: &'a dyn ModelProvider, formatter: &'a dyn Formatter) -> Self {
        Self {
            provider,
            formatter,
        }
    }

    /// Applies `items` in order.
    ///
    /// Items are independent: each one acquires, edits, saves and releases
    /// its own model, even when several items target the same file.
    ///
    /// # Arguments
    ///
    /// * `items` - Work items, applied in slice order
    ///
    /// # Errors
    ///
    /// Returns `PomError::WorkItems` listing every failure, in order, if any
    /// item failed. Each failure is one of:
    ///
    /// - `PomError::ModelAcquisition` - The item's file could not be loaded;
    ///   the item was skipped
    /// - `PomError::Operation` - The operation returned an error; changes it
    ///   made before failing are kept
    /// - `PomError::Persistence` - The model could not be saved
    ///
    /// An item whose operation failed and whose model then could not be saved
    /// contributes both errors.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use pom_core::{FileHandle, ModelManager, XmlFormatter};
    /// use pom_edits::{TransactionRunner, WorkItem, add_dependency};
    ///
    /// # fn example() -> pom_core::Result<()> {
    /// let manager = ModelManager::new();
    /// let formatter = XmlFormatter::default();
    /// let runner = TransactionRunner::new(&manager, &formatter);
    /// runner.apply_all(&[WorkItem::new(
    ///     FileHandle::new("pom.xml")?,
    ///     add_dependency("junit:junit:4.13.2".parse()?),
    /// )])?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn apply_all(&self, items: &[WorkItem]) -> Result<()> {
        let mut failures = Vec::new();
        for (index, item) in items.iter().enumerate() {
            tracing::debug!("Applying work item #{} to {}", index, item.file());
            for error in self.apply(item) {
                tracing::error!("Work item #{} on {} failed: {}", index, item.file(), error);
                failures.push(WorkItemFailure {
                    index,
                    file: item.file().clone(),
                    error,
                });
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(PomError::WorkItems {
                total: items.len(),
                failures,
            })
        }
    }

    fn acquire(&self, file: &FileHandle) -> Result<ModelLease<'a>> {
        let model = self
            .provider
            .acquire_for_edit(file)
            .map_err(|error| match error {
                PomError::ModelAcquisition { .. } => error,
                other => PomError::ModelAcquisition {
                    file: file.clone(),
                    source: Box::new(other),
                },
            })?;
        Ok(ModelLease {
            provider: self.provider,
            model,
        })
    }

    fn apply(&self, item: &WorkItem) -> Vec<PomError> {
        let file = item.file();
        let lease = match self.acquire(file) {
            Ok(lease) => lease,
            Err(error) => return vec![error],
        };
        let model = &lease.model;
        let mut errors = Vec::new();

        let outcome = {
            let _recording = Recording::begin(model);
            model.edit(|document| {
                let mut editor = PomEditor::new(document, self.formatter);
                item.operation().process(&mut editor)
            })
        };
        if let Err(source) = outcome {
            errors.push(PomError::Operation {
                file: file.clone(),
                source: Box::new(source),
            });
        }

        if model.is_dirty() {
            let references = model.reference_count();
            if references == 1 {
                if let Err(error) = model.save() {
                    errors.push(error);
                }
            } else {
                tracing::debug!(
                    "Leaving {} unsaved, still held by {} other holder(s)",
                    file,
                    references - 1
                );
            }
        }

        drop(lease);
        errors
    }
}
