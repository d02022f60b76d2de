//! Acquisition and release of shared models.
//!
//! A [`ModelProvider`] hands out one [`SharedModel`] per file, loading it
//! from disk on first acquisition and dropping it once the last holder has
//! released it. Every holder sees the same in-memory document, so a model
//! acquired while an editor keeps the file open reports a reference count
//! above one.

use crate::config::EditConfig;
use crate::dom::Document;
use crate::error::{PomError, Result};
use crate::model::{FileHandle, SharedModel};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

/// Source of shared models for edit transactions.
pub trait ModelProvider: Send + Sync {
    /// Returns the model for `file`, creating it if it is not resident, and
    /// increments its reference count.
    ///
    /// # Arguments
    ///
    /// * `file` - The pom.xml to edit
    ///
    /// # Returns
    ///
    /// * `Ok(Arc<SharedModel>)` - The model, shared with every other holder
    ///   of `file`
    /// * `Err(PomError)` - The model could not be created
    ///
    /// # Errors
    ///
    /// - `PomError::ModelAcquisition` - The file is missing, too large,
    ///   unreadable or not well-formed XML
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use pom_core::{FileHandle, ModelManager, ModelProvider};
    ///
    /// # fn example() -> pom_core::Result<()> {
    /// let manager = ModelManager::new();
    /// let model = manager.acquire_for_edit(&FileHandle::new("pom.xml")?)?;
    /// println!("{} holder(s)", model.reference_count());
    /// manager.release_from_edit(&model);
    /// # Ok(())
    /// # }
    /// ```
    fn acquire_for_edit(&self, file: &FileHandle) -> Result<Arc<SharedModel>>;

    /// Gives back a model obtained from [`acquire_for_edit`](Self::acquire_for_edit).
    ///
    /// Once the last holder has released it, the model is torn down and the
    /// next acquisition loads the file again. Unsaved changes are lost.
    fn release_from_edit(&self, model: &Arc<SharedModel>);
}

/// Model registry keyed by file.
#[derive(Debug, Default)]
pub struct ModelManager {
    models: DashMap<FileHandle, Arc<SharedModel>>,
    config: EditConfig,
}

impl ModelManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EditConfig) -> Self {
        Self {
            models: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &EditConfig {
        &self.config
    }

    /// Resident model for `file`, without taking a reference.
    pub fn existing_model(&self, file: &FileHandle) -> Option<Arc<SharedModel>> {
        self.models.get(file).map(|m| Arc::clone(m.value()))
    }

    /// Number of resident models.
    pub fn open_models(&self) -> usize {
        self.models.len()
    }

    fn load(&self, file: &FileHandle) -> Result<Document> {
        let path = file.path();
        tracing::debug!("Loading model from disk: {:?}", path);

        let metadata = std::fs::metadata(path).map_err(|e| {
            tracing::debug!("Failed to read metadata for {:?}: {}", path, e);
            PomError::Io(e)
        })?;
        let size = metadata.len();

        if size > self.config.max_file_size {
            tracing::error!(
                "pom.xml exceeds maximum size: {} bytes (limit: {} bytes)",
                size,
                self.config.max_file_size
            );
            return Err(PomError::Io(std::io::Error::new(
                std::io::ErrorKind::FileTooLarge,
                format!(
                    "file too large: {} bytes (max: {} bytes)",
                    size, self.config.max_file_size
                ),
            )));
        }
        if size > self.config.large_file_warning {
            tracing::warn!(
                "pom.xml is very large: {} bytes. This may impact performance.",
                size
            );
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            tracing::debug!("Failed to read file {:?}: {}", path, e);
            PomError::Io(e)
        })?;
        let document = Document::parse(&content)?;

        tracing::debug!("Loaded model: {:?} ({} bytes)", path, content.len());
        Ok(document)
    }
}

impl ModelProvider for ModelManager {
    fn acquire_for_edit(&self, file: &FileHandle) -> Result<Arc<SharedModel>> {
        match self.models.entry(file.clone()) {
            Entry::Occupied(entry) => {
                let model = Arc::clone(entry.get());
                let count = model.retain();
                tracing::debug!("Acquired resident model {} (references: {})", file, count);
                Ok(model)
            }
            Entry::Vacant(entry) => {
                let document = self.load(file).map_err(|e| PomError::ModelAcquisition {
                    file: file.clone(),
                    source: Box::new(e),
                })?;
                let model = Arc::new(SharedModel::with_undo_limit(
                    file.clone(),
                    document,
                    self.config.undo_limit,
                ));
                model.retain();
                entry.insert(Arc::clone(&model));
                tracing::debug!("Acquired new model {}", file);
                Ok(model)
            }
        }
    }

    fn release_from_edit(&self, model: &Arc<SharedModel>) {
        let file = model.file();
        match model.release_reference() {
            None => tracing::warn!("Release of unreferenced model {}", file),
            Some(0) => {
                let removed = self.models.remove_if(file, |_, resident| {
                    Arc::ptr_eq(resident, model) && resident.reference_count() == 0
                });
                if removed.is_some() {
                    tracing::debug!("Released last reference, dropped model {}", file);
                }
            }
            Some(count) => {
                tracing::debug!("Released model {} (references: {})", file, count);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn pom_file(content: &str) -> (NamedTempFile, FileHandle) {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        let handle = FileHandle::new(temp_file.path()).unwrap();
        (temp_file, handle)
    }

    #[test]
    fn test_acquire_loads_from_disk() {
        let (_file, handle) = pom_file("<project>\n  <modelVersion>4.0.0</modelVersion>\n</project>\n");
        let manager = ModelManager::new();

        let model = manager.acquire_for_edit(&handle).unwrap();
        assert_eq!(model.reference_count(), 1);
        assert!(!model.is_dirty());
        assert_eq!(
            model.to_xml(),
            "<project>\n  <modelVersion>4.0.0</modelVersion>\n</project>\n"
        );
        assert_eq!(manager.open_models(), 1);
    }

    #[test]
    fn test_acquire_shares_resident_model() {
        let (_file, handle) = pom_file("<project/>");
        let manager = ModelManager::new();

        let first = manager.acquire_for_edit(&handle).unwrap();
        let second = manager.acquire_for_edit(&handle).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.reference_count(), 2);

        manager.release_from_edit(&second);
        assert_eq!(first.reference_count(), 1);
        assert!(manager.existing_model(&handle).is_some());

        manager.release_from_edit(&first);
        assert_eq!(first.reference_count(), 0);
        assert!(manager.existing_model(&handle).is_none());
        assert_eq!(manager.open_models(), 0);
    }

    #[test]
    fn test_reacquire_after_release_reloads() {
        let (file, handle) = pom_file("<project/>");
        let manager = ModelManager::new();

        let model = manager.acquire_for_edit(&handle).unwrap();
        manager.release_from_edit(&model);

        std::fs::write(file.path(), "<project><name>x</name></project>").unwrap();
        let reloaded = manager.acquire_for_edit(&handle).unwrap();
        assert!(!Arc::ptr_eq(&model, &reloaded));
        assert_eq!(reloaded.to_xml(), "<project><name>x</name></project>");
    }

    #[test]
    fn test_release_unreferenced_is_ignored() {
        let (_file, handle) = pom_file("<project/>");
        let manager = ModelManager::new();

        let model = manager.acquire_for_edit(&handle).unwrap();
        manager.release_from_edit(&model);
        manager.release_from_edit(&model);
        assert_eq!(model.reference_count(), 0);
    }

    #[test]
    fn test_acquire_missing_file() {
        let handle = FileHandle::new("/nonexistent/dir/pom.xml").unwrap();
        let manager = ModelManager::new();

        let err = manager.acquire_for_edit(&handle).unwrap_err();
        assert!(matches!(err, PomError::ModelAcquisition { .. }));
        assert!(matches!(err.root_cause(), PomError::Io(_)));
        assert_eq!(manager.open_models(), 0);
    }

    #[test]
    fn test_acquire_malformed_file() {
        let (_file, handle) = pom_file("<project><dependencies></project>");
        let manager = ModelManager::new();

        let err = manager.acquire_for_edit(&handle).unwrap_err();
        assert!(matches!(err.root_cause(), PomError::ParseError { .. }));
    }

    #[test]
    fn test_acquire_rejects_oversized_file() {
        let (_file, handle) = pom_file("<project><name>too large</name></project>");
        let manager = ModelManager::with_config(EditConfig {
            max_file_size: 8,
            ..EditConfig::default()
        });

        let err = manager.acquire_for_edit(&handle).unwrap_err();
        let PomError::Io(io) = err.root_cause() else {
            panic!("expected Io error, got {err:?}");
        };
        assert!(io.to_string().contains("file too large"));
    }
}
