//! Reference-counted document models shared between editors and edit
//! transactions.

use crate::config::DEFAULT_UNDO_LIMIT;
use crate::dom::Document;
use crate::error::{PomError, Result};
use std::collections::VecDeque;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Identifies a persisted pom.xml.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileHandle(PathBuf);

impl FileHandle {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(PomError::invalid_argument("file path must not be empty"));
        }
        Ok(Self(path))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Observer of model changes, typically an open editor.
pub trait ModelListener: Send + Sync {
    fn model_about_to_change(&self, _file: &FileHandle) {}

    fn model_changed(&self, _file: &FileHandle) {}
}

#[derive(Debug)]
struct UndoStep {
    label: String,
    snapshot: Document,
}

#[derive(Debug)]
struct UndoHistory {
    limit: usize,
    undo: VecDeque<UndoStep>,
    redo: Vec<UndoStep>,
    pending: Option<UndoStep>,
    depth: usize,
}

impl UndoHistory {
    fn new(limit: usize) -> Self {
        Self {
            limit,
            undo: VecDeque::new(),
            redo: Vec::new(),
            pending: None,
            depth: 0,
        }
    }

    fn push(&mut self, step: UndoStep) {
        if self.limit == 0 {
            return;
        }
        while self.undo.len() >= self.limit {
            self.undo.pop_front();
        }
        self.undo.push_back(step);
        self.redo.clear();
    }
}

#[derive(Debug)]
struct ModelState {
    document: Document,
    saved_stamp: u64,
    history: UndoHistory,
}

/// A document shared by every holder of the same file.
///
/// Holders obtain and give back models through a
/// [`ModelProvider`](crate::ModelProvider), which maintains the reference
/// count. The document itself is only reachable through [`read`](Self::read)
/// and [`edit`](Self::edit).
pub struct SharedModel {
    file: FileHandle,
    state: Mutex<ModelState>,
    references: AtomicUsize,
    listeners: Mutex<Vec<Arc<dyn ModelListener>>>,
}

impl fmt::Debug for SharedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedModel")
            .field("file", &self.file)
            .field("references", &self.reference_count())
            .field("dirty", &self.is_dirty())
            .finish_non_exhaustive()
    }
}

impl SharedModel {
    /// Wraps a freshly loaded document. The model starts clean and
    /// unreferenced.
    pub fn new(file: FileHandle, document: Document) -> Self {
        Self::with_undo_limit(file, document, DEFAULT_UNDO_LIMIT)
    }

    pub fn with_undo_limit(file: FileHandle, document: Document, undo_limit: usize) -> Self {
        let saved_stamp = document.modification_stamp();
        Self {
            file,
            state: Mutex::new(ModelState {
                document,
                saved_stamp,
                history: UndoHistory::new(undo_limit),
            }),
            references: AtomicUsize::new(0),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn file(&self) -> &FileHandle {
        &self.file
    }

    /// Number of holders currently editing this model.
    pub fn reference_count(&self) -> usize {
        self.references.load(Ordering::SeqCst)
    }

    pub(crate) fn retain(&self) -> usize {
        self.references.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Drops one reference. Returns the remaining count, or `None` if the
    /// model was not referenced.
    pub(crate) fn release_reference(&self) -> Option<usize> {
        self.references
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| {
                count.checked_sub(1)
            })
            .ok()
            .map(|previous| previous - 1)
    }

    fn state(&self) -> MutexGuard<'_, ModelState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn listeners(&self) -> Vec<Arc<dyn ModelListener>> {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn read<R>(&self, f: impl FnOnce(&Document) -> R) -> R {
        f(&self.state().document)
    }

    pub fn edit<R>(&self, f: impl FnOnce(&mut Document) -> R) -> R {
        f(&mut self.state().document)
    }

    /// Serialized form of the current document.
    pub fn to_xml(&self) -> String {
        self.read(Document::to_xml)
    }

    /// Whether the document differs from its last loaded or saved state.
    pub fn is_dirty(&self) -> bool {
        let state = self.state();
        state.document.modification_stamp() != state.saved_stamp
    }

    /// Writes the document to its file and marks the model clean.
    ///
    /// The file receives the serialized document exactly as
    /// [`to_xml`](Self::to_xml) returns it, including a byte order mark if
    /// the loaded file had one.
    ///
    /// # Errors
    ///
    /// - `PomError::Persistence` - The file could not be written. The model
    ///   stays dirty.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use pom_core::{Document, FileHandle, SharedModel};
    ///
    /// # fn example() -> pom_core::Result<()> {
    /// let document = Document::parse("<project/>")?;
    /// let model = SharedModel::new(FileHandle::new("pom.xml")?, document);
    /// if model.is_dirty() {
    ///     model.save()?;
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn save(&self) -> Result<()> {
        let (content, stamp) = {
            let state = self.state();
            (state.document.to_xml(), state.document.modification_stamp())
        };
        std::fs::write(self.file.path(), content).map_err(|source| PomError::Persistence {
            file: self.file.clone(),
            source,
        })?;
        self.state().saved_stamp = stamp;
        tracing::debug!("Saved model {}", self.file);
        Ok(())
    }

    pub fn add_listener(&self, listener: Arc<dyn ModelListener>) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    pub fn remove_listener(&self, listener: &Arc<dyn ModelListener>) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|l| !Arc::ptr_eq(l, listener));
    }

    pub fn about_to_change(&self) {
        for listener in self.listeners() {
            listener.model_about_to_change(&self.file);
        }
    }

    pub fn changed(&self) {
        for listener in self.listeners() {
            listener.model_changed(&self.file);
        }
    }

    /// Opens an undo boundary. Boundaries nest; only the outermost one
    /// produces an undo step.
    pub fn begin_recording(&self, label: &str) {
        let mut state = self.state();
        state.history.depth += 1;
        if state.history.depth == 1 {
            let snapshot = state.document.clone();
            state.history.pending = Some(UndoStep {
                label: label.to_string(),
                snapshot,
            });
        }
    }

    /// Closes an undo boundary, recording one undo step if the outermost
    /// boundary saw any change.
    pub fn end_recording(&self) {
        let mut state = self.state();
        if state.history.depth == 0 {
            tracing::warn!("end_recording without begin_recording on {}", self.file);
            return;
        }
        state.history.depth -= 1;
        if state.history.depth > 0 {
            return;
        }
        let Some(step) = state.history.pending.take() else {
            return;
        };
        if step.snapshot.modification_stamp() != state.document.modification_stamp() {
            tracing::trace!("Recorded undo step '{}' on {}", step.label, self.file);
            state.history.push(step);
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.state().history.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.state().history.redo.is_empty()
    }

    /// Label of the step [`undo`](Self::undo) would revert.
    pub fn undo_label(&self) -> Option<String> {
        self.state().history.undo.back().map(|s| s.label.clone())
    }

    /// Reverts the most recent undo step. Returns `false` if there is none.
    pub fn undo(&self) -> bool {
        if !self.can_undo() {
            return false;
        }
        self.about_to_change();
        {
            let mut state = self.state();
            if let Some(step) = state.history.undo.pop_back() {
                let current = std::mem::replace(&mut state.document, step.snapshot);
                state.history.redo.push(UndoStep {
                    label: step.label,
                    snapshot: current,
                });
                tracing::trace!("Undo on {}", self.file);
            }
        }
        self.changed();
        true
    }

    /// Re-applies the most recently undone step. Returns `false` if there
    /// is none.
    pub fn redo(&self) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.about_to_change();
        {
            let mut state = self.state();
            if let Some(step) = state.history.redo.pop() {
                let current = std::mem::replace(&mut state.document, step.snapshot);
                state.history.undo.push_back(UndoStep {
                    label: step.label,
                    snapshot: current,
                });
                tracing::trace!("Redo on {}", self.file);
            }
        }
        self.changed();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn model(xml: &str) -> SharedModel {
        SharedModel::new(
            FileHandle::new("/test/pom.xml").unwrap(),
            Document::parse(xml).unwrap(),
        )
    }

    fn add_element(model: &SharedModel, name: &str) {
        model.edit(|doc| {
            let project = doc.document_element().unwrap();
            let element = doc.create_element(name).unwrap();
            doc.append_child(project, element).unwrap();
        });
    }

    #[derive(Default)]
    struct RecordingListener {
        events: Mutex<Vec<&'static str>>,
    }

    impl ModelListener for RecordingListener {
        fn model_about_to_change(&self, _file: &FileHandle) {
            self.events.lock().unwrap().push("about");
        }

        fn model_changed(&self, _file: &FileHandle) {
            self.events.lock().unwrap().push("changed");
        }
    }

    #[test]
    fn test_file_handle() {
        assert!(matches!(
            FileHandle::new(""),
            Err(PomError::InvalidArgument(_))
        ));
        let handle = FileHandle::new("/work/pom.xml").unwrap();
        assert_eq!(handle.path(), Path::new("/work/pom.xml"));
        assert_eq!(handle.to_string(), "/work/pom.xml");
    }

    #[test]
    fn test_dirty_tracking() {
        let model = model("<project/>");
        assert!(!model.is_dirty());
        add_element(&model, "a");
        assert!(model.is_dirty());
    }

    #[test]
    fn test_reference_counting() {
        let model = model("<project/>");
        assert_eq!(model.reference_count(), 0);
        assert_eq!(model.retain(), 1);
        assert_eq!(model.retain(), 2);
        assert_eq!(model.release_reference(), Some(1));
        assert_eq!(model.release_reference(), Some(0));
        assert_eq!(model.release_reference(), None);
        assert_eq!(model.reference_count(), 0);
    }

    #[test]
    fn test_undo_redo() {
        let model = model("<project/>");
        model.begin_recording("add a");
        add_element(&model, "a");
        model.end_recording();

        assert_eq!(model.to_xml(), "<project><a/></project>");
        assert!(model.can_undo());
        assert_eq!(model.undo_label(), Some("add a".to_string()));

        assert!(model.undo());
        assert_eq!(model.to_xml(), "<project/>");
        assert!(!model.is_dirty());
        assert!(model.can_redo());

        assert!(model.redo());
        assert_eq!(model.to_xml(), "<project><a/></project>");
        assert!(model.is_dirty());
        assert!(!model.redo());
    }

    #[test]
    fn test_nested_recording_is_one_step() {
        let model = model("<project/>");
        model.begin_recording("outer");
        add_element(&model, "a");
        model.begin_recording("inner");
        add_element(&model, "b");
        model.end_recording();
        model.end_recording();

        assert!(model.undo());
        assert_eq!(model.to_xml(), "<project/>");
        assert!(!model.can_undo());
    }

    #[test]
    fn test_unchanged_recording_creates_no_step() {
        let model = model("<project/>");
        model.begin_recording("nothing");
        model.end_recording();
        assert!(!model.can_undo());
        assert!(!model.undo());
    }

    #[test]
    fn test_unbalanced_end_recording_is_ignored() {
        let model = model("<project/>");
        model.end_recording();
        assert!(!model.can_undo());
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let model = model("<project/>");
        model.begin_recording("a");
        add_element(&model, "a");
        model.end_recording();
        model.undo();

        model.begin_recording("b");
        add_element(&model, "b");
        model.end_recording();
        assert!(!model.can_redo());
    }

    #[test]
    fn test_undo_limit() {
        let model = SharedModel::with_undo_limit(
            FileHandle::new("/test/pom.xml").unwrap(),
            Document::parse("<project/>").unwrap(),
            2,
        );
        for name in ["a", "b", "c"] {
            model.begin_recording(name);
            add_element(&model, name);
            model.end_recording();
        }
        assert!(model.undo());
        assert!(model.undo());
        assert!(!model.undo());
        assert_eq!(model.to_xml(), "<project><a/></project>");
    }

    #[test]
    fn test_listeners_notified() {
        let model = model("<project/>");
        let listener = Arc::new(RecordingListener::default());
        let dyn_listener: Arc<dyn ModelListener> = listener.clone();
        model.add_listener(dyn_listener.clone());

        model.about_to_change();
        model.changed();
        assert_eq!(*listener.events.lock().unwrap(), vec!["about", "changed"]);

        model.remove_listener(&dyn_listener);
        model.about_to_change();
        assert_eq!(listener.events.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_save_writes_file_and_clears_dirty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pom.xml");
        let model = SharedModel::new(
            FileHandle::new(&path).unwrap(),
            Document::parse("<project/>").unwrap(),
        );
        add_element(&model, "a");
        model.save().unwrap();

        assert!(!model.is_dirty());
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "<project><a/></project>"
        );
    }

    #[test]
    fn test_save_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("pom.xml");
        let model = SharedModel::new(
            FileHandle::new(&path).unwrap(),
            Document::parse("<project/>").unwrap(),
        );
        add_element(&model, "a");

        let result = model.save();
        assert!(matches!(result, Err(PomError::Persistence { .. })));
        assert!(model.is_dirty());
    }
}
