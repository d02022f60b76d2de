//! Units of work applied to a pom.xml.

use crate::editor::PomEditor;
use crate::types::Coordinates;
use pom_core::{FileHandle, Result};

/// A mutation of one document.
///
/// The transaction runner calls [`process`](Self::process) exactly once per
/// work item, inside an undo boundary.
pub trait Operation {
    fn process(&self, editor: &mut PomEditor<'_>) -> Result<()>;
}

impl<T: Operation + ?Sized> Operation for Box<T> {
    fn process(&self, editor: &mut PomEditor<'_>) -> Result<()> {
        (**self).process(editor)
    }
}

/// Operation backed by a closure. Created by [`from_fn`].
pub struct FnOperation<F>(F);

impl<F> std::fmt::Debug for FnOperation<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnOperation")
    }
}

/// Wraps a closure as an [`Operation`].
///
/// ```
/// use pom_edits::{Operation, from_fn};
///
/// let set_name = from_fn(|editor| {
///     let root = editor.root()?;
///     let name = editor.get_child(root, &["name"])?;
///     editor.set_text(name, "demo")
/// });
/// # fn assert_operation(_: &impl Operation) {}
/// # assert_operation(&set_name);
/// ```
pub fn from_fn<F>(f: F) -> FnOperation<F>
where
    F: Fn(&mut PomEditor<'_>) -> Result<()>,
{
    FnOperation(f)
}

impl<F> Operation for FnOperation<F>
where
    F: Fn(&mut PomEditor<'_>) -> Result<()>,
{
    fn process(&self, editor: &mut PomEditor<'_>) -> Result<()> {
        (self.0)(editor)
    }
}

/// Runs several operations in order against the same document.
///
/// The first failing operation stops the sequence; its error is returned and
/// the effects of the operations before it are kept.
#[derive(Default)]
pub struct CompoundOperation {
    operations: Vec<Box<dyn Operation>>,
}

impl std::fmt::Debug for CompoundOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompoundOperation")
            .field("operations", &self.operations.len())
            .finish()
    }
}

impl CompoundOperation {
    pub fn new(operations: Vec<Box<dyn Operation>>) -> Self {
        Self { operations }
    }

    #[must_use]
    pub fn then(mut self, operation: impl Operation + 'static) -> Self {
        self.operations.push(Box::new(operation));
        self
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl Operation for CompoundOperation {
    fn process(&self, editor: &mut PomEditor<'_>) -> Result<()> {
        for operation in &self.operations {
            operation.process(editor)?;
        }
        Ok(())
    }
}

/// An operation bound to the file it edits.
pub struct WorkItem {
    file: FileHandle,
    operation: Box<dyn Operation>,
}

impl std::fmt::Debug for WorkItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkItem")
            .field("file", &self.file)
            .finish_non_exhaustive()
    }
}

impl WorkItem {
    pub fn new(file: FileHandle, operation: impl Operation + 'static) -> Self {
        Self {
            file,
            operation: Box::new(operation),
        }
    }

    pub fn file(&self) -> &FileHandle {
        &self.file
    }

    pub fn operation(&self) -> &dyn Operation {
        self.operation.as_ref()
    }
}

/// Appends a dependency to `project/dependencies`.
pub fn add_dependency(coordinates: Coordinates) -> impl Operation {
    from_fn(move |editor| {
        let root = editor.root()?;
        let list = editor.get_child(root, &["dependencies"])?;
        create_dependency(editor, list, &coordinates)
    })
}

/// Appends a dependency to `project/dependencyManagement/dependencies`.
pub fn add_managed_dependency(coordinates: Coordinates) -> impl Operation {
    from_fn(move |editor| {
        let root = editor.root()?;
        let list = editor.managed_dependencies(root)?;
        create_dependency(editor, list, &coordinates)
    })
}

/// Appends a plugin to `project/build/plugins`.
pub fn add_plugin(coordinates: Coordinates) -> impl Operation {
    from_fn(move |editor| {
        let root = editor.root()?;
        let list = editor.get_child(root, &["build", "plugins"])?;
        editor.create_plugin(
            list,
            coordinates.group_id.as_deref(),
            &coordinates.artifact_id,
            coordinates.version.as_deref(),
        )?;
        Ok(())
    })
}

/// Removes the dependency with the given group and artifact id from
/// `project/dependencies`. Does nothing if it is not declared.
pub fn remove_dependency(coordinates: Coordinates) -> impl Operation {
    from_fn(move |editor| {
        let root = editor.root()?;
        let Some(list) = editor.find_child(root, "dependencies") else {
            return Ok(());
        };
        match editor.find_dependency(
            root,
            coordinates.group_id.as_deref(),
            &coordinates.artifact_id,
        ) {
            Some(dependency) => editor.remove_element(list, dependency),
            None => {
                tracing::debug!("Dependency {} not declared, nothing to remove", coordinates);
                Ok(())
            }
        }
    })
}

fn create_dependency(
    editor: &mut PomEditor<'_>,
    list: pom_core::NodeId,
    coordinates: &Coordinates,
) -> Result<()> {
    editor.create_dependency(
        list,
        coordinates.group_id.as_deref(),
        &coordinates.artifact_id,
        coordinates.version.as_deref(),
    )?;
    Ok(())
}
