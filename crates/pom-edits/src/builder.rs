//! Creation of new elements.

use crate::editor::PomEditor;
use pom_core::{NodeId, Result};

impl PomEditor<'_> {
    /// Appends `<name>text</name>` as the last child of `parent`.
    ///
    /// The text is stored as-is and escaped on serialization. The new element
    /// is not formatted.
    pub fn create_element_with_text(
        &mut self,
        parent: NodeId,
        name: &str,
        text: &str,
    ) -> Result<NodeId> {
        let document = self.document_mut();
        let element = document.create_element(name)?;
        document.append_child(parent, element)?;
        let content = document.create_text(text);
        document.append_child(element, content)?;
        Ok(element)
    }

    /// Appends a formatted `<dependency>` to a `<dependencies>` list.
    pub fn create_dependency(
        &mut self,
        list: NodeId,
        group_id: Option<&str>,
        artifact_id: &str,
        version: Option<&str>,
    ) -> Result<NodeId> {
        self.create_artifact(list, "dependency", group_id, artifact_id, version)
    }

    /// Appends a formatted `<plugin>` to a `<plugins>` list.
    pub fn create_plugin(
        &mut self,
        list: NodeId,
        group_id: Option<&str>,
        artifact_id: &str,
        version: Option<&str>,
    ) -> Result<NodeId> {
        self.create_artifact(list, "plugin", group_id, artifact_id, version)
    }

    fn create_artifact(
        &mut self,
        list: NodeId,
        kind: &str,
        group_id: Option<&str>,
        artifact_id: &str,
        version: Option<&str>,
    ) -> Result<NodeId> {
        let document = self.document_mut();
        let artifact = document.create_element(kind)?;
        document.append_child(list, artifact)?;

        if let Some(group_id) = group_id {
            self.create_element_with_text(artifact, "groupId", group_id)?;
        }
        self.create_element_with_text(artifact, "artifactId", artifact_id)?;
        if let Some(version) = version {
            self.create_element_with_text(artifact, "version", version)?;
        }

        self.format(artifact)?;
        tracing::trace!("Created {} {}", kind, artifact_id);
        Ok(artifact)
    }
}
