//! Dependency sections and clean removal of elements.

use crate::editor::PomEditor;
use pom_core::{NodeId, Result};

impl PomEditor<'_> {
    /// `<dependency>` elements under `container/dependencies`, where
    /// `container` is `<project>`, `<dependencyManagement>`, a `<plugin>` and
    /// so on. Empty if there is no `<dependencies>` section.
    pub fn find_dependencies(&self, container: NodeId) -> Vec<NodeId> {
        self.find_child(container, "dependencies")
            .map(|list| self.find_children(list, "dependency"))
            .unwrap_or_default()
    }

    /// First dependency under `container/dependencies` with the given
    /// coordinates. A `None` group id only matches dependencies without a
    /// `<groupId>`.
    pub fn find_dependency(
        &self,
        container: NodeId,
        group_id: Option<&str>,
        artifact_id: &str,
    ) -> Option<NodeId> {
        self.find_dependencies(container).into_iter().find(|&dep| {
            let group = self
                .find_child(dep, "groupId")
                .and_then(|g| self.text_value(g));
            let artifact = self
                .find_child(dep, "artifactId")
                .and_then(|a| self.text_value(a));
            group.as_deref() == group_id && artifact.as_deref() == Some(artifact_id)
        })
    }

    /// The `dependencyManagement/dependencies` list under `root`, created if
    /// missing.
    pub fn managed_dependencies(&mut self, root: NodeId) -> Result<NodeId> {
        self.get_child(root, &["dependencyManagement", "dependencies"])
    }

    /// Removes the first child element of `parent` named `name`, if any.
    ///
    /// A text node right before the removed element is cut back to just
    /// before its last line break, so the line the element occupied
    /// disappears while the lines above keep their indentation. Text without
    /// a line break is left alone.
    pub fn remove_child(&mut self, parent: NodeId, name: &str) -> Result<()> {
        let Some(child) = self.find_child(parent, name) else {
            return Ok(());
        };
        self.remove_element(parent, child)
    }

    /// Removes `child` from `parent`, trimming the preceding text as
    /// [`remove_child`](Self::remove_child) does.
    pub fn remove_element(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let document = self.document_mut();
        if let Some(prev) = document.previous_sibling(child)
            && let Some(text) = document.text(prev)
            && let Some(newline) = text.rfind('\n')
        {
            let head = &text[..newline];
            let trimmed = head.strip_suffix('\r').unwrap_or(head).to_string();
            document.set_text(prev, &trimmed)?;
        }
        document.remove_child(parent, child)
    }
}

#[cfg(test)]
mod tests {
    use crate::editor::PomEditor;
    use crate::editor::tests::RecordingFormatter;
    use pom_core::{Document, NoopFormatter};

    const DEPENDENCIES: &str = "<project>\n  <dependencies>\n    <dependency>\n      <groupId>junit</groupId>\n      <artifactId>junit</artifactId>\n    </dependency>\n    <dependency>\n      <artifactId>local</artifactId>\n    </dependency>\n  </dependencies>\n</project>";

    #[test]
    fn test_find_dependencies() {
        let mut doc = Document::parse(DEPENDENCIES).unwrap();
        let editor = PomEditor::new(&mut doc, &NoopFormatter);
        let root = editor.root().unwrap();

        let deps = editor.find_dependencies(root);
        assert_eq!(deps.len(), 2);
        let artifact = editor.find_child(deps[1], "artifactId").unwrap();
        assert_eq!(editor.text_value(artifact).as_deref(), Some("local"));
    }

    #[test]
    fn test_find_dependencies_without_section() {
        let mut doc = Document::parse("<project><name>x</name></project>").unwrap();
        let editor = PomEditor::new(&mut doc, &NoopFormatter);
        let root = editor.root().unwrap();
        assert!(editor.find_dependencies(root).is_empty());
    }

    #[test]
    fn test_find_dependency() {
        let mut doc = Document::parse(DEPENDENCIES).unwrap();
        let editor = PomEditor::new(&mut doc, &NoopFormatter);
        let root = editor.root().unwrap();
        let deps = editor.find_dependencies(root);

        assert_eq!(editor.find_dependency(root, Some("junit"), "junit"), Some(deps[0]));
        assert_eq!(editor.find_dependency(root, None, "local"), Some(deps[1]));
        assert_eq!(editor.find_dependency(root, None, "junit"), None);
        assert_eq!(editor.find_dependency(root, Some("x"), "local"), None);
    }

    #[test]
    fn test_managed_dependencies_created_once() {
        let mut doc = Document::parse("<project></project>").unwrap();
        let formatter = RecordingFormatter::default();
        let mut editor = PomEditor::new(&mut doc, &formatter);
        let root = editor.root().unwrap();

        let list = editor.managed_dependencies(root).unwrap();
        let again = editor.managed_dependencies(root).unwrap();

        let dm = editor.find_child(root, "dependencyManagement").unwrap();
        assert_eq!(editor.document().parent(list), Some(dm));
        assert_eq!(list, again);
        assert_eq!(formatter.formatted(), vec![dm]);
    }

    #[test]
    fn test_managed_dependencies_existing_section() {
        let mut doc = Document::parse(
            "<project><dependencyManagement><dependencies/></dependencyManagement></project>",
        )
        .unwrap();
        let formatter = RecordingFormatter::default();
        let mut editor = PomEditor::new(&mut doc, &formatter);
        let root = editor.root().unwrap();

        let list = editor.managed_dependencies(root).unwrap();
        assert_eq!(editor.document().name(list), Some("dependencies"));
        assert!(formatter.formatted().is_empty());
    }

    #[test]
    fn test_remove_child_trims_preceding_text() {
        let mut doc = Document::parse("<project>\n  <x/>\n  <y/></project>").unwrap();
        let mut editor = PomEditor::new(&mut doc, &NoopFormatter);
        let root = editor.root().unwrap();

        editor.remove_child(root, "x").unwrap();

        let document = editor.document();
        let children: Vec<_> = document.children(root).collect();
        assert_eq!(children.len(), 3);
        assert_eq!(document.text(children[0]), Some(""));
        assert_eq!(document.text(children[1]), Some("\n  "));
        assert_eq!(document.name(children[2]), Some("y"));
        assert_eq!(doc.to_xml(), "<project>\n  <y/></project>");
    }

    #[test]
    fn test_remove_child_keeps_blank_lines_above() {
        let mut doc = Document::parse("<project>\r\n  <a/>\r\n\r\n  <b/>\r\n</project>").unwrap();
        let mut editor = PomEditor::new(&mut doc, &NoopFormatter);
        let root = editor.root().unwrap();

        editor.remove_child(root, "b").unwrap();
        assert_eq!(doc.to_xml(), "<project>\r\n  <a/>\r\n\r\n</project>");
    }

    #[test]
    fn test_remove_child_missing_is_noop() {
        let mut doc = Document::parse("<project>\n  <x/>\n</project>").unwrap();
        let stamp = doc.modification_stamp();
        let mut editor = PomEditor::new(&mut doc, &NoopFormatter);
        let root = editor.root().unwrap();

        editor.remove_child(root, "missing").unwrap();
        assert_eq!(doc.modification_stamp(), stamp);
    }

    #[test]
    fn test_remove_child_without_newline_or_text() {
        let mut doc = Document::parse("<project> <a/><b/></project>").unwrap();
        let mut editor = PomEditor::new(&mut doc, &NoopFormatter);
        let root = editor.root().unwrap();

        editor.remove_child(root, "a").unwrap();
        editor.remove_child(root, "b").unwrap();
        assert_eq!(doc.to_xml(), "<project> </project>");
    }

    #[test]
    fn test_remove_only_first_match() {
        let mut doc = Document::parse(DEPENDENCIES).unwrap();
        let mut editor = PomEditor::new(&mut doc, &NoopFormatter);
        let root = editor.root().unwrap();
        let list = editor.find_child(root, "dependencies").unwrap();

        editor.remove_child(list, "dependency").unwrap();

        assert_eq!(editor.find_dependencies(root).len(), 1);
        assert_eq!(
            doc.to_xml(),
            "<project>\n  <dependencies>\n    <dependency>\n      <artifactId>local</artifactId>\n    </dependency>\n  </dependencies>\n</project>"
        );
    }
}
