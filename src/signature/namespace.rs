//! Discovery of class declarations through nested namespaces.

use crate::ast::{Cursor, CursorKind};
use crate::errors::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// What happens when two classes share a qualified name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// The later discovery replaces the earlier one.
    #[default]
    Overwrite,
    /// Two definitions with the same name are a `DuplicateClass` error.
    Reject,
}

/// Qualified name to class cursor, in discovery order.
pub type ClassIndex<'tu> = IndexMap<String, Cursor<'tu>>;

#[derive(Debug, Clone, Copy)]
pub struct NamespaceCollector {
    include_templates: bool,
    collisions: CollisionPolicy,
}

impl Default for NamespaceCollector {
    fn default() -> Self {
        Self {
            include_templates: true,
            collisions: CollisionPolicy::Overwrite,
        }
    }
}

impl NamespaceCollector {
    pub fn new(include_templates: bool, collisions: CollisionPolicy) -> Self {
        Self {
            include_templates,
            collisions,
        }
    }

    /// Index the classes declared directly in `root` and in every namespace
    /// below it. Classes nested inside other classes are not visited.
    pub fn collect<'tu>(&self, root: Cursor<'tu>) -> Result<ClassIndex<'tu>> {
        let mut classes = ClassIndex::new();
        self.collect_into(root, "", &mut classes)?;
        debug!(count = classes.len(), "collected classes");
        Ok(classes)
    }

    fn collect_into<'tu>(
        &self,
        scope: Cursor<'tu>,
        prefix: &str,
        classes: &mut ClassIndex<'tu>,
    ) -> Result<()> {
        for child in scope.children().filter(|child| self.is_collected(child.kind())) {
            let name = qualify(prefix, child.display_name());
            trace!(class = %name, "found class");
            self.insert(classes, name, child)?;
        }

        for namespace in scope
            .children()
            .filter(|child| child.kind() == CursorKind::Namespace)
        {
            let prefix = qualify(prefix, namespace.display_name());
            self.collect_into(namespace, &prefix, classes)?;
        }
        Ok(())
    }

    fn is_collected(&self, kind: CursorKind) -> bool {
        match kind {
            CursorKind::ClassDecl => true,
            CursorKind::ClassTemplate => self.include_templates,
            _ => false,
        }
    }

    fn insert<'tu>(&self, classes: &mut ClassIndex<'tu>, name: String, class: Cursor<'tu>) -> Result<()> {
        if self.collisions == CollisionPolicy::Reject {
            if let Some(existing) = classes.get(&name) {
                if existing.is_definition() && class.is_definition() {
                    return Err(Error::DuplicateClass {
                        qualified_name: name,
                    });
                }
            }
        }
        classes.insert(name, class);
        Ok(())
    }
}

/// Convenience wrapper over [`NamespaceCollector::collect`].
pub fn collect_classes<'tu>(
    root: Cursor<'tu>,
    include_templates: bool,
    collisions: CollisionPolicy,
) -> Result<ClassIndex<'tu>> {
    NamespaceCollector::new(include_templates, collisions).collect(root)
}

fn qualify(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}::{name}")
    }
}
