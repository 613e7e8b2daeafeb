//! Tree-sitter parser integration for C and C++
//!
//! Both languages go through the C++ grammar; C headers parse as the C
//! subset of it.

use crate::ast::{Diagnostic, SourceLocation};
use crate::errors::{Error, Result};
use std::path::{Path, PathBuf};
use tree_sitter::{Language, Node, Parser, Tree};

/// A parsed source file and the text its nodes point into.
pub struct SourceFile {
    pub path: PathBuf,
    pub source: String,
    pub tree: Tree,
}

impl SourceFile {
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    pub fn text(&self, node: Node<'_>) -> &str {
        node_text(&node, &self.source)
    }

    pub fn location(&self, node: Node<'_>) -> SourceLocation {
        SourceLocation {
            path: self.path.clone(),
            line: node_line(&node),
            column: node_column(&node),
        }
    }
}

fn language() -> Language {
    tree_sitter_cpp::LANGUAGE.into()
}

/// Parse C++ source code into a tree-sitter tree
pub fn parse_source(content: &str, path: &Path) -> Result<SourceFile> {
    let mut parser = Parser::new();
    parser.set_language(&language())?;

    let tree = parser.parse(content, None).ok_or_else(|| Error::ParseFailure {
        path: path.to_path_buf(),
        diagnostics: vec![Diagnostic::error(
            "parser produced no tree",
            SourceLocation {
                path: path.to_path_buf(),
                line: 1,
                column: 1,
            },
        )],
    })?;

    Ok(SourceFile {
        path: path.to_path_buf(),
        source: content.to_string(),
        tree,
    })
}

/// Check if a parse tree has errors
pub fn has_parse_errors(tree: &Tree) -> bool {
    tree.root_node().has_error()
}

/// Error diagnostics for every ERROR and MISSING node in the file.
pub fn syntax_diagnostics(file: &SourceFile) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    if has_parse_errors(&file.tree) {
        collect_syntax_errors(file, file.tree.root_node(), &mut diagnostics);
    }
    diagnostics
}

fn collect_syntax_errors(file: &SourceFile, node: Node<'_>, diagnostics: &mut Vec<Diagnostic>) {
    if node.is_missing() {
        diagnostics.push(Diagnostic::error(
            format!("expected '{}'", node.kind()),
            file.location(node),
        ));
        return;
    }
    if node.is_error() {
        let snippet: String = file
            .text(node)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .chars()
            .take(40)
            .collect();
        diagnostics.push(Diagnostic::error(
            format!("syntax error near `{snippet}`"),
            file.location(node),
        ));
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() {
            collect_syntax_errors(file, child, diagnostics);
        }
    }
}

/// Get text for a tree-sitter node
pub fn node_text<'a>(node: &Node, source: &'a str) -> &'a str {
    let start = node.start_byte();
    let end = node.end_byte();
    &source[start..end]
}

/// Get the line number for a tree-sitter node (1-indexed)
pub fn node_line(node: &Node) -> usize {
    node.start_position().row + 1
}

/// Get the column number for a tree-sitter node (1-indexed)
pub fn node_column(node: &Node) -> usize {
    node.start_position().column + 1
}
