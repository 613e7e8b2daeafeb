//! Scan pipeline: parse a header, collect its classes and extract their
//! method tables under the configured policies.

use crate::ast::{CursorKind, SourceLocation};
use crate::errors::Result;
use crate::frontend::Index;
use crate::signature::{
    ClassAggregator, ClassRecord, CollisionPolicy, ErrorPolicy, MethodExtractor,
    NamespaceCollector, RecordPolicy, SkippedMethod,
};
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, debug_span, info};

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub include_templates: bool,
    pub record_policy: RecordPolicy,
    pub on_error: ErrorPolicy,
    pub collisions: CollisionPolicy,
    pub compiler_args: Vec<String>,
    /// Extra typedef name to builtin spelling.
    pub typedefs: IndexMap<String, String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            include_templates: true,
            record_policy: RecordPolicy::default(),
            on_error: ErrorPolicy::default(),
            collisions: CollisionPolicy::default(),
            compiler_args: Vec::new(),
            typedefs: IndexMap::new(),
        }
    }
}

/// Result of scanning one file.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub source: PathBuf,
    pub classes: Vec<ClassRecord>,
    pub skipped: Vec<SkippedMethod>,
}

impl ScanReport {
    pub fn class(&self, qualified_name: &str) -> Option<&ClassRecord> {
        self.classes
            .iter()
            .find(|class| class.qualified_name == qualified_name)
    }
}

/// A discovered class, without its methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassSummary {
    pub qualified_name: String,
    pub kind: &'static str,
    pub location: SourceLocation,
}

pub struct Scanner {
    index: Index,
    collector: NamespaceCollector,
    aggregator: ClassAggregator,
}

impl Scanner {
    pub fn new(options: &ScanOptions) -> Result<Self> {
        let index = Index::new(&options.compiler_args)?.with_typedefs(&options.typedefs)?;
        Ok(Self {
            index,
            collector: NamespaceCollector::new(options.include_templates, options.collisions),
            aggregator: ClassAggregator::new(
                MethodExtractor::new(options.record_policy),
                options.on_error,
            ),
        })
    }

    /// Parse `path` and extract the method table of every class in it.
    pub fn scan(&self, path: &Path) -> Result<ScanReport> {
        let span = debug_span!("scan", path = %path.display());
        let _enter = span.enter();

        let tu = self.index.parse(path)?;
        let classes = self.collector.collect(tu.cursor())?;
        debug!(classes = classes.len(), "collected classes");

        let mut report = ScanReport {
            source: path.to_path_buf(),
            classes: Vec::with_capacity(classes.len()),
            skipped: Vec::new(),
        };
        for (name, cursor) in &classes {
            let (record, skipped) = self.aggregator.class_record(name, *cursor)?;
            debug!(
                class = %name,
                methods = record.methods.len(),
                signatures = record.signature_count(),
                "extracted class"
            );
            report.classes.push(record);
            report.skipped.extend(skipped);
        }
        Ok(report)
    }

    /// Scan several files in parallel; results keep the input order.
    pub fn scan_all(&self, paths: &[PathBuf]) -> Vec<Result<ScanReport>> {
        info!(files = paths.len(), "scanning");
        paths.par_iter().map(|path| self.scan(path)).collect()
    }

    /// Qualified names and locations of the classes in `path`.
    ///
    /// Parses leniently: a file with error diagnostics still lists the
    /// classes that were recovered.
    pub fn classes(&self, path: &Path) -> Result<Vec<ClassSummary>> {
        let tu = self.index.parse_lenient(path)?;
        let classes = self.collector.collect(tu.cursor())?;
        Ok(classes
            .into_iter()
            .map(|(qualified_name, cursor)| ClassSummary {
                qualified_name,
                kind: match cursor.kind() {
                    CursorKind::ClassTemplate => "class template",
                    _ => "class",
                },
                location: cursor.location().clone(),
            })
            .collect())
    }

    /// [`Scanner::classes`] for several files in parallel, in input order.
    pub fn classes_all(&self, paths: &[PathBuf]) -> Vec<Result<Vec<ClassSummary>>> {
        paths.par_iter().map(|path| self.classes(path)).collect()
    }
}
