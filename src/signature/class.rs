//! Grouping of a class's method signatures by base name.

use super::method::{MethodExtractor, MethodSignature};
use crate::ast::{Cursor, CursorKind};
use crate::errors::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Overload groups keyed by base name, in first-seen order.
pub type MethodTable = IndexMap<String, Vec<MethodSignature>>;

/// What to do when one method of a class cannot be extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Drop the method, log it and report it as skipped.
    #[default]
    Skip,
    /// Fail the whole class.
    Abort,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassRecord {
    pub qualified_name: String,
    pub methods: MethodTable,
    /// `(group, overload)` positions into `methods` in declaration order.
    #[serde(skip)]
    pub discovery: Vec<(usize, usize)>,
}

impl ClassRecord {
    pub fn signature_count(&self) -> usize {
        self.methods.values().map(Vec::len).sum()
    }

    /// Signatures in declaration order, each with the index of its overload
    /// group. Overloads of one name may be interleaved with other methods.
    pub fn signatures(&self) -> impl Iterator<Item = (usize, &MethodSignature)> + '_ {
        self.discovery.iter().filter_map(|&(group, overload)| {
            let (_, overloads) = self.methods.get_index(group)?;
            overloads.get(overload).map(|signature| (group, signature))
        })
    }
}

/// A method left out of a [`ClassRecord`] and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedMethod {
    pub class: String,
    pub method: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct ClassSignatures {
    pub methods: MethodTable,
    pub discovery: Vec<(usize, usize)>,
    pub skipped: Vec<SkippedMethod>,
}

#[derive(Debug, Clone, Default)]
pub struct ClassAggregator {
    extractor: MethodExtractor,
    error_policy: ErrorPolicy,
}

impl ClassAggregator {
    pub fn new(extractor: MethodExtractor, error_policy: ErrorPolicy) -> Self {
        Self {
            extractor,
            error_policy,
        }
    }

    /// Collect the signatures of the direct `CxxMethod` children of a class.
    ///
    /// Constructors, destructors and conversion functions are other cursor
    /// kinds and are not part of the table. A forward declaration is read
    /// through its definition when the tree has one.
    pub fn aggregate(&self, class: Cursor<'_>) -> Result<ClassSignatures> {
        let class = class.definition().unwrap_or(class);
        let mut signatures = ClassSignatures::default();

        for method in class
            .children()
            .filter(|child| child.kind() == CursorKind::CxxMethod)
        {
            match self.extractor.extract(method) {
                Ok((_, signature)) => {
                    let entry = signatures.methods.entry(signature.base_name.clone());
                    let group = entry.index();
                    let overloads = entry.or_default();
                    signatures.discovery.push((group, overloads.len()));
                    overloads.push(signature);
                }
                Err(err) if err.is_structural() && self.error_policy == ErrorPolicy::Skip => {
                    warn!(
                        class = class.display_name(),
                        method = method.display_name(),
                        error = %err,
                        "skipping method"
                    );
                    signatures.skipped.push(SkippedMethod {
                        class: class.display_name().to_string(),
                        method: method.display_name().to_string(),
                        reason: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }

        debug!(
            class = class.display_name(),
            groups = signatures.methods.len(),
            skipped = signatures.skipped.len(),
            "aggregated class"
        );
        Ok(signatures)
    }

    pub fn class_record(&self, qualified_name: &str, class: Cursor<'_>) -> Result<(ClassRecord, Vec<SkippedMethod>)> {
        let ClassSignatures {
            methods,
            discovery,
            skipped,
        } = self.aggregate(class)?;
        Ok((
            ClassRecord {
                qualified_name: qualified_name.to_string(),
                methods,
                discovery,
            },
            skipped,
        ))
    }
}
