use crate::scan::ScanOptions;
use crate::signature::{CollisionPolicy, ErrorPolicy, RecordPolicy};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure, read from `.cppsig.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CppsigConfig {
    /// Extra compiler-style arguments passed to the frontend
    #[serde(default)]
    pub compiler_args: Vec<String>,

    /// Include directories, appended as `-I` arguments
    #[serde(default)]
    pub include_dirs: Vec<PathBuf>,

    /// Collect class templates alongside plain classes
    #[serde(default = "default_include_templates")]
    pub include_templates: bool,

    /// Write atoms as `int32_t`/`double` rather than internal tags
    #[serde(default = "default_std_types")]
    pub std_types: bool,

    #[serde(default)]
    pub record_policy: RecordPolicy,

    #[serde(default)]
    pub on_error: ErrorPolicy,

    #[serde(default)]
    pub collisions: CollisionPolicy,

    /// Typedef names resolved to a builtin spelling (`real_t = "double"`)
    #[serde(default)]
    pub typedefs: IndexMap<String, String>,
}

impl Default for CppsigConfig {
    fn default() -> Self {
        Self {
            compiler_args: Vec::new(),
            include_dirs: Vec::new(),
            include_templates: default_include_templates(),
            std_types: default_std_types(),
            record_policy: RecordPolicy::default(),
            on_error: ErrorPolicy::default(),
            collisions: CollisionPolicy::default(),
            typedefs: IndexMap::new(),
        }
    }
}

impl CppsigConfig {
    /// Scan options described by this configuration.
    pub fn scan_options(&self) -> ScanOptions {
        let compiler_args = self
            .include_dirs
            .iter()
            .map(|dir| format!("-I{}", dir.display()))
            .chain(self.compiler_args.iter().cloned())
            .collect();

        ScanOptions {
            include_templates: self.include_templates,
            record_policy: self.record_policy,
            on_error: self.on_error,
            collisions: self.collisions,
            compiler_args,
            typedefs: self.typedefs.clone(),
        }
    }
}

pub fn default_include_templates() -> bool {
    true
}

pub fn default_std_types() -> bool {
    true
}
