// Export modules for library usage
pub mod ast;
pub mod cli;
pub mod commands;
pub mod config;
pub mod errors;
pub mod frontend;
pub mod io;
pub mod naming;
pub mod scan;
pub mod signature;
pub mod table;
pub mod testkit;

// Re-export commonly used types
pub use crate::ast::{Cursor, CursorKind, TranslationUnit, TranslationUnitBuilder, Type, TypeKind};

pub use crate::config::CppsigConfig;

pub use crate::errors::{Error, Result};

pub use crate::frontend::{CompilerArgs, Index};

pub use crate::io::output::{create_writer, OutputFormat, OutputWriter};

pub use crate::naming::underscore_to_camelcase;

pub use crate::scan::{ClassSummary, ScanOptions, ScanReport, Scanner};

pub use crate::signature::{
    collect_classes, detect, resolve, ArrayShape, ClassAggregator, ClassRecord, CollisionPolicy,
    Dimensionality, ErrorPolicy, MethodExtractor, MethodSignature, RecordPolicy, ResolvedType,
    TypeTag,
};

pub use crate::table::{methods_frame, MethodRow, COLUMNS};
