//! `cppsig methods`: method tables for every class of the given files.

use super::{load_run_config, scan_options};
use crate::cli::{configure_thread_pool, ScanArgs};
use crate::io::{self, OutputFormat};
use crate::scan::{ScanReport, Scanner};
use crate::signature::{ErrorPolicy, RecordPolicy};
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct MethodsConfig {
    pub scan: ScanArgs,
    pub class: Option<String>,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub raw_types: bool,
    pub strict: bool,
}

pub fn handle_methods(config: MethodsConfig) -> Result<()> {
    let run_config = load_run_config(&config.scan)?;
    let mut options = scan_options(&run_config, &config.scan);
    if config.strict {
        options.on_error = ErrorPolicy::Abort;
        options.record_policy = RecordPolicy::Strict;
    }
    let std_types = run_config.std_types && !config.raw_types;

    configure_thread_pool(config.scan.jobs);
    let scanner = Scanner::new(&options).context("invalid compiler arguments")?;
    let mut reports = scanner
        .scan_all(&config.scan.files)
        .into_iter()
        .zip(&config.scan.files)
        .map(|(report, path)| report.with_context(|| format!("failed to scan {}", path.display())))
        .collect::<Result<Vec<_>>>()?;

    if let Some(class) = &config.class {
        select_class(&mut reports, class)?;
    }
    let skipped: usize = reports.iter().map(|report| report.skipped.len()).sum();
    info!(files = reports.len(), skipped, "scan complete");

    let writer = io::open_output(config.output.as_deref())?;
    io::create_writer(config.format, writer).write_methods(&reports, std_types)
}

/// Keep only the class named `name`, by qualified or bare name.
fn select_class(reports: &mut [ScanReport], name: &str) -> Result<()> {
    let mut found = false;
    for report in reports.iter_mut() {
        report.classes.retain(|record| {
            let bare = record
                .qualified_name
                .rsplit("::")
                .next()
                .unwrap_or(&record.qualified_name);
            record.qualified_name == name || bare == name
        });
        report.skipped.retain(|method| {
            report
                .classes
                .iter()
                .any(|record| {
                    record.qualified_name == method.class
                        || record.qualified_name.ends_with(&format!("::{}", method.class))
                })
        });
        found |= !report.classes.is_empty();
    }
    if !found {
        anyhow::bail!("class `{name}` not found");
    }
    Ok(())
}
