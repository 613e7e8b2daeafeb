//! `cppsig classes`: the classes found in each file.

use super::{load_run_config, scan_options};
use crate::cli::{configure_thread_pool, ScanArgs};
use crate::io::{self, ClassListing, OutputFormat};
use crate::scan::Scanner;
use anyhow::{Context, Result};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ClassesConfig {
    pub scan: ScanArgs,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
}

pub fn list_classes(config: ClassesConfig) -> Result<()> {
    let run_config = load_run_config(&config.scan)?;
    let options = scan_options(&run_config, &config.scan);

    configure_thread_pool(config.scan.jobs);
    let scanner = Scanner::new(&options).context("invalid compiler arguments")?;
    let listings = scanner
        .classes_all(&config.scan.files)
        .into_iter()
        .zip(&config.scan.files)
        .map(|(classes, path)| {
            let classes =
                classes.with_context(|| format!("failed to scan {}", path.display()))?;
            Ok(ClassListing {
                source: path.clone(),
                classes,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let writer = io::open_output(config.output.as_deref())?;
    io::create_writer(config.format, writer).write_classes(&listings)
}
