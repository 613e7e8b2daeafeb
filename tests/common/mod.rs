// Test utility module for cppsig integration tests
#![allow(dead_code)]

use cppsig::{methods_frame, MethodRow, ScanOptions, ScanReport, Scanner};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory holding C++ sources for one test.
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `source` to `name`, creating parent directories.
    pub fn write(&self, name: &str, source: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, source).unwrap();
        path
    }
}

/// Scan a single header with `options`.
pub fn scan_with(source: &str, options: &ScanOptions) -> cppsig::Result<ScanReport> {
    let fixture = Fixture::new();
    let path = fixture.write("fixture.hpp", source);
    Scanner::new(options)?.scan(&path)
}

/// Scan a single header with the default options.
pub fn scan(source: &str) -> ScanReport {
    scan_with(source, &ScanOptions::default()).unwrap()
}

/// Method table of `class`, with the external type names.
pub fn rows(report: &ScanReport, class: &str) -> Vec<MethodRow> {
    let record = report
        .class(class)
        .unwrap_or_else(|| panic!("class {class} not found"));
    methods_frame(record, true)
}
