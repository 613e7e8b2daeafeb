//! CLI command implementations for cppsig.
//!
//! Available commands:
//! - **methods**: Print method tables for the classes of one or more files
//! - **classes**: List the classes found in one or more files
//! - **init**: Initialize a new cppsig configuration file

pub mod classes;
pub mod init;
pub mod methods;

pub use classes::{list_classes, ClassesConfig};
pub use init::init_config;
pub use methods::{handle_methods, MethodsConfig};

use crate::cli::ScanArgs;
use crate::config::{self, CppsigConfig};
use crate::scan::ScanOptions;
use anyhow::{Context, Result};

/// Configuration for a run: the explicit `--config` file, or the nearest
/// `.cppsig.toml`.
pub(crate) fn load_run_config(scan: &ScanArgs) -> Result<CppsigConfig> {
    match &scan.config {
        Some(path) => config::load_config_from(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(config::load_config()),
    }
}

/// Scan options from the configuration with the command-line overrides
/// applied on top.
pub(crate) fn scan_options(config: &CppsigConfig, scan: &ScanArgs) -> ScanOptions {
    let mut options = config.scan_options();
    if scan.no_templates {
        options.include_templates = false;
    }
    options.compiler_args.extend(scan.compiler_args.iter().cloned());
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_cli_overrides_config() {
        let config = CppsigConfig {
            compiler_args: vec!["-DFROM_CONFIG".to_string()],
            ..CppsigConfig::default()
        };
        let scan = ScanArgs {
            files: vec![PathBuf::from("a.hpp")],
            config: None,
            no_templates: true,
            jobs: 0,
            compiler_args: vec!["-Iinclude".to_string()],
        };

        let options = scan_options(&config, &scan);
        assert!(!options.include_templates);
        assert_eq!(options.compiler_args, vec!["-DFROM_CONFIG", "-Iinclude"]);
    }
}
