use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use super::core::CppsigConfig;
use crate::errors::{Error, Result};
use crate::frontend::builtins;
use tracing::{debug, warn};

pub const CONFIG_FILE_NAME: &str = ".cppsig.toml";

const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Read the raw contents of a config file
pub(crate) fn read_config_file(path: &Path) -> std::io::Result<String> {
    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Parse and validate config from a TOML string
pub fn parse_config(contents: &str) -> Result<CppsigConfig> {
    let config = toml::from_str::<CppsigConfig>(contents)?;

    for (name, spelling) in &config.typedefs {
        if builtins::kind_from_spelling(spelling).is_none() {
            return Err(Error::Configuration(format!(
                "typedef `{name}` maps to `{spelling}`, which is not a builtin type"
            )));
        }
    }

    Ok(config)
}

/// Load an explicitly named config file; every failure is an error
pub fn load_config_from(path: &Path) -> Result<CppsigConfig> {
    let contents = read_config_file(path).map_err(|err| {
        Error::file_system(format!("cannot read config {}", path.display()), path, err)
    })?;
    let config = parse_config(&contents)?;
    debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Try loading a config discovered during the ancestor search
pub(crate) fn try_load_config_from_path(config_path: &Path) -> Option<CppsigConfig> {
    let contents = match read_config_file(config_path) {
        Ok(contents) => contents,
        Err(e) => {
            handle_read_error(config_path, &e);
            return None;
        }
    };

    match parse_config(&contents) {
        Ok(config) => {
            debug!(path = %config_path.display(), "loaded config");
            Some(config)
        }
        Err(e) => {
            warn!(path = %config_path.display(), error = %e, "invalid config, using defaults");
            None
        }
    }
}

/// Only log actual errors, not "file not found"
pub(crate) fn handle_read_error(config_path: &Path, error: &std::io::Error) {
    if error.kind() != std::io::ErrorKind::NotFound {
        warn!(path = %config_path.display(), error = %error, "failed to read config file");
    }
}

/// `start` and its ancestors, at most `max_depth` of them
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Search `start` and its ancestors for `.cppsig.toml`
pub fn load_config_from_dir(start: &Path) -> CppsigConfig {
    directory_ancestors(start.to_path_buf(), MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find_map(|path| try_load_config_from_path(&path))
        .unwrap_or_else(|| {
            debug!(
                depth = MAX_TRAVERSAL_DEPTH,
                "no config found, using default config"
            );
            CppsigConfig::default()
        })
}

pub fn load_config() -> CppsigConfig {
    match std::env::current_dir() {
        Ok(current) => load_config_from_dir(&current),
        Err(e) => {
            warn!(error = %e, "failed to get current directory, using default config");
            CppsigConfig::default()
        }
    }
}
