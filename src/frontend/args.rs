//! Compiler-style argument handling (`-x c++ -I include -DNAME`).

use crate::errors::{Error, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

/// Arguments prepended to whatever the caller passes.
pub const DEFAULT_ARGS: [&str; 2] = ["-x", "c++"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceLanguage {
    C,
    #[default]
    Cxx,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilerArgs {
    pub language: SourceLanguage,
    /// `-I` directories, searched for both include forms.
    pub include_dirs: Vec<PathBuf>,
    /// `-isystem` directories, searched after `include_dirs`.
    pub system_include_dirs: Vec<PathBuf>,
    /// `-D` macros, consulted when evaluating conditional blocks.
    pub defines: HashMap<String, String>,
}

impl CompilerArgs {
    /// Parse `args` after [`DEFAULT_ARGS`].
    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = DEFAULT_ARGS
            .iter()
            .map(|arg| arg.to_string())
            .chain(args.into_iter().map(|arg| arg.as_ref().to_string()))
            .collect();

        let mut parsed = CompilerArgs::default();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            if let Some(value) = flag_value(arg, "-x", &mut iter)? {
                parsed.language = parse_language(&value)?;
            } else if let Some(value) = flag_value(arg, "-isystem", &mut iter)? {
                parsed.system_include_dirs.push(PathBuf::from(value));
            } else if let Some(value) = flag_value(arg, "-I", &mut iter)? {
                parsed.include_dirs.push(PathBuf::from(value));
            } else if let Some(value) = flag_value(arg, "-D", &mut iter)? {
                let (name, body) = value.split_once('=').unwrap_or((value.as_str(), "1"));
                parsed.defines.insert(name.to_string(), body.to_string());
            } else if let Some(value) = flag_value(arg, "-U", &mut iter)? {
                parsed.defines.remove(&value);
            } else if arg.starts_with("-std=") {
                debug!(arg = %arg, "language standard is not used");
            } else {
                debug!(arg = %arg, "ignoring compiler argument");
            }
        }
        Ok(parsed)
    }

    /// Every directory searched for `#include <...>`, in search order.
    pub fn search_dirs(&self) -> impl Iterator<Item = &PathBuf> {
        self.include_dirs.iter().chain(&self.system_include_dirs)
    }
}

/// Value of `flag` given either joined (`-Idir`) or separate (`-I dir`).
fn flag_value<'a>(
    arg: &str,
    flag: &str,
    rest: &mut impl Iterator<Item = &'a String>,
) -> Result<Option<String>> {
    if arg == flag {
        return rest
            .next()
            .map(|value| Some(value.clone()))
            .ok_or_else(|| Error::InvalidArgument(format!("`{flag}` expects a value")));
    }
    Ok(arg
        .strip_prefix(flag)
        .filter(|value| !value.is_empty())
        .map(str::to_string))
}

fn parse_language(value: &str) -> Result<SourceLanguage> {
    match value {
        "c++" | "c++-header" => Ok(SourceLanguage::Cxx),
        "c" | "c-header" => Ok(SourceLanguage::C),
        other => Err(Error::InvalidArgument(format!(
            "unsupported language `{other}`, expected `c` or `c++`"
        ))),
    }
}
