//! `.cppsig.toml` configuration.

mod core;
mod loader;

pub use self::core::{default_include_templates, default_std_types, CppsigConfig};
pub use loader::{
    directory_ancestors, load_config, load_config_from, load_config_from_dir, parse_config,
    CONFIG_FILE_NAME,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use crate::signature::{CollisionPolicy, ErrorPolicy, RecordPolicy};
    use indoc::indoc;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, CppsigConfig::default());
        assert!(config.include_templates);
        assert!(config.std_types);
    }

    #[test]
    fn test_full_config() {
        let config = parse_config(indoc! {r#"
            compiler_args = ["-DWITH_DAC"]
            include_dirs = ["include"]
            include_templates = false
            std_types = false
            record_policy = "strict"
            on_error = "abort"
            collisions = "reject"

            [typedefs]
            real_t = "double"
        "#})
        .unwrap();

        assert!(!config.include_templates);
        assert_eq!(config.record_policy, RecordPolicy::Strict);
        assert_eq!(config.on_error, ErrorPolicy::Abort);
        assert_eq!(config.collisions, CollisionPolicy::Reject);
        assert_eq!(config.typedefs.get("real_t").map(String::as_str), Some("double"));

        let options = config.scan_options();
        assert_eq!(options.compiler_args, vec!["-Iinclude", "-DWITH_DAC"]);
        assert!(!options.include_templates);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            parse_config("on_error = \"retry\""),
            Err(Error::Toml(_))
        ));
        assert!(matches!(
            parse_config("[typedefs]\nthing = \"Widget\""),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_directory_ancestors() {
        let dirs: Vec<_> = directory_ancestors(PathBuf::from("/a/b/c"), 10).collect();
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("/a/b/c"),
                PathBuf::from("/a/b"),
                PathBuf::from("/a"),
                PathBuf::from("/"),
            ]
        );
        assert_eq!(directory_ancestors(PathBuf::from("/a/b/c"), 2).count(), 2);
    }

    #[test]
    fn test_config_found_in_ancestor() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "std_types = false\n").unwrap();
        let nested = dir.path().join("src").join("hw");
        fs::create_dir_all(&nested).unwrap();

        let config = load_config_from_dir(&nested);
        assert!(!config.std_types);
    }

    #[test]
    fn test_explicit_config_errors() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            load_config_from(&missing),
            Err(Error::FileSystem { .. })
        ));
    }
}
