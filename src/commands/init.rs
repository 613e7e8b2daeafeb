use crate::config::CONFIG_FILE_NAME;
use crate::io;
use anyhow::Result;
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# cppsig configuration

# Extra compiler arguments, e.g. ["-DWITH_DAC"]
compiler_args = []
include_dirs = []

include_templates = true
# Write atoms as int32_t/double rather than int32/float64
std_types = true

# opaque | strict
record_policy = "opaque"
# skip | abort
on_error = "skip"
# overwrite | reject
collisions = "overwrite"

[typedefs]
# real_t = "double"
"#;

pub fn init_config(force: bool) -> Result<()> {
    init_config_in(Path::new("."), force)
}

pub fn init_config_in(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!("Configuration file already exists. Use --force to overwrite.");
    }

    io::write_file(&config_path, DEFAULT_CONFIG)?;
    println!("Created {CONFIG_FILE_NAME} configuration file");

    Ok(())
}
