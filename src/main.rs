use anyhow::Result;
use cppsig::cli::{self, Commands};
use cppsig::commands::{self, ClassesConfig, MethodsConfig};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = cli::parse_args();
    cli::init_tracing(cli.verbosity);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Methods {
            scan,
            class,
            format,
            output,
            raw_types,
            strict,
        } => commands::handle_methods(MethodsConfig {
            scan,
            class,
            format,
            output,
            raw_types,
            strict,
        }),
        Commands::Classes {
            scan,
            format,
            output,
        } => commands::list_classes(ClassesConfig {
            scan,
            format,
            output,
        }),
        Commands::Init { force } => commands::init_config(force),
    }
}
