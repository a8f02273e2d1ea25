//! flowgate command line interface.

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;
mod commands;
mod tracing;

use crate::cli::{Cli, Commands};
use crate::commands::{CompileOptions, Compiled, GateOptions};
use crate::tracing::TracingConfig;

fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    if let Err(error) = run() {
        eprintln!("{error:?}");
        std::process::exit(1);
    }
}

fn run() -> miette::Result<()> {
    let cli = cli::parse();

    crate::tracing::init_tracing(TracingConfig {
        format: cli.log_format,
        level: cli.log_level.into(),
        ..Default::default()
    })?;

    execute(cli.command)
}

fn execute(command: Commands) -> miette::Result<()> {
    match command {
        Commands::Compile {
            files,
            output_dir,
            stdout,
            runner,
        } => {
            let results = commands::compile(&CompileOptions {
                files,
                output_dir,
                stdout,
                runner,
            })?;
            for result in results {
                match result {
                    Compiled::Yaml(yaml) => print!("{yaml}"),
                    Compiled::Written(path) => eprintln!("Wrote {}", path.display()),
                }
            }
        }
        Commands::Gate {
            command,
            other_events,
            labels,
            mixed_labels,
            if_condition,
        } => {
            let condition = commands::gate(&GateOptions {
                command,
                other_events,
                labels,
                mixed_labels,
                if_condition,
            })?;
            match condition {
                Some(condition) => println!("{condition}"),
                None => ::tracing::warn!("No gating policy given; the job runs unconditionally"),
            }
        }
    }
    Ok(())
}
