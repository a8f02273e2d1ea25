use crate::tracing::{LogLevel, TracingFormat};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "flowgate")]
#[command(about = "Compile markdown agent workflows into gated GitHub Actions workflows")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        short = 'l',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub log_level: LogLevel,

    #[arg(
        long,
        global = true,
        help = "Log output format",
        default_value = "compact",
        value_enum
    )]
    pub log_format: TracingFormat,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Compile workflow documents into <name>.lock.yml files")]
    Compile {
        #[arg(required = true, help = "Markdown workflow files")]
        files: Vec<PathBuf>,
        #[arg(long, help = "Write compiled workflows here instead of beside each source")]
        output_dir: Option<PathBuf>,
        #[arg(long, help = "Print compiled workflows to stdout", conflicts_with = "output_dir")]
        stdout: bool,
        #[arg(long, help = "Runner label for generated jobs", default_value = "ubuntu-latest")]
        runner: String,
    },
    #[command(about = "Print the gating condition for a set of policies")]
    Gate {
        #[arg(long, help = "Command word that must be mentioned as /NAME")]
        command: Option<String>,
        #[arg(long, help = "The workflow also runs on events without a comment body")]
        other_events: bool,
        #[arg(long = "label", value_name = "NAME", help = "Label names that gate labeling events")]
        labels: Vec<String>,
        #[arg(long, help = "Triggers mix labeling actions with other events")]
        mixed_labels: bool,
        #[arg(long = "if", value_name = "EXPR", help = "User condition merged first")]
        if_condition: Option<String>,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::try_parse_from(["flowgate", "compile", "a.md"]).unwrap();

        assert_eq!(cli.log_level, LogLevel::Warn);
        assert_eq!(cli.log_format, TracingFormat::Compact);
        let Commands::Compile {
            files,
            output_dir,
            stdout,
            runner,
        } = cli.command
        else {
            panic!("expected compile");
        };
        assert_eq!(files, vec![PathBuf::from("a.md")]);
        assert!(output_dir.is_none());
        assert!(!stdout);
        assert_eq!(runner, "ubuntu-latest");
    }

    #[test]
    fn test_compile_requires_files() {
        assert!(Cli::try_parse_from(["flowgate", "compile"]).is_err());
    }

    #[test]
    fn test_stdout_conflicts_with_output_dir() {
        let result =
            Cli::try_parse_from(["flowgate", "compile", "a.md", "--stdout", "--output-dir", "out"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_log_flags() {
        let cli = Cli::try_parse_from([
            "flowgate",
            "gate",
            "--command",
            "deploy",
            "-l",
            "debug",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.log_level, LogLevel::Debug);
        assert_eq!(cli.log_format, TracingFormat::Json);
    }

    #[test]
    fn test_gate_repeated_labels() {
        let cli = Cli::try_parse_from([
            "flowgate",
            "gate",
            "--label",
            "bug",
            "--label",
            "urgent",
            "--mixed-labels",
            "--if",
            "github.actor != 'bot'",
        ])
        .unwrap();

        let Commands::Gate {
            command,
            labels,
            mixed_labels,
            if_condition,
            ..
        } = cli.command
        else {
            panic!("expected gate");
        };
        assert!(command.is_none());
        assert_eq!(labels, vec!["bug", "urgent"]);
        assert!(mixed_labels);
        assert_eq!(if_condition.as_deref(), Some("github.actor != 'bot'"));
    }

    #[test]
    fn test_invalid_log_level() {
        let result = Cli::try_parse_from(["flowgate", "--log-level", "loud", "compile", "a.md"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_subcommand() {
        assert!(Cli::try_parse_from(["flowgate"]).is_err());
    }
}
