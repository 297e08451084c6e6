use crate::server;
use autopilot_studio::error::AppError;
use autopilot_studio::intake::scoring::ScoreInterpretation;
use autopilot_studio::intake::{IntakeSubmission, IntakeValidator};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Autopilot Studio",
    about = "Run the intake qualification service or check intake payloads from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Offline helpers for intake payloads and scores
    Intake {
        #[command(subcommand)]
        command: IntakeCommand,
    },
}

#[derive(Subcommand, Debug)]
enum IntakeCommand {
    /// Validate an intake submission stored as JSON and print the normalized form
    Validate(ValidateArgs),
    /// Explain how an overall score is labelled, coloured, and prioritized
    Interpret(InterpretArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
struct ValidateArgs {
    /// Path to a JSON intake submission
    file: PathBuf,
}

#[derive(Args, Debug)]
struct InterpretArgs {
    /// Overall score between 0 and 100
    #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
    score: u8,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Intake {
            command: IntakeCommand::Validate(args),
        } => validate_file(args),
        Command::Intake {
            command: IntakeCommand::Interpret(args),
        } => interpret_score(args),
    }
}

fn validate_file(args: ValidateArgs) -> Result<(), AppError> {
    let raw = std::fs::read_to_string(&args.file)?;
    let submission: IntakeSubmission = serde_json::from_str(&raw)?;

    match IntakeValidator.validate(submission) {
        Ok(insert) => {
            println!("{}", serde_json::to_string_pretty(&insert)?);
            Ok(())
        }
        Err(errors) => {
            for violation in &errors.violations {
                println!("{:<22} {}", violation.field, violation.message);
            }
            Err(errors.into())
        }
    }
}

fn interpret_score(args: InterpretArgs) -> Result<(), AppError> {
    let interpretation = ScoreInterpretation::of(args.score);
    println!(
        "{}/100 {} ({:?}) -> {}, {} priority",
        interpretation.score,
        interpretation.label.label(),
        interpretation.band,
        interpretation.outcome.label(),
        interpretation.priority.label(),
    );
    println!("{}", serde_json::to_string_pretty(&interpretation)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["autopilot-studio-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn interpret_rejects_scores_above_one_hundred() {
        assert!(Cli::try_parse_from(["autopilot-studio-api", "intake", "interpret", "101"]).is_err());
        let cli = Cli::try_parse_from(["autopilot-studio-api", "intake", "interpret", "72"])
            .expect("parses");
        assert!(matches!(
            cli.command,
            Some(Command::Intake {
                command: IntakeCommand::Interpret(InterpretArgs { score: 72 })
            })
        ));
    }

    #[test]
    fn validate_reports_missing_files() {
        let result = validate_file(ValidateArgs {
            file: PathBuf::from("/definitely/not/here.json"),
        });
        assert!(matches!(result, Err(AppError::Io(_))));
    }
}
