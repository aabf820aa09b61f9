use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use quiz_engine::{
    load_quiz_json, load_quiz_text, write_quiz_text, ApiClient, CooldownService, QuizId, Settings,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a plain-text quiz and print it as JSON
    Parse {
        file: PathBuf,
        /// Print the JSON on a single line
        #[arg(long)]
        compact: bool,
    },
    /// Parse a plain-text quiz and list what blocks publishing it
    Check { file: PathBuf },
    /// Print a JSON quiz document in the plain-text format
    Format { file: PathBuf },
    /// Ask the API whether a quiz can be attempted right now
    Cooldown { quiz_id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "quiz_engine=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Command::Parse { file, compact } => {
            let quiz = load_quiz_text(&file)?;
            let json = if compact {
                serde_json::to_string(&quiz)?
            } else {
                serde_json::to_string_pretty(&quiz)?
            };
            println!("{}", json);
        }
        Command::Check { file } => {
            let quiz = load_quiz_text(&file)?;
            let problems = quiz.publish_problems();
            if problems.is_empty() {
                println!(
                    "{}: ready to publish ({} questions)",
                    file.display(),
                    quiz.questions.len()
                );
            } else {
                for problem in &problems {
                    println!("{}: {}", file.display(), problem);
                }
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Format { file } => {
            let quiz = load_quiz_json(&file)?;
            print!("{}", write_quiz_text(&quiz));
        }
        Command::Cooldown { quiz_id } => {
            let client = ApiClient::new(args.settings.api_context()?);
            let status = client
                .get_cooldown_status(&QuizId::new(quiz_id))
                .await
                .context("cooldown lookup failed")?;
            match status.next_attempt_at {
                _ if status.can_attempt => println!("quiz can be attempted now"),
                Some(at) => println!("quiz is in cooldown until {}", at.to_rfc3339()),
                None => println!("quiz is in cooldown"),
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
