use clap::{Parser, Subcommand};
use log::{LevelFilter, info};
use std::{fs::File, path::PathBuf};
use threadlab::start;
use threadlab_database::{config::ThreadlabConfig, error::BackendResult};
use threadlab_discussion::responses::{merge, read_logs, read_survey, write_merged};

#[derive(Parser)]
#[command(name = "threadlab", version, about = "Comment display experiments on news articles")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the http server (default).
    Serve,
    /// Print the default configuration with documentation.
    PrintConfig,
    /// Add survey answers to an interaction log export.
    MergeResponses {
        /// Survey export with three header rows and a ResponseId column.
        #[arg(long)]
        survey: PathBuf,
        /// Interaction logs as exported by the dashboard in csv format.
        #[arg(long)]
        logs: PathBuf,
        /// Where to write the merged csv.
        #[arg(long, default_value = "merged_data.csv")]
        output: PathBuf,
    },
}

#[tokio::main]
pub async fn main() -> BackendResult<()> {
    let cli = Cli::parse();

    env_logger::builder()
        .filter_level(LevelFilter::Warn)
        .filter_module("threadlab", LevelFilter::Debug)
        .init();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let config = ThreadlabConfig::read()?;
            start(config, None, None).await?;
        }
        Command::PrintConfig => {
            println!("{}", doku::to_toml::<ThreadlabConfig>());
        }
        Command::MergeResponses {
            survey,
            logs,
            output,
        } => {
            let survey = read_survey(File::open(survey)?)?;
            info!("Loaded {} survey responses", survey.len());
            let logs = read_logs(File::open(logs)?)?;
            info!("Loaded {} log entries", logs.len());
            let report = merge(&survey, logs);
            write_merged(&report.rows, File::create(&output)?)?;
            info!("Merged data written to {}", output.display());
            println!("{report}");
        }
    }
    Ok(())
}
