use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use noteref::commands::{self, OutputFormat};
use noteref::diagnostics;
use noteref::error::Error;
use noteref::watch;
use noteref::workspace::Workspace;
use tracing_subscriber::EnvFilter;

/// Command-line arguments.
#[derive(Parser)]
#[command(name = "noteref", about = "Cross-references and labels for markdown notes")]
struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
    /// Workspace root.
    #[arg(long, short = 'C', default_value = ".", global = true)]
    root: PathBuf,
}

/// Top-level commands.
#[derive(Subcommand)]
enum Commands {
    /// Report references to missing files and labels missing from the tree
    Check {
        /// Output format.
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Rename a heading and update every link to its anchor
    Heading {
        /// Document holding the heading.
        #[arg(index = 1)]
        file: PathBuf,
        /// New heading text.
        #[arg(index = 3)]
        new: String,
        /// Current heading text.
        #[arg(index = 2)]
        old: String,
    },
    /// Work with the label tree
    Labels {
        /// Label subcommand.
        #[command(subcommand)]
        command: LabelCommands,
    },
    /// Move a file or directory and rewrite the links affected
    Mv {
        /// New location.
        #[arg(index = 2)]
        new: PathBuf,
        /// Current location.
        #[arg(index = 1)]
        old: PathBuf,
    },
    /// List references to a file or directory
    Refs {
        /// Only references with this fragment.
        #[arg(long)]
        fragment: Option<String>,
        /// Referenced file or directory.
        target: PathBuf,
    },
    /// Keep the index live and print diagnostics as files change
    Watch,
}

/// Commands under `labels`.
#[derive(Subcommand)]
enum LabelCommands {
    /// Rewrite a document's labels to their shortest unique paths
    Minimize {
        /// Document to rewrite.
        file: PathBuf,
    },
    /// Rename a label and migrate every annotation using it
    Rename {
        /// New name for the label.
        #[arg(index = 2)]
        new_name: String,
        /// Dotted path of the label.
        #[arg(index = 1)]
        path: String,
    },
    /// Write a report of the sections carrying the given labels
    Report {
        /// Require every label instead of any.
        #[arg(long)]
        intersection: bool,
        /// Also print the report as JSON.
        #[arg(long)]
        json: bool,
        /// Dotted label paths.
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Print the label tree
    Tree {
        /// Print each label's full and shortest unique path instead.
        #[arg(long)]
        paths: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| return EnvFilter::new("warn")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            diagnostics::print_error(&Error::from(e));
            return ExitCode::FAILURE;
        },
    };

    return match runtime.block_on(run(cli)) {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::FAILURE
        },
    };
}

/// Open the workspace and dispatch one command.
///
/// # Errors
///
/// Returns whatever the command fails with.
async fn run(cli: Cli) -> Result<ExitCode, Error> {
    let workspace = Workspace::open(&cli.root)?;
    return match cli.command {
        Commands::Check { format } => commands::check(&workspace, format).await,
        Commands::Heading { file, new, old } => commands::heading(&workspace, &file, &old, &new).await,
        Commands::Labels { command } => match command {
            LabelCommands::Minimize { file } => commands::labels_minimize(&workspace, &file).await,
            LabelCommands::Rename { new_name, path } => commands::labels_rename(&workspace, &path, &new_name).await,
            LabelCommands::Report {
                intersection,
                json,
                paths,
            } => commands::labels_report(&workspace, &paths, intersection, json).await,
            LabelCommands::Tree { paths } => commands::labels_tree(&workspace, paths).await,
        },
        Commands::Mv { new, old } => commands::mv(&workspace, &old, &new).await,
        Commands::Refs { fragment, target } => Ok(commands::refs(&workspace, &target, fragment.as_deref()).await),
        Commands::Watch => watch::run(&workspace).await,
    };
}
