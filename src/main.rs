use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use git_changelog::cli::{self, InitArgs, ShowArgs};
use git_changelog::ui;

#[derive(Parser)]
#[command(
    name = "git-changelog",
    about = "Generate a changelog from git history, grouped by release tag and section"
)]
struct Args {
    #[arg(short, long, global = true, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(long, global = true, help = "Log debug details and show error causes")]
    debug: bool,

    #[arg(short, long, help = "Print version information")]
    version: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the changelog (default)
    Show {
        /// Revisions to include: `HEAD`, `0.1..0.2`, `^0.1`, `a...b`
        revlist: Vec<String>,
    },
    /// Write the reference configuration to the repository root
    Init,
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(args: Args) -> Result<()> {
    let repo_path = PathBuf::from(".");
    match args.command.unwrap_or(Command::Show { revlist: Vec::new() }) {
        Command::Show { revlist } => {
            let show = ShowArgs {
                repo_path,
                config_path: args.config,
                revlist,
            };
            let document = cli::run_show(&show, &mut ui::display_warning)?;
            ui::print_document(&document)?;
        }
        Command::Init => {
            let path = cli::run_init(&InitArgs { repo_path })?;
            ui::display_success(&format!("Created {}", path.display()));
        }
    }
    Ok(())
}

fn main() {
    let args = Args::parse();

    if args.version {
        println!("git-changelog {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let debug = args.debug;
    init_tracing(debug);

    if let Err(e) = run(args) {
        ui::display_error(&e.to_string());
        if debug {
            for cause in e.chain().skip(1) {
                ui::display_cause(&cause.to_string());
            }
        }
        std::process::exit(1);
    }
}
