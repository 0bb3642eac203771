use crate::dashboard::{self, Dashboard};
use crate::records::directory::ListingKind;
use crate::submit::Submission;
use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "work24", version)]
#[command(
    about = "Admin inbox for Work24 marketplace submissions",
    long_about = "work24 stores marketplace submissions (worker registrations, material listings, career applications, architect inquiries, contact requests) and renders them for operators, classifying untyped payloads by origin."
)]
#[command(arg_required_else_help = true)]
#[command(after_long_help = "Examples:
  work24 submit career --name Asha --mobile 9876543210 --skills Plumbing --experience \"5 years\"
  work24 inbox
  work24 show 3 --raw
  work24 classify '{\"projectType\":\"villa\"}'
  work24 delete 3
  work24 workers list --category plumbing --public
  work24 completion zsh > ~/.zsh/completions/_work24")]
struct Cli {
    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Path to inbox DB (default: $XDG_STATE_HOME/work24/inbox.db)"
    )]
    state_db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct ViewArgs {
    #[arg(long, help = "Show the verbatim payload instead of formatted fields")]
    raw: bool,
    #[arg(long, help = "Print views as JSON")]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Record a structured submission")]
    #[command(arg_required_else_help = true)]
    Submit {
        #[command(subcommand)]
        submission: Submission,
    },
    #[command(about = "Record a plain-text message")]
    #[command(arg_required_else_help = true)]
    Post {
        #[arg(long, value_name = "TEXT", help = "Message text")]
        text: String,
        #[arg(long, value_name = "NAME", help = "Sender display name")]
        name: Option<String>,
    },
    #[command(about = "List messages, newest first")]
    Inbox {
        #[command(flatten)]
        view: ViewArgs,
    },
    #[command(about = "Show a single message")]
    #[command(arg_required_else_help = true)]
    Show {
        #[arg(value_name = "ID", help = "Message ID")]
        id: i64,
        #[command(flatten)]
        view: ViewArgs,
    },
    #[command(
        about = "Classify a payload without storing it",
        long_about = "Classify a payload given as an argument, or read from stdin when omitted, and print the rendered view as JSON."
    )]
    Classify {
        #[arg(value_name = "TEXT", help = "Payload text (stdin when omitted)")]
        text: Option<String>,
    },
    #[command(about = "Delete a message")]
    #[command(arg_required_else_help = true)]
    Delete {
        #[arg(value_name = "ID", help = "Message ID")]
        id: i64,
    },
    #[command(about = "Delete every message")]
    Clear {
        #[arg(long, help = "Confirm deletion")]
        yes: bool,
    },
    #[command(about = "Browse or prune the worker directory")]
    #[command(arg_required_else_help = true)]
    Workers {
        #[command(subcommand)]
        action: ListingAction,
    },
    #[command(about = "Browse or prune the material directory")]
    #[command(arg_required_else_help = true)]
    Materials {
        #[command(subcommand)]
        action: ListingAction,
    },
    #[command(about = "Count messages by origin and directory entries")]
    Summary,
    #[command(about = "Read or change saved preferences")]
    #[command(arg_required_else_help = true)]
    #[command(after_long_help = "Example:
  work24 prefs set view raw")]
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
    #[command(
        about = "Generate shell completion script",
        long_about = "Generate shell completion script for your shell. Redirect output to your shell completion directory."
    )]
    #[command(arg_required_else_help = true)]
    Completion {
        #[arg(value_enum, value_name = "SHELL", help = "Target shell")]
        shell: Shell,
    },
    #[command(
        about = "Generate a man page",
        long_about = "Generate a roff man page for work24."
    )]
    Man {
        #[arg(
            long,
            value_name = "PATH",
            help = "Write man page to file (stdout when omitted)"
        )]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum ListingAction {
    #[command(about = "List entries, newest first")]
    List {
        #[arg(long, value_name = "CATEGORY", help = "Only entries in this category")]
        category: Option<String>,
        #[arg(long, help = "Omit contact details")]
        public: bool,
        #[arg(long, help = "Print entries as JSON")]
        json: bool,
    },
    #[command(about = "Delete an entry")]
    #[command(arg_required_else_help = true)]
    Delete {
        #[arg(value_name = "ID", help = "Entry ID")]
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
enum PrefsAction {
    #[command(about = "Print a preference")]
    Get {
        #[arg(value_name = "KEY")]
        key: String,
    },
    #[command(about = "Save a preference")]
    Set {
        #[arg(value_name = "KEY")]
        key: String,
        #[arg(value_name = "VALUE")]
        value: String,
    },
    #[command(about = "Remove every saved preference")]
    Clear,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let root = Path::new(".");
    let state_db = cli.state_db;
    match cli.command {
        Commands::Submit { submission } => {
            Dashboard::open(root, state_db)?.submit(submission)?;
            Ok(())
        }
        Commands::Post { text, name } => {
            Dashboard::open(root, state_db)?.post(&text, name.as_deref())?;
            Ok(())
        }
        Commands::Inbox { view } => {
            Dashboard::open(root, state_db)?.list(view.raw, view.json)?;
            Ok(())
        }
        Commands::Show { id, view } => {
            Dashboard::open(root, state_db)?.show(id, view.raw, view.json)?;
            Ok(())
        }
        Commands::Classify { text } => dashboard::classify_text(root, text),
        Commands::Delete { id } => Dashboard::open(root, state_db)?.delete(id),
        Commands::Clear { yes } => {
            Dashboard::open(root, state_db)?.clear(yes)?;
            Ok(())
        }
        Commands::Workers { action } => {
            let dash = Dashboard::open(root, state_db)?;
            match action {
                ListingAction::List {
                    category,
                    public,
                    json,
                } => dash.workers(category.as_deref(), public, json).map(|_| ()),
                ListingAction::Delete { id } => dash.delete_listing(ListingKind::Worker, id),
            }
        }
        Commands::Materials { action } => {
            let dash = Dashboard::open(root, state_db)?;
            match action {
                ListingAction::List {
                    category,
                    public,
                    json,
                } => dash.materials(category.as_deref(), public, json).map(|_| ()),
                ListingAction::Delete { id } => dash.delete_listing(ListingKind::Material, id),
            }
        }
        Commands::Summary => Dashboard::open(root, state_db)?.summary(),
        Commands::Prefs { action } => {
            let dash = Dashboard::open(root, state_db)?;
            match action {
                PrefsAction::Get { key } => dash.get_pref(&key).map(|_| ()),
                PrefsAction::Set { key, value } => dash.set_pref(&key, &value),
                PrefsAction::Clear => dash.clear_prefs().map(|_| ()),
            }
        }
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        Commands::Man { output } => {
            let man = clap_mangen::Man::new(Cli::command());
            match output {
                Some(path) => {
                    let mut bytes = Vec::new();
                    man.render(&mut bytes)?;
                    fs::write(path, bytes)?;
                }
                None => {
                    man.render(&mut io::stdout())?;
                }
            }
            Ok(())
        }
    }
}
