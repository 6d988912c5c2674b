use clap::{Parser, Subcommand, ValueEnum};
use concord::governance::VoteChoice;
use concord::identity::{Address, ForumId, PollId, RegistryId};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

pub mod config;
pub mod forum;
pub mod init;
pub mod poll;
pub mod secret;
pub mod session;
pub mod status;
pub mod version;

#[derive(Parser)]
#[command(name = "concord")]
#[command(author = "Concord Project")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Operator CLI for Concord forum governance", long_about = None)]
pub struct Cli {
    /// Path to config file (default: ~/.local/share/concord/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Operation time in milliseconds since the Unix epoch (default: wall clock)
    #[arg(long, global = true)]
    pub now: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Ballot choice as typed on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChoiceArg {
    Yes,
    No,
}

impl From<ChoiceArg> for VoteChoice {
    fn from(choice: ChoiceArg) -> Self {
        match choice {
            ChoiceArg::Yes => VoteChoice::Yes,
            ChoiceArg::No => VoteChoice::No,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default config and an empty ledger
    Init {
        /// Ledger snapshot path (default: next to the config file)
        #[arg(long)]
        ledger_path: Option<PathBuf>,

        /// Replace an existing ledger with an empty one
        #[arg(long)]
        force: bool,
    },

    /// Create a forum protected by a shared secret
    CreateForum {
        /// Caller address (0x-prefixed hex, or a label hashed into an address)
        #[arg(long, value_parser = parse_caller)]
        caller: Address,

        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Path to file containing the forum secret (prompts if omitted)
        #[arg(long)]
        secret_file: Option<PathBuf>,
    },

    /// Create the member registry of a forum
    InitRegistry {
        #[arg(long, value_parser = parse_caller)]
        caller: Address,

        #[arg(long)]
        forum: ForumId,
    },

    /// Join a forum by presenting its secret
    Join {
        #[arg(long, value_parser = parse_caller)]
        caller: Address,

        #[arg(long)]
        forum: ForumId,

        /// Member registry (default: the one linked to the forum)
        #[arg(long)]
        registry: Option<RegistryId>,

        /// Path to file containing the forum secret (prompts if omitted)
        #[arg(long)]
        secret_file: Option<PathBuf>,
    },

    /// Open a poll proposing a new forum name and description
    Propose {
        #[arg(long, value_parser = parse_caller)]
        caller: Address,

        #[arg(long)]
        forum: ForumId,

        /// Member registry (default: the one linked to the forum)
        #[arg(long)]
        registry: Option<RegistryId>,

        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Forum name applied if the poll passes
        #[arg(long)]
        new_name: String,

        /// Forum description applied if the poll passes
        #[arg(long, default_value = "")]
        new_description: String,

        /// Voting window, e.g. "48h" or "30m"
        #[arg(long)]
        duration: humantime::Duration,
    },

    /// Create the vote registry of a poll
    InitVotes {
        #[arg(long, value_parser = parse_caller)]
        caller: Address,

        #[arg(long)]
        poll: PollId,
    },

    /// Cast a ballot
    Vote {
        #[arg(long, value_parser = parse_caller)]
        caller: Address,

        #[arg(long)]
        poll: PollId,

        #[arg(long, value_enum)]
        choice: ChoiceArg,

        /// Vote registry (default: the one linked to the poll)
        #[arg(long)]
        votes: Option<RegistryId>,

        /// Member registry (default: the one linked to the poll's forum)
        #[arg(long)]
        registry: Option<RegistryId>,
    },

    /// Close an ended poll and apply it if it passed
    Execute {
        #[arg(long, value_parser = parse_caller)]
        caller: Address,

        #[arg(long)]
        poll: PollId,

        /// Forum (default: the poll's forum)
        #[arg(long)]
        forum: Option<ForumId>,
    },

    /// Show forums, or one forum with its polls
    Status {
        #[arg(long)]
        forum: Option<ForumId>,
    },

    /// Display version information
    Version,
}

/// Parse `--caller`: hex addresses verbatim, anything else as a label.
pub fn parse_caller(value: &str) -> Result<Address, String> {
    if value.starts_with("0x") {
        value.parse().map_err(|e| format!("invalid address: {}", e))
    } else if value.is_empty() {
        Err("caller cannot be empty".to_string())
    } else {
        Ok(Address::from_label(value))
    }
}

/// Host wall clock in milliseconds.
fn wall_clock_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

pub fn resolve_config_path(config: Option<PathBuf>) -> PathBuf {
    config.unwrap_or_else(config::default_config_path)
}

pub async fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = resolve_config_path(cli.config);
    let now = cli.now.unwrap_or_else(wall_clock_millis);

    match cli.command {
        Commands::Init { ledger_path, force } => init::execute(&config_path, ledger_path, force)?,
        Commands::CreateForum {
            caller,
            name,
            description,
            secret_file,
        } => forum::create(&config_path, caller, name, description, secret_file, now)?,
        Commands::InitRegistry { caller, forum } => {
            forum::init_registry(&config_path, caller, forum, now)?
        }
        Commands::Join {
            caller,
            forum,
            registry,
            secret_file,
        } => forum::join(&config_path, caller, forum, registry, secret_file, now)?,
        Commands::Propose {
            caller,
            forum,
            registry,
            title,
            description,
            new_name,
            new_description,
            duration,
        } => poll::propose(
            &config_path,
            caller,
            forum,
            registry,
            poll::ProposalArgs {
                title,
                description,
                new_name,
                new_description,
                duration: duration.into(),
            },
            now,
        )?,
        Commands::InitVotes { caller, poll } => {
            poll::init_votes(&config_path, caller, poll, now)?
        }
        Commands::Vote {
            caller,
            poll,
            choice,
            votes,
            registry,
        } => poll::vote(
            &config_path,
            caller,
            poll,
            choice.into(),
            votes,
            registry,
            now,
        )?,
        Commands::Execute {
            caller,
            poll,
            forum,
        } => poll::execute(&config_path, caller, poll, forum, now)?,
        Commands::Status { forum } => status::execute(&config_path, forum, now)?,
        Commands::Version => version::execute(),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_caller_label_is_stable() {
        assert_eq!(
            parse_caller("alice").unwrap(),
            Address::from_label("alice")
        );
    }

    #[test]
    fn test_parse_caller_hex() {
        let addr = Address::from_label("bob");
        assert_eq!(parse_caller(&addr.to_string()).unwrap(), addr);
    }

    #[test]
    fn test_parse_caller_rejects_bad_hex() {
        assert!(parse_caller("0xzz").is_err());
        assert!(parse_caller("").is_err());
    }

    #[test]
    fn test_cli_parses_vote() {
        let poll = PollId::new([7; 32]);
        let cli = Cli::try_parse_from([
            "concord",
            "--now",
            "42",
            "vote",
            "--caller",
            "alice",
            "--poll",
            &poll.to_string(),
            "--choice",
            "yes",
        ])
        .unwrap();

        assert_eq!(cli.now, Some(42));
        match cli.command {
            Commands::Vote {
                caller,
                poll: parsed,
                choice,
                votes,
                ..
            } => {
                assert_eq!(caller, Address::from_label("alice"));
                assert_eq!(parsed, poll);
                assert_eq!(choice, ChoiceArg::Yes);
                assert!(votes.is_none());
            }
            _ => panic!("expected vote command"),
        }
    }

    #[test]
    fn test_cli_parses_humantime_duration() {
        let forum = ForumId::new([1; 32]);
        let cli = Cli::try_parse_from([
            "concord",
            "propose",
            "--caller",
            "alice",
            "--forum",
            &forum.to_string(),
            "--title",
            "Rename",
            "--new-name",
            "Beta",
            "--duration",
            "48h",
        ])
        .unwrap();

        match cli.command {
            Commands::Propose { duration, .. } => {
                let duration: std::time::Duration = duration.into();
                assert_eq!(duration.as_secs(), 48 * 3600);
            }
            _ => panic!("expected propose command"),
        }
    }
}
