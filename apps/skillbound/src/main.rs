//! # Skillbound
//!
//! Command-line front end for the peer-evaluation ledger.
//!
//! ```text
//! skillbound init --authority root
//! skillbound mint alice --occupation pilot
//! skillbound evaluate 1 2 5 6 7 8 --caller root
//! skillbound assessment 2 0
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use skillbound::cli::{self, Backend, Store};
use skillbound::error::CliError;
use skillbound::logging::init_tracing;
use skillbound::skillbound_core::primitives::SKILL_COUNT;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "skillbound", version, about = "Peer-evaluation ledger for soulbound identities")]
struct Cli {
    /// Ledger location.
    #[arg(long, global = true, env = "SKILLBOUND_DB", default_value = "skillbound.db")]
    db: PathBuf,

    /// Storage backend.
    #[arg(long, global = true, env = "SKILLBOUND_BACKEND", value_enum, default_value_t = Backend::File)]
    backend: Backend,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ExportFormat {
    Snapshot,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new, empty ledger.
    Init {
        /// Replace an existing ledger.
        #[arg(long)]
        force: bool,
        /// JSON ledger configuration.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Initial authority (overrides the configuration).
        #[arg(long)]
        authority: Option<String>,
    },
    /// Issue a new identity to a holder.
    Mint {
        holder: String,
        #[arg(long, default_value = "")]
        occupation: String,
    },
    /// Destroy an identity (holder only).
    Burn {
        id: u64,
        #[arg(long)]
        caller: String,
    },
    /// Submit four raw points (1-10) from a rater about a subject.
    Evaluate {
        rater: u64,
        subject: u64,
        /// One point per skill, in catalog order.
        #[arg(num_args = SKILL_COUNT, required = true)]
        points: Vec<u8>,
        #[arg(long)]
        caller: String,
    },
    /// Mean normalized score of a subject for one skill.
    Assessment { subject: u64, skill: usize },
    /// Overwrite the four score overrides of an identity.
    SetScores {
        id: u64,
        /// One value per skill, in catalog order.
        #[arg(num_args = SKILL_COUNT, required = true)]
        scores: Vec<u8>,
        #[arg(long)]
        caller: String,
    },
    /// Stored score override.
    Score { id: u64, skill: usize },
    /// Occupation text of an identity.
    Occupation { id: u64 },
    /// Change the occupation text (holder only).
    SetOccupation {
        id: u64,
        #[arg(long)]
        caller: String,
        text: String,
    },
    /// List the skill catalog.
    Skills,
    /// Set the catalog base locator.
    SetBaseLocator {
        #[arg(long)]
        caller: String,
        value: String,
    },
    /// Locator of an identity (base locator + id).
    Locator { id: u64 },
    /// Hand the authority role to another holder.
    TransferAuthority {
        #[arg(long)]
        caller: String,
        new_holder: String,
    },
    /// Running statistics of a rater for one skill.
    Stats { rater: u64, skill: usize },
    /// Ledger summary.
    Status,
    /// Write the ledger to a file.
    Export {
        output: PathBuf,
        #[arg(long, value_enum, default_value_t = ExportFormat::Snapshot)]
        format: ExportFormat,
    },
    /// Replace the ledger with a binary snapshot.
    Import { input: PathBuf },
}

fn run(args: Cli) -> Result<(), CliError> {
    let store = Store::with_backend(&args.db, args.backend);
    tracing::debug!(db = %args.db.display(), backend = %args.backend, "store selected");

    let value = match args.command {
        Command::Init {
            force,
            config,
            authority,
        } => cli::cmd_init(&store, force, config.as_deref(), authority.as_deref())?,
        Command::Mint { holder, occupation } => cli::cmd_mint(&store, &holder, &occupation)?,
        Command::Burn { id, caller } => cli::cmd_burn(&store, &caller, id)?,
        Command::Evaluate {
            rater,
            subject,
            points,
            caller,
        } => cli::cmd_evaluate(&store, &caller, rater, subject, &points)?,
        Command::Assessment { subject, skill } => cli::cmd_assessment(&store, subject, skill)?,
        Command::SetScores { id, scores, caller } => {
            cli::cmd_set_scores(&store, &caller, id, &scores)?
        }
        Command::Score { id, skill } => cli::cmd_score(&store, id, skill)?,
        Command::Occupation { id } => cli::cmd_occupation(&store, id)?,
        Command::SetOccupation { id, caller, text } => {
            cli::cmd_set_occupation(&store, &caller, id, &text)?
        }
        Command::Skills => cli::cmd_skills(&store)?,
        Command::SetBaseLocator { caller, value } => {
            cli::cmd_set_base_locator(&store, &caller, &value)?
        }
        Command::Locator { id } => cli::cmd_locator(&store, id)?,
        Command::TransferAuthority { caller, new_holder } => {
            cli::cmd_transfer_authority(&store, &caller, &new_holder)?
        }
        Command::Stats { rater, skill } => cli::cmd_stats(&store, rater, skill)?,
        Command::Status => cli::cmd_status(&store)?,
        Command::Export { output, format } => {
            let format = match format {
                ExportFormat::Snapshot => "snapshot",
                ExportFormat::Json => "json",
            };
            cli::cmd_export(&store, &output, format)?
        }
        Command::Import { input } => cli::cmd_import(&store, &input)?,
    };

    cli::emit(&value, args.json)
}

fn main() -> ExitCode {
    init_tracing();
    let args = Cli::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
