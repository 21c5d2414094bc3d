//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::backup::BackupFormat;

/// Output format for list/query commands.
#[derive(ValueEnum, Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table (default)
    #[default]
    Table,
    /// JSON (same as --json)
    Json,
    /// Comma-separated values
    Csv,
}

pub mod commands;

/// printlog - Keep track of 3D print jobs and their photos
#[derive(Parser, Debug)]
#[command(name = "printlog", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Job document path (default: ~/.printlog/data/jobs.json)
    #[arg(long, global = true, env = "PRINTLOG_DATA")]
    pub data: Option<PathBuf>,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Output format (table, json, csv)
    #[arg(long, value_enum, global = true, default_value_t)]
    pub format: OutputFormat,

    /// Output only the job ID (for scripting)
    #[arg(long, global = true)]
    pub silent: bool,

    /// Preview destructive changes without writing the document
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an empty job document
    Init {
        /// Overwrite an existing document
        #[arg(long)]
        force: bool,
    },

    /// Print version information
    Version,

    /// Show document location and health
    Status,

    /// List all jobs
    List,

    /// Show a single job
    Get {
        /// Job ID
        id: String,
    },

    /// Record a new print job
    Create(FieldArgs),

    /// Change fields of a job (other fields are kept)
    Update {
        /// Job ID
        id: String,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Delete a job
    Delete {
        /// Job ID
        id: String,
    },

    /// Delete every job
    Clear {
        /// Confirm clearing all jobs
        #[arg(long)]
        yes: bool,
    },

    /// Backup export and restore
    Backup {
        #[command(subcommand)]
        command: BackupCommands,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ============================================================================
// Field Arguments
// ============================================================================

#[derive(Args, Debug, Default, Clone)]
pub struct FieldArgs {
    /// Set a field (key=value, value parsed as JSON when possible)
    #[arg(short, long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Fields as a JSON object
    #[arg(long, value_name = "OBJECT")]
    pub fields: Option<String>,

    /// Photo attachment reference (path or URL)
    #[arg(long, value_name = "REF")]
    pub photo: Option<String>,
}

// ============================================================================
// Backup Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum BackupCommands {
    /// Write a backup of all jobs
    Export {
        /// Output file (default: ~/.printlog/backups/printlog-<timestamp>.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Backup format
        #[arg(long = "as", value_enum, default_value_t)]
        backup_format: BackupFormat,
    },

    /// Replace all jobs with the contents of a backup
    Import {
        /// Backup file (JSON array of jobs)
        file: PathBuf,

        /// Confirm replacing all jobs
        #[arg(long)]
        yes: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_create_fields() {
        let cli = Cli::parse_from([
            "printlog",
            "create",
            "--set",
            "material=PLA",
            "-s",
            "layer_height=0.2",
            "--photo",
            "uploads/benchy.jpg",
        ]);
        let Commands::Create(args) = cli.command else {
            panic!("expected create");
        };
        assert_eq!(args.set, ["material=PLA", "layer_height=0.2"]);
        assert_eq!(args.photo.as_deref(), Some("uploads/benchy.jpg"));
    }

    #[test]
    fn test_parse_backup_export() {
        let cli = Cli::parse_from(["printlog", "backup", "export", "--as", "csv", "--json"]);
        assert!(cli.json);
        let Commands::Backup {
            command: BackupCommands::Export { backup_format, output },
        } = cli.command
        else {
            panic!("expected backup export");
        };
        assert_eq!(backup_format, BackupFormat::Csv);
        assert!(output.is_none());
    }
}
