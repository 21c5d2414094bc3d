//! Backup command implementations.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;

use crate::backup::{read_backup, BackupFormat, Exporter, Importer};
use crate::cli::BackupCommands;
use crate::config::{backup_file_name, open_store, resolve_backup_dir};
use crate::error::{Error, Result};
use crate::model::Record;

use super::job::print_dry_run;

#[derive(Serialize)]
struct ImportOutput<'a> {
    path: &'a Path,
    replaced: usize,
    restored: usize,
}

/// Execute backup commands.
///
/// # Errors
///
/// Returns an error if the backup fails.
pub fn execute(command: &BackupCommands, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    match command {
        BackupCommands::Export {
            output,
            backup_format,
        } => export(output.as_deref(), *backup_format, db_path, json),
        BackupCommands::Import { file, yes } => import(file, *yes, db_path, json),
    }
}

fn export(
    output: Option<&Path>,
    format: BackupFormat,
    db_path: Option<&PathBuf>,
    json: bool,
) -> Result<()> {
    let store = open_store(db_path.map(PathBuf::as_path))?;

    let path = match output {
        Some(path) => path.to_path_buf(),
        None => resolve_backup_dir(None)
            .ok_or_else(|| {
                Error::Config("cannot determine a backup directory; pass --output".to_string())
            })?
            .join(backup_file_name(Utc::now(), format.extension())),
    };

    let stats = Exporter::new(&store).export(&path, format)?;

    if json {
        println!("{}", serde_json::to_string(&stats)?);
    } else if crate::is_silent() {
        println!("{}", stats.path.display());
    } else if stats.is_empty() {
        println!("Exported an empty backup to {}", stats.path.display());
    } else {
        println!(
            "Exported {} job(s), {} field(s) to {}",
            stats.records,
            stats.fields,
            stats.path.display()
        );
    }

    Ok(())
}

fn import(file: &Path, yes: bool, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let store = open_store(db_path.map(PathBuf::as_path))?;

    if crate::is_dry_run() {
        let records = read_backup(file)?;
        let ids = records.iter().filter_map(Record::id).collect();
        return print_dry_run("restore", ids, json);
    }

    if !yes {
        return Err(Error::InvalidArgument(
            "import replaces every job; pass --yes to confirm".to_string(),
        ));
    }

    let stats = Importer::new(&store).import(file)?;

    if json {
        let output = ImportOutput {
            path: file,
            replaced: stats.replaced,
            restored: stats.restored,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else if !crate::is_silent() {
        println!(
            "Restored {} job(s) from {} (replaced {})",
            stats.restored,
            file.display(),
            stats.replaced
        );
    }

    Ok(())
}
