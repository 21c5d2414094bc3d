//! Job command implementations (list, get, create, update, delete, clear).

use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use crate::backup::render_csv;
use crate::cli::FieldArgs;
use crate::config::open_store;
use crate::error::{Error, Result};
use crate::model::{Fields, Record};
use crate::validate::build_fields;

use super::print_record;

/// Output for job list.
#[derive(Serialize)]
struct JobListOutput<'a> {
    items: &'a [Record],
    count: usize,
}

/// Output for job delete.
#[derive(Serialize)]
struct JobDeleteOutput<'a> {
    id: &'a str,
    deleted: bool,
}

/// Output for clear.
#[derive(Serialize)]
struct ClearOutput {
    cleared: usize,
}

/// Output for a dry-run preview.
#[derive(Serialize)]
struct DryRunOutput<'a> {
    dry_run: bool,
    action: &'a str,
    count: usize,
    ids: Vec<&'a str>,
}

fn field_input(args: &FieldArgs) -> Result<Fields> {
    build_fields(args.fields.as_deref(), &args.set, args.photo.as_deref())
}

/// List every job in document order.
///
/// # Errors
///
/// Returns `Error::Format` if the document is corrupt.
pub fn list(db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let store = open_store(db_path.map(PathBuf::as_path))?;
    let records = store.list_all()?;

    if crate::is_csv() {
        print!("{}", render_csv(&records));
    } else if json {
        let output = JobListOutput {
            items: &records,
            count: records.len(),
        };
        println!("{}", serde_json::to_string(&output)?);
    } else if records.is_empty() {
        println!("No jobs found.");
    } else {
        println!("Jobs ({}):", records.len());
        println!();
        for record in &records {
            print_record(record);
        }
    }

    Ok(())
}

/// Show a single job.
///
/// # Errors
///
/// Returns `Error::NotFound` if no job has this ID.
pub fn get(id: &str, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let store = open_store(db_path.map(PathBuf::as_path))?;
    let record = store.get(id)?;

    if crate::is_csv() {
        print!("{}", render_csv(std::slice::from_ref(&record)));
    } else if json {
        println!("{}", serde_json::to_string(&record)?);
    } else {
        print_record(&record);
    }

    Ok(())
}

/// Record a new job.
///
/// # Errors
///
/// Returns `Error::InvalidArgument` for malformed field input, or a store
/// error.
pub fn create(args: &FieldArgs, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let fields = field_input(args)?;
    let store = open_store(db_path.map(PathBuf::as_path))?;
    let record = store.create(fields)?;
    let id = record.id().unwrap_or_default();

    info!(id, "Job created");

    if crate::is_silent() {
        println!("{id}");
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string(&record)?);
    } else {
        println!("Created job: {id}");
    }

    Ok(())
}

/// Merge fields into an existing job.
///
/// # Errors
///
/// Returns `Error::InvalidArgument` for malformed field input,
/// `Error::NotFound` if no job has this ID, or a store error.
pub fn update(id: &str, args: &FieldArgs, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let fields = field_input(args)?;
    let store = open_store(db_path.map(PathBuf::as_path))?;
    let record = store.update(id, fields)?;

    info!(id, "Job updated");

    if crate::is_silent() {
        println!("{id}");
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string(&record)?);
    } else {
        println!("Updated job: {id}");
    }

    Ok(())
}

/// Delete a job.
///
/// # Errors
///
/// Returns `Error::NotFound` if no job has this ID, or a store error.
pub fn delete(id: &str, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let store = open_store(db_path.map(PathBuf::as_path))?;

    if crate::is_dry_run() {
        let record = store.get(id)?;
        let ids: Vec<&str> = record.id().into_iter().collect();
        return print_dry_run("delete", ids, json);
    }

    store.delete(id)?;
    info!(id, "Job deleted");

    if crate::is_silent() {
        println!("{id}");
        return Ok(());
    }

    if json {
        let output = JobDeleteOutput { id, deleted: true };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Deleted job: {id}");
    }

    Ok(())
}

/// Delete every job.
///
/// Works over a corrupt document too, so it doubles as a reset.
///
/// # Errors
///
/// Returns `Error::InvalidArgument` without `--yes`, or a save error.
pub fn clear(yes: bool, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let store = open_store(db_path.map(PathBuf::as_path))?;

    if crate::is_dry_run() {
        let records = store.list_all()?;
        let ids = records.iter().filter_map(Record::id).collect();
        return print_dry_run("clear", ids, json);
    }

    if !yes {
        return Err(Error::InvalidArgument(
            "clear deletes every job; pass --yes to confirm".to_string(),
        ));
    }

    let cleared = store.clear()?;
    info!(cleared, "Jobs cleared");

    if json {
        println!("{}", serde_json::to_string(&ClearOutput { cleared })?);
    } else if !crate::is_silent() {
        println!("Cleared {cleared} job(s).");
    }

    Ok(())
}

pub(crate) fn print_dry_run(action: &str, ids: Vec<&str>, json: bool) -> Result<()> {
    if json {
        let output = DryRunOutput {
            dry_run: true,
            action,
            count: ids.len(),
            ids,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Would {action} {} job(s):", ids.len());
        for id in ids {
            println!("  {id}");
        }
    }
    Ok(())
}
