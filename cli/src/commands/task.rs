use std::path::Path;
use std::process;

use anyhow::{Result, bail};
use chrono::NaiveDate;

use garden_core::models::{TASK_TYPES, TaskForm, UpdateTask, task_type_index};
use garden_core::service::GardenService;
use garden_core::uploads::Upload;

use super::helpers::{format_date, parse_date, parse_optional_date, print_json, print_task_table};

pub(crate) fn cmd_task_add(
    svc: &GardenService,
    bed_id: i64,
    task_type: &str,
    date: Option<String>,
    photo: Option<&Path>,
    json: bool,
) -> Result<()> {
    let form = TaskForm {
        task_type: task_type.to_string(),
        task_date: parse_optional_date(date)?,
        photo: photo.map(Upload::from_path).transpose()?,
    };
    let task = svc.add_task(bed_id, &form)?;

    if json {
        print_json(&task)?;
    } else {
        let when = format_date(task.task_date.as_deref());
        if when.is_empty() {
            println!("Added task {} \"{}\" (no date)", task.id, task.task_type);
        } else {
            println!("Added task {} \"{}\" for {when}", task.id, task.task_type);
        }
    }
    Ok(())
}

pub(crate) fn cmd_task_list(svc: &GardenService, bed_id: i64, json: bool) -> Result<()> {
    svc.get_bed(bed_id)?;
    let tasks = svc.pending_tasks(bed_id)?;

    if json {
        print_json(&tasks)?;
    } else if tasks.is_empty() {
        eprintln!("No planned tasks for bed {bed_id}.");
    } else {
        print_task_table(&tasks);
    }
    Ok(())
}

pub(crate) fn cmd_task_done(
    svc: &GardenService,
    id: i64,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let task = svc.complete_task_on(id, parse_date(date)?)?;

    if json {
        print_json(&task)?;
    } else {
        println!(
            "Marked task {} \"{}\" done on {}",
            task.id,
            task.task_type,
            format_date(task.completed_at.as_deref())
        );
    }
    Ok(())
}

/// A stored planned date, read back strictly as `YYYY-MM-DD`.
fn stored_date(id: i64, value: Option<&str>) -> Result<Option<NaiveDate>> {
    match value {
        None | Some("") => Ok(None),
        Some(v) => match NaiveDate::parse_from_str(v, "%Y-%m-%d") {
            Ok(d) => Ok(Some(d)),
            Err(_) => bail!(
                "Task {id} has a stored date '{v}' that is not YYYY-MM-DD. Pass --date or --no-date"
            ),
        },
    }
}

/// Edit a task's type and date. Omitted values keep the current ones; a
/// stored type outside [`TASK_TYPES`] falls back to the first entry.
pub(crate) fn cmd_task_edit(
    svc: &GardenService,
    id: i64,
    task_type: Option<String>,
    date: Option<String>,
    no_date: bool,
    json: bool,
) -> Result<()> {
    if task_type.is_none() && date.is_none() && !no_date {
        bail!("Nothing to update. Provide at least one of --type, --date, or --no-date");
    }
    if date.is_some() && no_date {
        bail!("--date and --no-date cannot be combined");
    }

    let current = svc.get_task(id)?;
    let task_type =
        task_type.unwrap_or_else(|| TASK_TYPES[task_type_index(&current.task_type)].to_string());
    let task_date = if no_date {
        None
    } else if date.is_some() {
        parse_optional_date(date)?
    } else {
        stored_date(id, current.task_date.as_deref())?
    };

    let task = svc.update_task(
        id,
        &UpdateTask {
            task_type,
            task_date,
        },
    )?;

    if json {
        print_json(&task)?;
    } else {
        println!("Updated task {} \"{}\"", task.id, task.task_type);
    }
    Ok(())
}

pub(crate) fn cmd_task_delete(svc: &GardenService, id: i64, json: bool) -> Result<()> {
    if svc.delete_task(id)? {
        if json {
            println!("{}", serde_json::json!({ "deleted": id }));
        } else {
            println!("Deleted task {id}");
        }
        Ok(())
    } else {
        if json {
            println!(
                "{}",
                serde_json::json!({ "error": format!("Task {id} not found") })
            );
        } else {
            eprintln!("Task {id} not found");
        }
        process::exit(2);
    }
}

pub(crate) fn cmd_task_photo(svc: &GardenService, id: i64, photo: &Path, json: bool) -> Result<()> {
    let upload = Upload::from_path(photo)?;
    let task = svc.attach_task_photo(id, Some(&upload))?;

    if json {
        print_json(&task)?;
    } else {
        println!("Attached photo {} to task {}", task.photo_path, task.id);
    }
    Ok(())
}

pub(crate) fn cmd_task_types(json: bool) -> Result<()> {
    if json {
        print_json(&TASK_TYPES)?;
    } else {
        for t in TASK_TYPES {
            println!("{t}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_date_is_strict() {
        assert_eq!(stored_date(1, None).unwrap(), None);
        assert_eq!(stored_date(1, Some("")).unwrap(), None);
        assert_eq!(
            stored_date(1, Some("2024-05-01")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 1)
        );
        // Keywords are input shorthands, never stored values
        let err = stored_date(7, Some("today")).unwrap_err();
        assert!(err.to_string().contains("Task 7"));
        assert!(stored_date(7, Some("01.05.2024")).is_err());
    }
}
