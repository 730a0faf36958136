use std::path::Path;
use std::process;

use anyhow::{Result, bail};

use garden_core::models::BedForm;
use garden_core::service::GardenService;
use garden_core::uploads::Upload;

use super::helpers::{format_date, print_bed_table, print_json, print_task_table};

fn read_photo(photo: Option<&Path>) -> Result<Option<Upload>> {
    photo.map(Upload::from_path).transpose()
}

pub(crate) fn cmd_bed_add(
    svc: &GardenService,
    name: &str,
    description: Option<String>,
    location: Option<String>,
    photo: Option<&Path>,
    json: bool,
) -> Result<()> {
    let form = BedForm {
        name: name.to_string(),
        description: description.unwrap_or_default(),
        location_hint: location.unwrap_or_default(),
        photo: read_photo(photo)?,
    };
    let bed = svc.create_bed(&form)?;

    if json {
        print_json(&bed)?;
    } else {
        println!("Saved bed {} \"{}\"", bed.id, bed.name);
    }
    Ok(())
}

pub(crate) fn cmd_bed_list(svc: &GardenService, search: Option<&str>, json: bool) -> Result<()> {
    let beds = svc.list_beds(search)?;

    if json {
        print_json(&beds)?;
    } else if beds.is_empty() {
        if search.is_some_and(|s| !s.trim().is_empty()) {
            eprintln!("No beds match your search.");
        } else {
            eprintln!("No beds yet. Use `garden bed add` to create the first one.");
        }
    } else {
        print_bed_table(&beds);
    }
    Ok(())
}

pub(crate) fn cmd_bed_show(svc: &GardenService, id: i64, json: bool) -> Result<()> {
    let detail = svc.bed_detail(id)?;

    if json {
        return print_json(&detail);
    }

    let bed = &detail.bed;
    println!("{} (#{})", bed.name, bed.id);
    if !bed.description.is_empty() {
        println!("  {}", bed.description);
    }
    if !bed.location_hint.is_empty() {
        println!("  Location: {}", bed.location_hint);
    }
    if !bed.photo_path.is_empty() {
        println!("  Photo: {}", bed.photo_path);
    }

    println!();
    if detail.plants.is_empty() {
        println!("Plants: none yet");
    } else {
        let names: Vec<&str> = detail.plants.iter().map(|p| p.name.as_str()).collect();
        println!("Plants: {}", names.join(", "));
    }

    println!();
    if detail.pending_tasks.is_empty() {
        println!("No planned tasks.");
    } else {
        println!("Planned tasks:");
        print_task_table(&detail.pending_tasks);
        if let Some(next) = detail.pending_tasks.iter().find(|t| t.task_date.is_some()) {
            println!(
                "Next: {} on {}",
                next.task_type,
                format_date(next.task_date.as_deref())
            );
        }
    }
    Ok(())
}

/// Edit a bed. Omitted options keep their current values; the photo only
/// changes when `--photo` is given.
pub(crate) fn cmd_bed_edit(
    svc: &GardenService,
    id: i64,
    name: Option<String>,
    description: Option<String>,
    location: Option<String>,
    photo: Option<&Path>,
    json: bool,
) -> Result<()> {
    if name.is_none() && description.is_none() && location.is_none() && photo.is_none() {
        bail!("Nothing to update. Provide at least one of --name, --description, --location, or --photo");
    }

    let current = svc.get_bed(id)?;
    let form = BedForm {
        name: name.unwrap_or(current.name),
        description: description.unwrap_or(current.description),
        location_hint: location.unwrap_or(current.location_hint),
        photo: read_photo(photo)?,
    };
    let bed = svc.update_bed(id, &form)?;

    if json {
        print_json(&bed)?;
    } else {
        println!("Updated bed {} \"{}\"", bed.id, bed.name);
    }
    Ok(())
}

pub(crate) fn cmd_bed_delete(svc: &GardenService, id: i64, yes: bool, json: bool) -> Result<()> {
    if !yes {
        bail!("Deleting a bed also deletes its plants and tasks and cannot be undone. Re-run with --yes to confirm");
    }

    if svc.delete_bed(id)? {
        if json {
            println!("{}", serde_json::json!({ "deleted": id }));
        } else {
            println!("Deleted bed {id}");
        }
        Ok(())
    } else {
        if json {
            println!(
                "{}",
                serde_json::json!({ "error": format!("Bed {id} not found") })
            );
        } else {
            eprintln!("Bed {id} not found");
        }
        process::exit(2);
    }
}
