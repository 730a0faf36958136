use anyhow::Result;

use garden_core::models::{PLANT_OPTIONS, PlantChoice};
use garden_core::service::GardenService;

use super::helpers::print_json;

/// Names from the suggestion list are taken as-is; anything else is a custom name.
fn plant_choice(name: &str) -> PlantChoice {
    let trimmed = name.trim();
    if PLANT_OPTIONS.contains(&trimmed) {
        PlantChoice::Suggested(trimmed.to_string())
    } else {
        PlantChoice::Custom(name.to_string())
    }
}

pub(crate) fn cmd_plant_add(svc: &GardenService, bed_id: i64, name: &str, json: bool) -> Result<()> {
    let plant = svc.add_plant(bed_id, &plant_choice(name))?;

    if json {
        print_json(&plant)?;
    } else {
        println!("Added {} to bed {}", plant.name, plant.bed_id);
    }
    Ok(())
}

pub(crate) fn cmd_plant_list(svc: &GardenService, bed_id: i64, json: bool) -> Result<()> {
    svc.get_bed(bed_id)?;
    let plants = svc.list_plants(bed_id)?;

    if json {
        print_json(&plants)?;
    } else if plants.is_empty() {
        eprintln!("No plants in bed {bed_id}.");
    } else {
        for plant in &plants {
            println!("{:>5}  {}", plant.id, plant.name);
        }
    }
    Ok(())
}

pub(crate) fn cmd_plant_options(json: bool) -> Result<()> {
    if json {
        print_json(&PLANT_OPTIONS)?;
    } else {
        for name in PLANT_OPTIONS {
            println!("{name}");
        }
        eprintln!("Any other name is stored as a custom plant.");
    }
    Ok(())
}
