use anyhow::Result;
use clap::ValueEnum;

use garden_core::service::GardenService;

use super::helpers::{format_date, parse_date, print_json, print_task_table};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum Toggle {
    On,
    Off,
}

/// Show reminders for a day, or switch them on/off.
pub(crate) fn cmd_reminders(
    svc: &GardenService,
    toggle: Option<Toggle>,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    if let Some(toggle) = toggle {
        let enabled = toggle == Toggle::On;
        svc.set_reminders_enabled(enabled)?;
        if json {
            println!("{}", serde_json::json!({ "enabled": enabled }));
        } else if enabled {
            println!("Reminders are on");
        } else {
            println!("Reminders are off");
        }
        return Ok(());
    }

    let day = parse_date(date)?;
    let reminders = svc.reminders(day)?;

    if json {
        print_json(&reminders)?;
    } else if !reminders.enabled {
        eprintln!("Reminders are off. Use `garden reminders on` to enable them.");
    } else if reminders.tasks.is_empty() {
        println!("Nothing due on {}.", day.format("%d.%m.%Y"));
    } else {
        for task in &reminders.tasks {
            println!(
                "{}  {} in {}",
                format_date(task.task_date.as_deref()),
                task.task_type,
                task.bed_name.as_deref().unwrap_or_default()
            );
        }
    }
    Ok(())
}

pub(crate) fn cmd_history(svc: &GardenService, json: bool) -> Result<()> {
    let tasks = svc.history()?;

    if json {
        print_json(&tasks)?;
    } else if tasks.is_empty() {
        eprintln!("No completed tasks yet.");
    } else {
        print_task_table(&tasks);
    }
    Ok(())
}
