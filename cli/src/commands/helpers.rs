use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use garden_core::models::{Bed, Task};

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(Local::now().date_naive()),
        Some(s) => match s.as_str() {
            "today" => Ok(Local::now().date_naive()),
            "yesterday" => Ok(Local::now().date_naive() - chrono::Duration::days(1)),
            "tomorrow" => Ok(Local::now().date_naive() + chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d").with_context(|| {
                format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
            }),
        },
    }
}

/// Like [`parse_date`], but a missing value means "no date" instead of today.
pub(crate) fn parse_optional_date(date_str: Option<String>) -> Result<Option<NaiveDate>> {
    date_str.map(|s| parse_date(Some(s))).transpose()
}

/// Display form of a stored ISO date (`DD.MM.YYYY`). Values that don't parse
/// are shown as stored.
pub(crate) fn format_date(value: Option<&str>) -> String {
    match value {
        None | Some("") => String::new(),
        Some(v) => NaiveDate::parse_from_str(v, "%Y-%m-%d")
            .map_or_else(|_| v.to_string(), |d| d.format("%d.%m.%Y").to_string()),
    }
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn print_bed_table(beds: &[Bed]) {
    #[derive(Tabled)]
    struct BedRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Location")]
        location: String,
        #[tabled(rename = "Description")]
        description: String,
        #[tabled(rename = "Photo")]
        photo: String,
    }

    let rows: Vec<BedRow> = beds
        .iter()
        .map(|b| BedRow {
            id: b.id,
            name: truncate(&b.name, 30),
            location: truncate(&b.location_hint, 25),
            description: truncate(&b.description, 40),
            photo: if b.photo_path.is_empty() {
                "-".to_string()
            } else {
                b.photo_path.clone()
            },
        })
        .collect();

    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");
}

pub(crate) fn print_task_table(tasks: &[Task]) {
    #[derive(Tabled)]
    struct TaskRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Bed")]
        bed: String,
        #[tabled(rename = "Task")]
        task_type: String,
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Done")]
        completed: String,
        #[tabled(rename = "Photo")]
        photo: String,
    }

    let rows: Vec<TaskRow> = tasks
        .iter()
        .map(|t| TaskRow {
            id: t.id,
            bed: t
                .bed_name
                .as_deref()
                .map_or_else(|| t.bed_id.to_string(), |n| truncate(n, 25)),
            task_type: t.task_type.clone(),
            date: {
                let d = format_date(t.task_date.as_deref());
                if d.is_empty() { "Bez datuma".to_string() } else { d }
            },
            completed: format_date(t.completed_at.as_deref()),
            photo: if t.photo_path.is_empty() {
                "-".to_string()
            } else {
                t.photo_path.clone()
            },
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..5)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
