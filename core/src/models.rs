use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::uploads::Upload;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bed {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location_hint: String,
    #[serde(default)]
    pub photo_path: String,
}

#[derive(Debug, Clone)]
pub struct NewBed {
    pub name: String,
    pub description: String,
    pub location_hint: String,
    pub photo_path: String,
}

/// Full replacement of a bed's editable fields.
///
/// `photo_path: None` keeps whatever photo the bed already has.
#[derive(Debug, Clone)]
pub struct UpdateBed {
    pub name: String,
    pub description: String,
    pub location_hint: String,
    pub photo_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plant {
    pub id: i64,
    pub bed_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub bed_id: i64,
    pub task_type: String,
    pub task_date: Option<String>,
    pub completed_at: Option<String>,
    #[serde(default)]
    pub photo_path: String,
    // Joined from beds for reminder and history listings
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub bed_name: Option<String>,
}

impl Task {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub bed_id: i64,
    pub task_type: String,
    pub task_date: Option<NaiveDate>,
    pub photo_path: String,
}

#[derive(Debug, Clone)]
pub struct UpdateTask {
    pub task_type: String,
    pub task_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BedDetail {
    pub bed: Bed,
    pub plants: Vec<Plant>,
    pub pending_tasks: Vec<Task>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Reminders {
    pub enabled: bool,
    pub tasks: Vec<Task>,
}

// --- Form input ---

/// Bed create/edit form as submitted by a presentation layer.
#[derive(Debug, Clone, Default)]
pub struct BedForm {
    pub name: String,
    pub description: String,
    pub location_hint: String,
    pub photo: Option<Upload>,
}

#[derive(Debug, Clone)]
pub struct TaskForm {
    pub task_type: String,
    pub task_date: Option<NaiveDate>,
    pub photo: Option<Upload>,
}

/// A plant name picked from [`PLANT_OPTIONS`] or typed in by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlantChoice {
    Suggested(String),
    Custom(String),
}

impl PlantChoice {
    /// Build a choice from a selector value; [`OTHER_PLANT_CHOICE`] switches to the free-text field.
    #[must_use]
    pub fn from_selection(selection: &str, custom: &str) -> Self {
        if selection == OTHER_PLANT_CHOICE {
            Self::Custom(custom.to_string())
        } else {
            Self::Suggested(selection.to_string())
        }
    }

    pub fn resolve_name(&self) -> Result<String> {
        match self {
            Self::Suggested(name) => {
                if PLANT_OPTIONS.contains(&name.as_str()) {
                    Ok(name.clone())
                } else {
                    bail!(
                        "Unknown plant '{name}'. Pick one of: {} (or enter a custom name)",
                        PLANT_OPTIONS.join(", ")
                    )
                }
            }
            Self::Custom(text) => {
                let name = text.trim();
                if name.is_empty() {
                    bail!("Plant name must not be empty");
                }
                Ok(name.to_string())
            }
        }
    }
}

// --- Choice lists ---

pub const TASK_TYPES: &[&str] = &[
    "Laistīšana",
    "Mēslošana",
    "Ravēšana",
    "Sēšana",
    "Stādīšana",
    "Apgriešana",
    "Ražas novākšana",
];

pub const PLANT_OPTIONS: &[&str] = &[
    "Tomāti",
    "Gurķi",
    "Burkāni",
    "Kartupeļi",
    "Sīpoli",
    "Ķiploki",
    "Salāti",
    "Zemenes",
    "Dilles",
    "Pētersīļi",
];

pub const OTHER_PLANT_CHOICE: &str = "Cits nosaukums";

pub const REMINDERS_ENABLED_KEY: &str = "reminders_enabled";

/// Task types are checked on every write; stored values are never rejected on read.
pub fn validate_task_type(task_type: &str) -> Result<String> {
    let trimmed = task_type.trim();
    if TASK_TYPES.contains(&trimmed) {
        Ok(trimmed.to_string())
    } else {
        bail!(
            "Invalid task type '{task_type}'. Must be one of: {}",
            TASK_TYPES.join(", ")
        )
    }
}

/// Position of a stored task type in [`TASK_TYPES`], falling back to the first entry.
#[must_use]
pub fn task_type_index(task_type: &str) -> usize {
    TASK_TYPES
        .iter()
        .position(|t| *t == task_type)
        .unwrap_or(0)
}

pub fn validate_bed_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        bail!("Bed name must not be empty");
    }
    Ok(trimmed.to_string())
}
