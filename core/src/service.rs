use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use chrono::{Local, NaiveDate};

use crate::db::Database;
use crate::models::{
    Bed, BedDetail, BedForm, NewBed, NewTask, Plant, PlantChoice, Reminders, Task, TaskForm,
    UpdateBed, UpdateTask, validate_bed_name, validate_task_type,
};
use crate::uploads::{Upload, UploadStore};

/// Today's date in ISO form (`YYYY-MM-DD`), local time.
#[must_use]
pub fn today_iso() -> String {
    today().format("%Y-%m-%d").to_string()
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Everything a presentation layer needs: the database plus photo storage.
///
/// Every write returns a fresh read of the affected record.
#[derive(Clone)]
pub struct GardenService {
    db: Database,
    uploads: UploadStore,
}

impl GardenService {
    pub fn new(db_path: &Path, upload_dir: impl Into<PathBuf>) -> Result<Self> {
        let uploads = UploadStore::new(upload_dir);
        uploads.ensure_dir()?;
        let db = Database::open(db_path)?;
        Ok(Self { db, uploads })
    }

    pub fn new_in_memory(upload_dir: impl Into<PathBuf>) -> Result<Self> {
        let uploads = UploadStore::new(upload_dir);
        uploads.ensure_dir()?;
        let db = Database::open_in_memory()?;
        Ok(Self { db, uploads })
    }

    #[must_use]
    pub fn db(&self) -> &Database {
        &self.db
    }

    #[must_use]
    pub fn uploads(&self) -> &UploadStore {
        &self.uploads
    }

    // --- Beds ---

    pub fn create_bed(&self, form: &BedForm) -> Result<Bed> {
        let name = validate_bed_name(&form.name)?;
        let photo_path = self.uploads.save(form.photo.as_ref())?;
        self.db.insert_bed(&NewBed {
            name,
            description: form.description.trim().to_string(),
            location_hint: form.location_hint.trim().to_string(),
            photo_path,
        })
    }

    /// Replace a bed's fields. The stored photo only changes when the form
    /// carries a new one.
    pub fn update_bed(&self, id: i64, form: &BedForm) -> Result<Bed> {
        let name = validate_bed_name(&form.name)?;
        self.db.get_bed(id)?;
        let photo_path = self.uploads.save(form.photo.as_ref())?;
        self.db.update_bed(
            id,
            &UpdateBed {
                name,
                description: form.description.trim().to_string(),
                location_hint: form.location_hint.trim().to_string(),
                photo_path: (!photo_path.is_empty()).then_some(photo_path),
            },
        )
    }

    pub fn delete_bed(&self, id: i64) -> Result<bool> {
        self.db.delete_bed(id)
    }

    pub fn get_bed(&self, id: i64) -> Result<Bed> {
        self.db.get_bed(id)
    }

    /// All beds, newest first, optionally filtered by a case-insensitive
    /// substring of the name.
    pub fn list_beds(&self, search: Option<&str>) -> Result<Vec<Bed>> {
        let mut beds = self.db.list_beds()?;
        if let Some(query) = search.map(str::trim).filter(|q| !q.is_empty()) {
            let needle = query.to_lowercase();
            beds.retain(|bed| bed.name.to_lowercase().contains(&needle));
        }
        Ok(beds)
    }

    pub fn bed_detail(&self, id: i64) -> Result<BedDetail> {
        let bed = self.db.get_bed(id)?;
        let plants = self.db.list_plants(id)?;
        let pending_tasks = self.db.list_pending_tasks(id)?;
        Ok(BedDetail {
            bed,
            plants,
            pending_tasks,
        })
    }

    // --- Plants ---

    pub fn add_plant(&self, bed_id: i64, choice: &PlantChoice) -> Result<Plant> {
        let name = choice.resolve_name()?;
        self.db.get_bed(bed_id)?;
        self.db.insert_plant(bed_id, &name)
    }

    pub fn list_plants(&self, bed_id: i64) -> Result<Vec<Plant>> {
        self.db.list_plants(bed_id)
    }

    // --- Tasks ---

    pub fn add_task(&self, bed_id: i64, form: &TaskForm) -> Result<Task> {
        let task_type = validate_task_type(&form.task_type)?;
        self.db.get_bed(bed_id)?;
        let photo_path = self.uploads.save(form.photo.as_ref())?;
        self.db.insert_task(&NewTask {
            bed_id,
            task_type,
            task_date: form.task_date,
            photo_path,
        })
    }

    pub fn pending_tasks(&self, bed_id: i64) -> Result<Vec<Task>> {
        self.db.list_pending_tasks(bed_id)
    }

    pub fn get_task(&self, id: i64) -> Result<Task> {
        self.db.get_task(id)
    }

    /// Change a pending task's type and date. Completed tasks are frozen.
    pub fn update_task(&self, id: i64, update: &UpdateTask) -> Result<Task> {
        let task_type = validate_task_type(&update.task_type)?;
        if self.db.get_task(id)?.is_completed() {
            bail!("Task {id} is already completed and can no longer be edited");
        }
        self.db.update_task(
            id,
            &UpdateTask {
                task_type,
                task_date: update.task_date,
            },
        )
    }

    pub fn complete_task(&self, id: i64) -> Result<Task> {
        self.complete_task_on(id, today())
    }

    /// Mark a pending task done on `date`. A task is completed at most once.
    pub fn complete_task_on(&self, id: i64, date: NaiveDate) -> Result<Task> {
        if self.db.get_task(id)?.is_completed() {
            bail!("Task {id} is already completed");
        }
        self.db.complete_task(id, date)
    }

    pub fn delete_task(&self, id: i64) -> Result<bool> {
        self.db.delete_task(id)
    }

    /// Attach a photo to a completed task that has none yet. Without an
    /// upload the task is returned unchanged.
    pub fn attach_task_photo(&self, id: i64, upload: Option<&Upload>) -> Result<Task> {
        let task = self.db.get_task(id)?;
        if !task.is_completed() {
            bail!("Task {id} is not completed yet; photos are added after the work is done");
        }
        if upload.is_none_or(|u| u.filename.is_empty()) {
            return Ok(task);
        }
        if !task.photo_path.is_empty() {
            bail!("Task {id} already has a photo");
        }
        let photo_path = self.uploads.save(upload)?;
        self.db.set_task_photo(id, &photo_path)
    }

    // --- Reminders & history ---

    pub fn reminders_enabled(&self) -> Result<bool> {
        self.db.reminders_enabled()
    }

    pub fn set_reminders_enabled(&self, enabled: bool) -> Result<()> {
        self.db.set_reminders_enabled(enabled)
    }

    /// Due tasks for `today`; the list stays empty while reminders are off.
    pub fn reminders(&self, today: NaiveDate) -> Result<Reminders> {
        let enabled = self.db.reminders_enabled()?;
        let tasks = if enabled {
            self.db.list_due_tasks(today)?
        } else {
            Vec::new()
        };
        Ok(Reminders { enabled, tasks })
    }

    pub fn todays_reminders(&self) -> Result<Reminders> {
        self.reminders(today())
    }

    pub fn history(&self) -> Result<Vec<Task>> {
        self.db.list_completed_tasks()
    }

    // --- Photos ---

    /// Bytes of a stored photo, or `None` when the name is empty or the file
    /// can't be read.
    #[must_use]
    pub fn photo(&self, filename: &str) -> Option<Vec<u8>> {
        self.uploads.read(filename)
    }
}
