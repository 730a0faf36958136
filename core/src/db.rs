use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, OptionalExtension, Params, params};
use serde_json::Value;
use uuid::Uuid;

use crate::models::{Bed, NewBed, NewTask, Plant, REMINDERS_ENABLED_KEY, Task, UpdateBed, UpdateTask};

/// One result row, keyed by column name.
pub type Record = serde_json::Map<String, Value>;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS beds (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        description TEXT,
        location_hint TEXT,
        photo_path TEXT
    );

    CREATE TABLE IF NOT EXISTS plants (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        bed_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        FOREIGN KEY (bed_id) REFERENCES beds(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS tasks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        bed_id INTEGER NOT NULL,
        task_type TEXT NOT NULL,
        task_date TEXT,
        completed_at TEXT,
        photo_path TEXT,
        FOREIGN KEY (bed_id) REFERENCES beds(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS settings (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    INSERT OR IGNORE INTO settings (key, value) VALUES ('reminders_enabled', '1');
";

#[derive(Clone)]
enum Location {
    File(PathBuf),
    // The anchor connection keeps the shared in-memory database alive
    // between the short-lived per-call connections.
    Memory {
        uri: String,
        _anchor: Arc<Mutex<Connection>>,
    },
}

/// Handle to the garden database.
///
/// No connection is held between calls: every read or write opens its own
/// connection, runs one statement in autocommit mode and closes it again.
#[derive(Clone)]
pub struct Database {
    location: Location,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database {
            location: Location::File(path.to_path_buf()),
        };
        db.ensure_schema()
            .with_context(|| format!("Failed to initialize database: {}", path.display()))?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let uri = format!(
            "file:garden-{}?mode=memory&cache=shared",
            Uuid::new_v4().simple()
        );
        let anchor = Connection::open_with_flags(&uri, memory_flags())?;
        let db = Database {
            location: Location::Memory {
                uri,
                _anchor: Arc::new(Mutex::new(anchor)),
            },
        };
        db.ensure_schema()?;
        Ok(db)
    }

    fn connect(&self) -> Result<Connection> {
        let conn = match &self.location {
            Location::File(path) => Connection::open(path)
                .with_context(|| format!("Failed to open database: {}", path.display()))?,
            Location::Memory { uri, .. } => Connection::open_with_flags(uri, memory_flags())?,
        };
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(conn)
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.connect()?;
        f(&conn)
    }

    /// Create all tables if they are missing and seed default settings.
    /// Safe to call on every start.
    pub fn ensure_schema(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
    }

    // --- Generic access ---

    pub fn fetch_all<P: Params>(&self, query: &str, params: P) -> Result<Vec<Record>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(query)?;
            if !stmt.readonly() {
                bail!("fetch_all only runs read-only statements");
            }
            let columns = column_names(&stmt);
            let records = stmt
                .query_map(params, |row| record_from_row(row, &columns))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(records)
        })
    }

    pub fn fetch_one<P: Params>(&self, query: &str, params: P) -> Result<Option<Record>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(query)?;
            if !stmt.readonly() {
                bail!("fetch_one only runs read-only statements");
            }
            let columns = column_names(&stmt);
            let mut rows = stmt.query(params)?;
            let record = match rows.next()? {
                Some(row) => Some(record_from_row(row, &columns)?),
                None => None,
            };
            Ok(record)
        })
    }

    /// Run a single mutating statement. It is committed before this returns.
    pub fn execute<P: Params>(&self, query: &str, params: P) -> Result<()> {
        self.execute_counted(query, params).map(|_| ())
    }

    fn execute_counted<P: Params>(&self, query: &str, params: P) -> Result<usize> {
        self.with_conn(|conn| Ok(conn.execute(query, params)?))
    }

    fn query_rows<T, P: Params>(
        &self,
        query: &str,
        params: P,
        map: fn(&rusqlite::Row) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(query)?;
            let rows = stmt
                .query_map(params, map)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    fn query_opt<T, P: Params>(
        &self,
        query: &str,
        params: P,
        map: fn(&rusqlite::Row) -> rusqlite::Result<T>,
    ) -> Result<Option<T>> {
        self.with_conn(|conn| Ok(conn.query_row(query, params, map).optional()?))
    }

    fn insert(&self, query: &str, params: &[&dyn rusqlite::ToSql]) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(query, params)?;
            Ok(conn.last_insert_rowid())
        })
    }

    // --- Settings ---

    /// Value of a setting, or an empty string when it has never been set.
    pub fn get_setting(&self, key: &str) -> Result<String> {
        let record = self.fetch_one("SELECT value FROM settings WHERE key = ?1", params![key])?;
        Ok(record
            .as_ref()
            .and_then(|r| r.get("value"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_default())
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )
    }

    pub fn reminders_enabled(&self) -> Result<bool> {
        Ok(self.get_setting(REMINDERS_ENABLED_KEY)? == "1")
    }

    pub fn set_reminders_enabled(&self, enabled: bool) -> Result<()> {
        self.set_setting(REMINDERS_ENABLED_KEY, if enabled { "1" } else { "0" })
    }

    // --- Row mapping helpers ---

    fn bed_from_row(row: &rusqlite::Row) -> rusqlite::Result<Bed> {
        Ok(Bed {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            location_hint: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            photo_path: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        })
    }

    fn plant_from_row(row: &rusqlite::Row) -> rusqlite::Result<Plant> {
        Ok(Plant {
            id: row.get(0)?,
            bed_id: row.get(1)?,
            name: row.get(2)?,
        })
    }

    // Expects columns:
    // 0: id, 1: bed_id, 2: task_type, 3: task_date, 4: completed_at, 5: photo_path
    fn task_from_row(row: &rusqlite::Row) -> rusqlite::Result<Task> {
        Ok(Task {
            id: row.get(0)?,
            bed_id: row.get(1)?,
            task_type: row.get(2)?,
            task_date: row.get(3)?,
            completed_at: row.get(4)?,
            photo_path: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
            bed_name: None,
        })
    }

    // Same as `task_from_row` plus 6: beds.name
    fn task_with_bed_from_row(row: &rusqlite::Row) -> rusqlite::Result<Task> {
        let mut task = Self::task_from_row(row)?;
        task.bed_name = Some(row.get(6)?);
        Ok(task)
    }

    // --- Beds ---

    pub fn insert_bed(&self, bed: &NewBed) -> Result<Bed> {
        let id = self.insert(
            "INSERT INTO beds (name, description, location_hint, photo_path) VALUES (?1, ?2, ?3, ?4)",
            params![bed.name, bed.description, bed.location_hint, bed.photo_path],
        )?;
        tracing::debug!(id, name = %bed.name, "inserted bed");
        self.get_bed(id)
    }

    pub fn get_bed(&self, id: i64) -> Result<Bed> {
        self.find_bed(id)?
            .with_context(|| format!("Bed {id} not found"))
    }

    pub fn find_bed(&self, id: i64) -> Result<Option<Bed>> {
        self.query_opt(
            "SELECT id, name, description, location_hint, photo_path FROM beds WHERE id = ?1",
            params![id],
            Self::bed_from_row,
        )
    }

    pub fn list_beds(&self) -> Result<Vec<Bed>> {
        self.query_rows(
            "SELECT id, name, description, location_hint, photo_path FROM beds ORDER BY id DESC",
            [],
            Self::bed_from_row,
        )
    }

    pub fn update_bed(&self, id: i64, update: &UpdateBed) -> Result<Bed> {
        if let Some(ref photo_path) = update.photo_path {
            self.execute(
                "UPDATE beds SET name = ?1, description = ?2, location_hint = ?3, photo_path = ?4 WHERE id = ?5",
                params![
                    update.name,
                    update.description,
                    update.location_hint,
                    photo_path,
                    id
                ],
            )?;
        } else {
            self.execute(
                "UPDATE beds SET name = ?1, description = ?2, location_hint = ?3 WHERE id = ?4",
                params![update.name, update.description, update.location_hint, id],
            )?;
        }
        self.get_bed(id)
    }

    /// Delete a bed together with its plants and tasks.
    pub fn delete_bed(&self, id: i64) -> Result<bool> {
        let rows = self.execute_counted("DELETE FROM beds WHERE id = ?1", params![id])?;
        if rows > 0 {
            tracing::debug!(id, "deleted bed");
        }
        Ok(rows > 0)
    }

    // --- Plants ---

    pub fn insert_plant(&self, bed_id: i64, name: &str) -> Result<Plant> {
        let id = self.insert(
            "INSERT INTO plants (bed_id, name) VALUES (?1, ?2)",
            params![bed_id, name],
        )?;
        self.find_plant(id)?.context("Plant not found")
    }

    pub fn find_plant(&self, id: i64) -> Result<Option<Plant>> {
        self.query_opt(
            "SELECT id, bed_id, name FROM plants WHERE id = ?1",
            params![id],
            Self::plant_from_row,
        )
    }

    pub fn list_plants(&self, bed_id: i64) -> Result<Vec<Plant>> {
        self.query_rows(
            "SELECT id, bed_id, name FROM plants WHERE bed_id = ?1 ORDER BY id DESC",
            params![bed_id],
            Self::plant_from_row,
        )
    }

    // --- Tasks ---

    pub fn insert_task(&self, task: &NewTask) -> Result<Task> {
        let task_date = task.task_date.map(iso_date);
        let id = self.insert(
            "INSERT INTO tasks (bed_id, task_type, task_date, photo_path) VALUES (?1, ?2, ?3, ?4)",
            params![task.bed_id, task.task_type, task_date, task.photo_path],
        )?;
        tracing::debug!(id, bed_id = task.bed_id, task_type = %task.task_type, "inserted task");
        self.get_task(id)
    }

    pub fn get_task(&self, id: i64) -> Result<Task> {
        self.find_task(id)?
            .with_context(|| format!("Task {id} not found"))
    }

    pub fn find_task(&self, id: i64) -> Result<Option<Task>> {
        self.query_opt(
            "SELECT id, bed_id, task_type, task_date, completed_at, photo_path
             FROM tasks WHERE id = ?1",
            params![id],
            Self::task_from_row,
        )
    }

    /// Open tasks of a bed, earliest date first, undated tasks last.
    pub fn list_pending_tasks(&self, bed_id: i64) -> Result<Vec<Task>> {
        self.query_rows(
            "SELECT id, bed_id, task_type, task_date, completed_at, photo_path
             FROM tasks
             WHERE bed_id = ?1 AND completed_at IS NULL
             ORDER BY task_date IS NULL, task_date, id",
            params![bed_id],
            Self::task_from_row,
        )
    }

    pub fn update_task(&self, id: i64, update: &UpdateTask) -> Result<Task> {
        let task_date = update.task_date.map(iso_date);
        self.execute(
            "UPDATE tasks SET task_type = ?1, task_date = ?2 WHERE id = ?3",
            params![update.task_type, task_date, id],
        )?;
        self.get_task(id)
    }

    /// Set the completion date of a pending task. An already completed task
    /// keeps its original date.
    pub fn complete_task(&self, id: i64, completed_on: NaiveDate) -> Result<Task> {
        self.execute(
            "UPDATE tasks SET completed_at = ?1 WHERE id = ?2 AND completed_at IS NULL",
            params![iso_date(completed_on), id],
        )?;
        tracing::debug!(id, %completed_on, "completed task");
        self.get_task(id)
    }

    pub fn set_task_photo(&self, id: i64, photo_path: &str) -> Result<Task> {
        self.execute(
            "UPDATE tasks SET photo_path = ?1 WHERE id = ?2",
            params![photo_path, id],
        )?;
        self.get_task(id)
    }

    pub fn delete_task(&self, id: i64) -> Result<bool> {
        let rows = self.execute_counted("DELETE FROM tasks WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    /// Pending tasks dated on or before `today`, oldest first.
    pub fn list_due_tasks(&self, today: NaiveDate) -> Result<Vec<Task>> {
        self.query_rows(
            "SELECT tasks.id, tasks.bed_id, tasks.task_type, tasks.task_date,
                    tasks.completed_at, tasks.photo_path, beds.name
             FROM tasks
             JOIN beds ON beds.id = tasks.bed_id
             WHERE tasks.completed_at IS NULL
               AND tasks.task_date IS NOT NULL
               AND tasks.task_date <= ?1
             ORDER BY tasks.task_date, tasks.id",
            params![iso_date(today)],
            Self::task_with_bed_from_row,
        )
    }

    /// Completed tasks, most recently completed first.
    pub fn list_completed_tasks(&self) -> Result<Vec<Task>> {
        self.query_rows(
            "SELECT tasks.id, tasks.bed_id, tasks.task_type, tasks.task_date,
                    tasks.completed_at, tasks.photo_path, beds.name
             FROM tasks
             JOIN beds ON beds.id = tasks.bed_id
             WHERE tasks.completed_at IS NOT NULL
             ORDER BY tasks.completed_at DESC, tasks.id DESC",
            [],
            Self::task_with_bed_from_row,
        )
    }
}

fn memory_flags() -> OpenFlags {
    OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE | OpenFlags::SQLITE_OPEN_URI
}

fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn column_names(stmt: &rusqlite::Statement) -> Vec<String> {
    stmt.column_names().into_iter().map(String::from).collect()
}

fn record_from_row(row: &rusqlite::Row, columns: &[String]) -> rusqlite::Result<Record> {
    let mut record = Record::new();
    for (idx, name) in columns.iter().enumerate() {
        let value = match row.get_ref(idx)? {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::from(i),
            ValueRef::Real(f) => Value::from(f),
            ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Value::from(b.to_vec()),
        };
        record.insert(name.clone(), value);
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_bed(name: &str) -> NewBed {
        NewBed {
            name: name.to_string(),
            description: String::new(),
            location_hint: String::new(),
            photo_path: String::new(),
        }
    }

    fn new_task(bed_id: i64, task_type: &str, date: Option<&str>) -> NewTask {
        NewTask {
            bed_id,
            task_type: task_type.to_string(),
            task_date: date.map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()),
            photo_path: String::new(),
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn count(db: &Database, table: &str) -> i64 {
        db.fetch_one(&format!("SELECT COUNT(*) AS n FROM {table}"), [])
            .unwrap()
            .unwrap()["n"]
            .as_i64()
            .unwrap()
    }

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        db.ensure_schema().unwrap();
        db.ensure_schema().unwrap();

        let tables = db
            .fetch_all(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
                [],
            )
            .unwrap();
        let names: Vec<&str> = tables.iter().map(|r| r["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["beds", "plants", "settings", "tasks"]);
        assert_eq!(count(&db, "settings"), 1);
        assert_eq!(db.get_setting("reminders_enabled").unwrap(), "1");
    }

    #[test]
    fn test_ensure_schema_keeps_existing_setting() {
        let db = Database::open_in_memory().unwrap();
        db.set_reminders_enabled(false).unwrap();
        db.ensure_schema().unwrap();
        assert!(!db.reminders_enabled().unwrap());
    }

    #[test]
    fn test_reopen_file_database() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("garden.db");

        let db = Database::open(&path).unwrap();
        db.insert_bed(&new_bed("Tomāti")).unwrap();
        db.set_reminders_enabled(false).unwrap();
        drop(db);

        let db = Database::open(&path).unwrap();
        assert_eq!(db.list_beds().unwrap().len(), 1);
        assert_eq!(count(&db, "settings"), 1);
        assert_eq!(db.get_setting("reminders_enabled").unwrap(), "0");
    }

    #[test]
    fn test_fetch_all_returns_named_columns() {
        let db = Database::open_in_memory().unwrap();
        let bed = db.insert_bed(&new_bed("Tomāti")).unwrap();

        let rows = db.fetch_all("SELECT * FROM beds", []).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], Value::from(bed.id));
        assert_eq!(rows[0]["name"], "Tomāti");
        assert_eq!(rows[0]["description"], "");
        assert_eq!(rows[0]["location_hint"], "");
        assert_eq!(rows[0]["photo_path"], "");
    }

    #[test]
    fn test_fetch_one_missing_row() {
        let db = Database::open_in_memory().unwrap();
        let row = db
            .fetch_one("SELECT * FROM beds WHERE id = ?1", params![42])
            .unwrap();
        assert!(row.is_none());
    }

    #[test]
    fn test_malformed_query_propagates_error() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.fetch_all("SELEC * FROM beds", []).is_err());
        assert!(db.fetch_one("SELECT * FROM no_such_table", []).is_err());
        assert!(db.execute("UPDATE nowhere SET x = 1", []).is_err());
    }

    #[test]
    fn test_fetch_rejects_writes() {
        let db = Database::open_in_memory().unwrap();
        db.insert_bed(&new_bed("Tomāti")).unwrap();
        assert!(db.fetch_all("DELETE FROM beds", []).is_err());
        assert_eq!(count(&db, "beds"), 1);
    }

    #[test]
    fn test_execute_commits_immediately() {
        let db = Database::open_in_memory().unwrap();
        db.execute(
            "INSERT INTO beds (name, description, location_hint, photo_path) VALUES (?1, '', '', '')",
            params!["Gurķi"],
        )
        .unwrap();
        let row = db
            .fetch_one("SELECT name FROM beds WHERE name = ?1", params!["Gurķi"])
            .unwrap()
            .unwrap();
        assert_eq!(row["name"], "Gurķi");
    }

    #[test]
    fn test_insert_bed_defaults_and_ordering() {
        let db = Database::open_in_memory().unwrap();
        let first = db.insert_bed(&new_bed("Burkāni")).unwrap();
        let bed = db.insert_bed(&new_bed("Tomāti")).unwrap();

        assert!(bed.id > first.id);
        assert_eq!(bed.name, "Tomāti");
        assert!(bed.description.is_empty());
        assert!(bed.location_hint.is_empty());
        assert!(bed.photo_path.is_empty());

        let beds = db.list_beds().unwrap();
        assert_eq!(beds.len(), 2);
        assert_eq!(beds[0].id, bed.id);
        assert_eq!(beds[1].id, first.id);
    }

    #[test]
    fn test_bed_ids_are_never_reused() {
        let db = Database::open_in_memory().unwrap();
        let a = db.insert_bed(&new_bed("A")).unwrap();
        let b = db.insert_bed(&new_bed("B")).unwrap();
        db.delete_bed(b.id).unwrap();
        let c = db.insert_bed(&new_bed("C")).unwrap();
        assert!(c.id > b.id);
        assert!(b.id > a.id);
    }

    #[test]
    fn test_bed_with_null_columns_reads_as_empty() {
        let db = Database::open_in_memory().unwrap();
        db.execute("INSERT INTO beds (name) VALUES ('Vecā dobe')", [])
            .unwrap();
        let beds = db.list_beds().unwrap();
        assert_eq!(beds[0].name, "Vecā dobe");
        assert!(beds[0].description.is_empty());
        assert!(beds[0].photo_path.is_empty());
    }

    #[test]
    fn test_update_bed_keeps_photo_when_absent() {
        let db = Database::open_in_memory().unwrap();
        let bed = db
            .insert_bed(&NewBed {
                photo_path: "old.jpg".to_string(),
                ..new_bed("Tomāti")
            })
            .unwrap();

        let updated = db
            .update_bed(
                bed.id,
                &UpdateBed {
                    name: "Tomāti siltumnīcā".to_string(),
                    description: "Pie žoga".to_string(),
                    location_hint: "Dienvidu puse".to_string(),
                    photo_path: None,
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Tomāti siltumnīcā");
        assert_eq!(updated.description, "Pie žoga");
        assert_eq!(updated.location_hint, "Dienvidu puse");
        assert_eq!(updated.photo_path, "old.jpg");

        let updated = db
            .update_bed(
                bed.id,
                &UpdateBed {
                    name: "Tomāti".to_string(),
                    description: String::new(),
                    location_hint: String::new(),
                    photo_path: Some("new.jpg".to_string()),
                },
            )
            .unwrap();
        assert_eq!(updated.photo_path, "new.jpg");
        assert!(updated.description.is_empty());
    }

    #[test]
    fn test_update_missing_bed_fails() {
        let db = Database::open_in_memory().unwrap();
        let result = db.update_bed(
            7,
            &UpdateBed {
                name: "X".to_string(),
                description: String::new(),
                location_hint: String::new(),
                photo_path: None,
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_delete_bed_cascades() {
        let db = Database::open_in_memory().unwrap();
        let bed = db.insert_bed(&new_bed("Tomāti")).unwrap();
        let other = db.insert_bed(&new_bed("Gurķi")).unwrap();

        let p1 = db.insert_plant(bed.id, "Tomāti").unwrap();
        let p2 = db.insert_plant(bed.id, "Bazilik").unwrap();
        let t1 = db.insert_task(&new_task(bed.id, "Laistīšana", None)).unwrap();
        let t2 = db
            .insert_task(&new_task(bed.id, "Mēslošana", Some("2024-05-01")))
            .unwrap();
        let t3 = db
            .insert_task(&new_task(bed.id, "Ravēšana", Some("2024-05-03")))
            .unwrap();
        db.insert_plant(other.id, "Gurķi").unwrap();
        db.insert_task(&new_task(other.id, "Laistīšana", None))
            .unwrap();

        assert!(db.delete_bed(bed.id).unwrap());

        assert!(db.find_bed(bed.id).unwrap().is_none());
        for id in [p1.id, p2.id] {
            assert!(
                db.fetch_one("SELECT * FROM plants WHERE id = ?1", params![id])
                    .unwrap()
                    .is_none()
            );
        }
        for id in [t1.id, t2.id, t3.id] {
            assert!(db.find_task(id).unwrap().is_none());
        }

        // The other bed is untouched
        assert_eq!(count(&db, "beds"), 1);
        assert_eq!(count(&db, "plants"), 1);
        assert_eq!(count(&db, "tasks"), 1);

        assert!(!db.delete_bed(bed.id).unwrap());
    }

    #[test]
    fn test_plant_requires_existing_bed() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.insert_plant(99, "Tomāti").is_err());
        assert!(db.insert_task(&new_task(99, "Laistīšana", None)).is_err());
    }

    #[test]
    fn test_list_plants_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let bed = db.insert_bed(&new_bed("Dobe")).unwrap();
        db.insert_plant(bed.id, "Dilles").unwrap();
        db.insert_plant(bed.id, "Salāti").unwrap();

        let names: Vec<String> = db
            .list_plants(bed.id)
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Salāti", "Dilles"]);
    }

    #[test]
    fn test_pending_tasks_order_undated_last() {
        let db = Database::open_in_memory().unwrap();
        let bed = db.insert_bed(&new_bed("Dobe")).unwrap();
        db.insert_task(&new_task(bed.id, "Laistīšana", None)).unwrap();
        db.insert_task(&new_task(bed.id, "Mēslošana", Some("2024-06-10")))
            .unwrap();
        db.insert_task(&new_task(bed.id, "Ravēšana", Some("2024-05-20")))
            .unwrap();

        let tasks = db.list_pending_tasks(bed.id).unwrap();
        let dates: Vec<Option<&str>> = tasks.iter().map(|t| t.task_date.as_deref()).collect();
        assert_eq!(
            dates,
            vec![Some("2024-05-20"), Some("2024-06-10"), None]
        );
    }

    #[test]
    fn test_complete_task_moves_to_history() {
        let db = Database::open_in_memory().unwrap();
        let bed = db.insert_bed(&new_bed("Tomāti")).unwrap();
        let older = db
            .insert_task(&new_task(bed.id, "Laistīšana", Some("2024-04-01")))
            .unwrap();
        let newer = db
            .insert_task(&new_task(bed.id, "Mēslošana", Some("2024-04-02")))
            .unwrap();

        let done = db.complete_task(older.id, date("2024-04-10")).unwrap();
        assert_eq!(done.completed_at.as_deref(), Some("2024-04-10"));
        db.complete_task(newer.id, date("2024-04-20")).unwrap();

        assert!(db.list_pending_tasks(bed.id).unwrap().is_empty());

        let history = db.list_completed_tasks().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, newer.id);
        assert_eq!(history[1].id, older.id);
        assert_eq!(history[0].bed_name.as_deref(), Some("Tomāti"));

        let again = db.complete_task(older.id, date("2024-06-01")).unwrap();
        assert_eq!(again.completed_at.as_deref(), Some("2024-04-10"));
        assert_eq!(db.list_completed_tasks().unwrap()[1].id, older.id);
    }

    #[test]
    fn test_due_tasks_for_day() {
        let db = Database::open_in_memory().unwrap();
        let bed = db.insert_bed(&new_bed("Zemenes")).unwrap();
        let late = db
            .insert_task(&new_task(bed.id, "Ravēšana", Some("2024-05-01")))
            .unwrap();
        let early = db
            .insert_task(&new_task(bed.id, "Laistīšana", Some("2024-04-15")))
            .unwrap();
        db.insert_task(&new_task(bed.id, "Mēslošana", Some("2024-05-02")))
            .unwrap();
        db.insert_task(&new_task(bed.id, "Sēšana", None)).unwrap();
        let done = db
            .insert_task(&new_task(bed.id, "Stādīšana", Some("2024-04-01")))
            .unwrap();
        db.complete_task(done.id, date("2024-04-01")).unwrap();

        let due = db.list_due_tasks(date("2024-05-01")).unwrap();
        let ids: Vec<i64> = due.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![early.id, late.id]);
        assert!(due.iter().all(|t| t.completed_at.is_none()));
        assert_eq!(due[0].bed_name.as_deref(), Some("Zemenes"));
    }

    #[test]
    fn test_update_task_replaces_type_and_date() {
        let db = Database::open_in_memory().unwrap();
        let bed = db.insert_bed(&new_bed("Dobe")).unwrap();
        let task = db
            .insert_task(&new_task(bed.id, "Laistīšana", Some("2024-05-01")))
            .unwrap();

        let updated = db
            .update_task(
                task.id,
                &UpdateTask {
                    task_type: "Mēslošana".to_string(),
                    task_date: None,
                },
            )
            .unwrap();
        assert_eq!(updated.task_type, "Mēslošana");
        assert!(updated.task_date.is_none());
    }

    #[test]
    fn test_set_task_photo_and_delete() {
        let db = Database::open_in_memory().unwrap();
        let bed = db.insert_bed(&new_bed("Dobe")).unwrap();
        let task = db.insert_task(&new_task(bed.id, "Laistīšana", None)).unwrap();
        assert!(task.photo_path.is_empty());

        let task = db.set_task_photo(task.id, "abc.png").unwrap();
        assert_eq!(task.photo_path, "abc.png");

        assert!(db.delete_task(task.id).unwrap());
        assert!(!db.delete_task(task.id).unwrap());
        assert!(db.get_task(task.id).is_err());
    }

    #[test]
    fn test_unknown_task_type_is_read_back() {
        let db = Database::open_in_memory().unwrap();
        let bed = db.insert_bed(&new_bed("Dobe")).unwrap();
        db.execute(
            "INSERT INTO tasks (bed_id, task_type) VALUES (?1, 'Pļaušana')",
            params![bed.id],
        )
        .unwrap();
        let tasks = db.list_pending_tasks(bed.id).unwrap();
        assert_eq!(tasks[0].task_type, "Pļaušana");
    }

    #[test]
    fn test_settings_toggle_is_durable() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.reminders_enabled().unwrap());

        db.set_setting("reminders_enabled", "0").unwrap();
        assert_eq!(db.get_setting("reminders_enabled").unwrap(), "0");
        db.set_setting("reminders_enabled", "0").unwrap();
        assert_eq!(db.get_setting("reminders_enabled").unwrap(), "0");

        db.set_setting("reminders_enabled", "1").unwrap();
        assert_eq!(db.get_setting("reminders_enabled").unwrap(), "1");
        assert_eq!(count(&db, "settings"), 1);
    }

    #[test]
    fn test_get_missing_setting_is_empty() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.get_setting("theme").unwrap(), "");
    }

    #[test]
    fn test_in_memory_databases_are_isolated() {
        let a = Database::open_in_memory().unwrap();
        let b = Database::open_in_memory().unwrap();
        a.insert_bed(&new_bed("Tikai A")).unwrap();
        assert_eq!(a.list_beds().unwrap().len(), 1);
        assert!(b.list_beds().unwrap().is_empty());
    }
}
