use std::collections::HashMap;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use garden_core::models::{
    Bed, BedDetail, BedForm, OTHER_PLANT_CHOICE, PLANT_OPTIONS, Plant, PlantChoice, Reminders,
    TASK_TYPES, Task, TaskForm, UpdateTask, validate_bed_name, validate_task_type,
};
use garden_core::service::GardenService;
use garden_core::uploads::Upload;

const BODY_LIMIT: usize = 20 * 1024 * 1024; // 20 MB

const PLACEHOLDER_SVG: &str = include_str!("../static/placeholder.svg");

#[derive(Clone)]
struct AppState {
    svc: GardenService,
}

// --- Request / Response types ---

#[derive(Deserialize)]
struct BedSearchQuery {
    search: Option<String>,
}

#[derive(Deserialize)]
struct DeleteBedQuery {
    #[serde(default)]
    confirm: bool,
}

#[derive(Deserialize)]
struct AddPlantRequest {
    name: Option<String>,
    custom: Option<String>,
}

#[derive(Deserialize)]
struct UpdateTaskRequest {
    task_type: String,
    task_date: Option<String>,
}

#[derive(Deserialize)]
struct RemindersQuery {
    date: Option<String>,
}

#[derive(Deserialize, Serialize)]
struct RemindersSetting {
    enabled: bool,
}

#[derive(Serialize)]
struct OptionsResponse {
    task_types: &'static [&'static str],
    plant_options: &'static [&'static str],
    other_plant_choice: &'static str,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// --- Error handling ---

enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(err) => {
                tracing::error!("Internal server error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

#[allow(clippy::needless_pass_by_value)]
fn bad_request(err: anyhow::Error) -> ApiError {
    ApiError::BadRequest(format!("{err}"))
}

fn parse_form_date(value: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(d) => NaiveDate::parse_from_str(d, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("Invalid date '{d}'. Use YYYY-MM-DD"))),
    }
}

fn lookup_bed(state: &AppState, id: i64) -> Result<Bed, ApiError> {
    state
        .svc
        .db()
        .find_bed(id)
        .context("database error")?
        .ok_or_else(|| ApiError::NotFound(format!("Bed {id} not found")))
}

fn lookup_task(state: &AppState, id: i64) -> Result<Task, ApiError> {
    state
        .svc
        .db()
        .find_task(id)
        .context("database error")?
        .ok_or_else(|| ApiError::NotFound(format!("Task {id} not found")))
}

// --- Multipart forms ---

/// Text fields of a multipart form plus the optional `photo` file part.
/// A file part sent without a file name counts as "no photo".
#[derive(Default)]
struct FormData {
    fields: HashMap<String, String>,
    photo: Option<Upload>,
}

impl FormData {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = FormData::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Invalid form data: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "photo" {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Invalid photo upload: {e}")))?;
                if !filename.is_empty() {
                    form.photo = Some(Upload::new(filename, data.to_vec()));
                }
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Invalid field '{name}': {e}")))?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    fn take(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }
}

// --- Middleware ---

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

// --- Bed handlers ---

async fn list_beds(
    State(state): State<AppState>,
    Query(params): Query<BedSearchQuery>,
) -> Result<Json<Vec<Bed>>, ApiError> {
    let beds = state
        .svc
        .list_beds(params.search.as_deref())
        .context("failed to list beds")?;
    Ok(Json(beds))
}

async fn create_bed(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Bed>), ApiError> {
    let mut data = FormData::read(multipart).await?;
    let form = BedForm {
        name: data.take("name").unwrap_or_default(),
        description: data.take("description").unwrap_or_default(),
        location_hint: data.take("location_hint").unwrap_or_default(),
        photo: data.photo.take(),
    };
    validate_bed_name(&form.name).map_err(bad_request)?;

    let bed = state
        .svc
        .create_bed(&form)
        .context("failed to create bed")?;
    Ok((StatusCode::CREATED, Json(bed)))
}

async fn get_bed(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<BedDetail>, ApiError> {
    lookup_bed(&state, id)?;
    let detail = state.svc.bed_detail(id).context("database error")?;
    Ok(Json(detail))
}

/// Fields left out of the form keep their current values; the photo only
/// changes when a file is sent.
async fn update_bed(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Bed>, ApiError> {
    let current = lookup_bed(&state, id)?;
    let mut data = FormData::read(multipart).await?;
    let form = BedForm {
        name: data.take("name").unwrap_or(current.name),
        description: data.take("description").unwrap_or(current.description),
        location_hint: data.take("location_hint").unwrap_or(current.location_hint),
        photo: data.photo.take(),
    };
    validate_bed_name(&form.name).map_err(bad_request)?;

    let bed = state
        .svc
        .update_bed(id, &form)
        .context("failed to update bed")?;
    Ok(Json(bed))
}

async fn delete_bed(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<DeleteBedQuery>,
) -> Result<StatusCode, ApiError> {
    if !params.confirm {
        return Err(ApiError::BadRequest(
            "Deleting a bed also deletes its plants and tasks. Pass confirm=true".to_string(),
        ));
    }
    if state.svc.delete_bed(id).context("database error")? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Bed {id} not found")))
    }
}

// --- Plant handlers ---

async fn list_plants(
    State(state): State<AppState>,
    Path(bed_id): Path<i64>,
) -> Result<Json<Vec<Plant>>, ApiError> {
    lookup_bed(&state, bed_id)?;
    let plants = state.svc.list_plants(bed_id).context("database error")?;
    Ok(Json(plants))
}

async fn add_plant(
    State(state): State<AppState>,
    Path(bed_id): Path<i64>,
    Json(req): Json<AddPlantRequest>,
) -> Result<(StatusCode, Json<Plant>), ApiError> {
    lookup_bed(&state, bed_id)?;
    let selection = req.name.as_deref().unwrap_or(OTHER_PLANT_CHOICE);
    let choice = PlantChoice::from_selection(selection, req.custom.as_deref().unwrap_or_default());
    choice.resolve_name().map_err(bad_request)?;

    let plant = state
        .svc
        .add_plant(bed_id, &choice)
        .context("failed to add plant")?;
    Ok((StatusCode::CREATED, Json(plant)))
}

// --- Task handlers ---

async fn list_tasks(
    State(state): State<AppState>,
    Path(bed_id): Path<i64>,
) -> Result<Json<Vec<Task>>, ApiError> {
    lookup_bed(&state, bed_id)?;
    let tasks = state.svc.pending_tasks(bed_id).context("database error")?;
    Ok(Json(tasks))
}

async fn create_task(
    State(state): State<AppState>,
    Path(bed_id): Path<i64>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    lookup_bed(&state, bed_id)?;
    let mut data = FormData::read(multipart).await?;
    let task_type = data.take("task_type").unwrap_or_default();
    validate_task_type(&task_type).map_err(bad_request)?;
    let form = TaskForm {
        task_type,
        task_date: parse_form_date(data.take("task_date").as_deref())?,
        photo: data.photo.take(),
    };

    let task = state
        .svc
        .add_task(bed_id, &form)
        .context("failed to create task")?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<Json<Task>, ApiError> {
    if lookup_task(&state, id)?.is_completed() {
        return Err(ApiError::BadRequest(format!(
            "Task {id} is already completed and can no longer be edited"
        )));
    }
    let task_type = validate_task_type(&req.task_type).map_err(bad_request)?;
    let task_date = parse_form_date(req.task_date.as_deref())?;

    let task = state
        .svc
        .update_task(
            id,
            &UpdateTask {
                task_type,
                task_date,
            },
        )
        .context("failed to update task")?;
    Ok(Json(task))
}

async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.svc.delete_task(id).context("database error")? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Task {id} not found")))
    }
}

async fn complete_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Task>, ApiError> {
    if lookup_task(&state, id)?.is_completed() {
        return Err(ApiError::BadRequest(format!(
            "Task {id} is already completed"
        )));
    }
    let task = state
        .svc
        .complete_task(id)
        .context("failed to complete task")?;
    Ok(Json(task))
}

async fn attach_task_photo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Task>, ApiError> {
    let task = lookup_task(&state, id)?;
    if !task.is_completed() {
        return Err(ApiError::BadRequest(format!(
            "Task {id} is not completed yet; photos are added after the work is done"
        )));
    }
    let data = FormData::read(multipart).await?;
    if data.photo.is_some() && !task.photo_path.is_empty() {
        return Err(ApiError::BadRequest(format!("Task {id} already has a photo")));
    }
    let task = state
        .svc
        .attach_task_photo(id, data.photo.as_ref())
        .context("failed to attach photo")?;
    Ok(Json(task))
}

// --- Reminders, history, options ---

async fn get_reminders(
    State(state): State<AppState>,
    Query(params): Query<RemindersQuery>,
) -> Result<Json<Reminders>, ApiError> {
    let reminders = match parse_form_date(params.date.as_deref())? {
        Some(day) => state.svc.reminders(day),
        None => state.svc.todays_reminders(),
    }
    .context("database error")?;
    Ok(Json(reminders))
}

async fn set_reminders(
    State(state): State<AppState>,
    Json(req): Json<RemindersSetting>,
) -> Result<Json<RemindersSetting>, ApiError> {
    state
        .svc
        .set_reminders_enabled(req.enabled)
        .context("failed to save setting")?;
    let enabled = state.svc.reminders_enabled().context("database error")?;
    Ok(Json(RemindersSetting { enabled }))
}

async fn get_history(State(state): State<AppState>) -> Result<Json<Vec<Task>>, ApiError> {
    let tasks = state.svc.history().context("database error")?;
    Ok(Json(tasks))
}

async fn get_options() -> Json<OptionsResponse> {
    Json(OptionsResponse {
        task_types: TASK_TYPES,
        plant_options: PLANT_OPTIONS,
        other_plant_choice: OTHER_PLANT_CHOICE,
    })
}

// --- Photos ---

async fn placeholder() -> Response {
    ([(header::CONTENT_TYPE, "image/svg+xml")], PLACEHOLDER_SVG).into_response()
}

/// Serve a stored photo. Empty, unknown, or unreadable names get the placeholder.
async fn get_photo(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match state.svc.photo(&name) {
        Some(bytes) => {
            let mime = mime_guess::from_path(&name).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.to_string())], bytes).into_response()
        }
        None => placeholder().await,
    }
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/beds", get(list_beds).post(create_bed))
        .route(
            "/api/beds/{id}",
            get(get_bed).put(update_bed).delete(delete_bed),
        )
        .route("/api/beds/{id}/plants", get(list_plants).post(add_plant))
        .route("/api/beds/{id}/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/{id}", put(update_task).delete(delete_task))
        .route("/api/tasks/{id}/complete", post(complete_task))
        .route("/api/tasks/{id}/photo", post(attach_task_photo))
        .route("/api/reminders", get(get_reminders))
        .route("/api/settings/reminders", put(set_reminders))
        .route("/api/history", get(get_history))
        .route("/api/options", get(get_options))
        .route("/photos/placeholder.svg", get(placeholder))
        .route("/photos/{name}", get(get_photo))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// --- Server startup ---

pub async fn start_server(svc: GardenService, port: u16, bind: &str) -> anyhow::Result<()> {
    tracing::info!(uploads = %svc.uploads().dir().display(), "serving photos");
    let app = build_router(AppState { svc });

    if bind != "127.0.0.1" && bind != "localhost" {
        tracing::warn!(
            "Listening on {bind} with no authentication. Any device on your network can change your garden data."
        );
    }

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}"))
        .await
        .with_context(|| format!("failed to bind {bind}:{port}"))?;
    tracing::info!("Listening on http://{bind}:{port}");
    axum::serve(listener, app).await?;

    Ok(())
}
