use std::sync::{Mutex, MutexGuard};

use actix_web::http::StatusCode;
use actix_web::{middleware, web, App, HttpResponse, HttpServer, ResponseError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::error::LineCallerError;
use crate::roster::{Gender, Player, PlayerEdit, PlayerId, Position, Preference};
use crate::rotation::{Context, HistoryEntry, PoolFilter, RatioLabel, RatioSelection};
use crate::state::{LineSummary, PersistedState, Session, StateStore};

/// Shared server state: one session behind a lock, plus where to persist it
pub struct ServerState {
    pub session: Mutex<Session>,
    pub store: Option<StateStore>,
}

impl ServerState {
    pub fn new(session: Session, store: Option<StateStore>) -> Self {
        Self {
            session: Mutex::new(session),
            store,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Session>> {
        self.session.lock().map_err(|_| {
            error!("session lock poisoned");
            actix_web::error::ErrorInternalServerError("session unavailable")
        })
    }

    fn persist(&self, session: &Session) {
        if let Some(store) = &self.store {
            store.save_or_warn(session.state());
        }
    }
}

impl ResponseError for LineCallerError {
    fn status_code(&self) -> StatusCode {
        match self {
            LineCallerError::LineFull => StatusCode::CONFLICT,
            LineCallerError::NotInLine(_) | LineCallerError::UnknownPlayer(_) => StatusCode::NOT_FOUND,
            LineCallerError::NotEligible(_) | LineCallerError::InvalidPlayer(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            LineCallerError::MalformedImport(_)
            | LineCallerError::UnsupportedSchemaVersion(_)
            | LineCallerError::Json(_) => StatusCode::BAD_REQUEST,
            LineCallerError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .json(json!({"success": false, "error": self.to_string()}))
    }
}

#[derive(Deserialize)]
pub struct NewPlayerRequest {
    name: String,
    gender: Gender,
    position: Position,
    pref: Preference,
}

#[derive(Deserialize)]
pub struct AvailabilityRequest {
    /// Missing means toggle
    available: Option<bool>,
}

#[derive(Deserialize)]
pub struct RotationRequest {
    context: Option<Context>,
    ratio: Option<RatioSelection>,
}

#[derive(Deserialize)]
pub struct SubstituteRequest {
    outgoing: Option<PlayerId>,
    incoming: PlayerId,
    #[serde(default)]
    filter: PoolFilter,
}

#[derive(Serialize)]
pub struct LineResponse {
    players: Vec<Player>,
    summary: LineSummary,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateResponse {
    state: PersistedState,
    line: LineResponse,
    next_ratio_label: RatioLabel,
}

#[derive(Serialize)]
pub struct PointResponse {
    success: bool,
    entry: Option<HistoryEntry>,
}

fn line_response(session: &Session) -> LineResponse {
    LineResponse {
        players: session.line_players().into_iter().cloned().collect(),
        summary: session.line_summary(),
    }
}

// State and roster

async fn get_state(state: web::Data<ServerState>) -> Result<HttpResponse> {
    let session = state.lock()?;
    Ok(HttpResponse::Ok().json(StateResponse {
        state: session.export(),
        line: line_response(&session),
        next_ratio_label: session.next_ratio(),
    }))
}

async fn get_roster(state: web::Data<ServerState>) -> Result<HttpResponse> {
    let session = state.lock()?;
    let players: Vec<&Player> = session.roster().sorted_by_name();
    Ok(HttpResponse::Ok().json(players))
}

async fn add_player(
    req: web::Json<NewPlayerRequest>,
    state: web::Data<ServerState>,
) -> Result<HttpResponse> {
    let mut session = state.lock()?;
    let id = session.add_player(&req.name, req.gender, req.position, req.pref)?;
    state.persist(&session);
    Ok(HttpResponse::Created().json(json!({"success": true, "id": id})))
}

async fn edit_player(
    id: web::Path<String>,
    req: web::Json<PlayerEdit>,
    state: web::Data<ServerState>,
) -> Result<HttpResponse> {
    let id = PlayerId::new(id.into_inner());
    let mut session = state.lock()?;
    session.edit_player(&id, req.into_inner())?;
    state.persist(&session);
    Ok(HttpResponse::Ok().json(json!({"success": true})))
}

async fn delete_player(id: web::Path<String>, state: web::Data<ServerState>) -> Result<HttpResponse> {
    let id = PlayerId::new(id.into_inner());
    let mut session = state.lock()?;
    session.delete_player(&id)?;
    state.persist(&session);
    Ok(HttpResponse::Ok().json(json!({"success": true, "line": line_response(&session)})))
}

async fn set_availability(
    id: web::Path<String>,
    req: web::Json<AvailabilityRequest>,
    state: web::Data<ServerState>,
) -> Result<HttpResponse> {
    let id = PlayerId::new(id.into_inner());
    let mut session = state.lock()?;
    let available = match req.available {
        Some(available) => {
            session.set_available(&id, available)?;
            available
        }
        None => session.toggle_available(&id)?,
    };
    state.persist(&session);
    Ok(HttpResponse::Ok().json(json!({"success": true, "available": available})))
}

async fn set_rotation(
    req: web::Json<RotationRequest>,
    state: web::Data<ServerState>,
) -> Result<HttpResponse> {
    let mut session = state.lock()?;
    if let Some(context) = req.context {
        session.set_context(context);
    }
    if let Some(ratio) = req.ratio {
        session.select_ratio(ratio);
    }
    state.persist(&session);
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "rotation": session.rotation(),
        "nextRatioLabel": session.next_ratio(),
    })))
}

// Line building

async fn get_line(state: web::Data<ServerState>) -> Result<HttpResponse> {
    let session = state.lock()?;
    Ok(HttpResponse::Ok().json(line_response(&session)))
}

async fn suggest_line(state: web::Data<ServerState>) -> Result<HttpResponse> {
    let mut session = state.lock()?;
    session.suggest();
    Ok(HttpResponse::Ok().json(line_response(&session)))
}

async fn line_candidates(
    filter: web::Query<PoolFilter>,
    state: web::Data<ServerState>,
) -> Result<HttpResponse> {
    let session = state.lock()?;
    let pool: Vec<&Player> = session.substitution_pool(&filter);
    Ok(HttpResponse::Ok().json(pool))
}

async fn substitute(
    req: web::Json<SubstituteRequest>,
    state: web::Data<ServerState>,
) -> Result<HttpResponse> {
    let mut session = state.lock()?;
    session.substitute(req.outgoing.as_ref(), &req.incoming, &req.filter)?;
    Ok(HttpResponse::Ok().json(line_response(&session)))
}

async fn remove_from_line(
    id: web::Path<String>,
    state: web::Data<ServerState>,
) -> Result<HttpResponse> {
    let id = PlayerId::new(id.into_inner());
    let mut session = state.lock()?;
    session.remove_from_line(&id);
    Ok(HttpResponse::Ok().json(line_response(&session)))
}

async fn clear_line(state: web::Data<ServerState>) -> Result<HttpResponse> {
    let mut session = state.lock()?;
    session.clear_line();
    Ok(HttpResponse::Ok().json(line_response(&session)))
}

// Ledger

async fn confirm_point(state: web::Data<ServerState>) -> Result<HttpResponse> {
    let mut session = state.lock()?;
    let entry = session.confirm();
    if entry.is_some() {
        state.persist(&session);
    }
    Ok(HttpResponse::Ok().json(PointResponse {
        success: true,
        entry,
    }))
}

async fn undo_point(state: web::Data<ServerState>) -> Result<HttpResponse> {
    let mut session = state.lock()?;
    let entry = session.undo();
    if entry.is_some() {
        state.persist(&session);
    }
    Ok(HttpResponse::Ok().json(PointResponse {
        success: true,
        entry,
    }))
}

async fn get_history(state: web::Data<ServerState>) -> Result<HttpResponse> {
    let session = state.lock()?;
    Ok(HttpResponse::Ok().json(session.history()))
}

// Import / export

async fn export_state(state: web::Data<ServerState>) -> Result<HttpResponse> {
    let session = state.lock()?;
    Ok(HttpResponse::Ok()
        .insert_header((
            "Content-Disposition",
            "attachment; filename=\"ultimate_line_caller.json\"",
        ))
        .json(session.export()))
}

async fn import_state(body: web::Json<Value>, state: web::Data<ServerState>) -> Result<HttpResponse> {
    let mut session = state.lock()?;
    session.import(&body)?;
    state.persist(&session);
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "players": session.roster().len(),
        "points": session.history().len(),
    })))
}

/// Registers every API route
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/state", web::get().to(get_state))
        .route("/api/roster", web::get().to(get_roster))
        .route("/api/players", web::post().to(add_player))
        .route("/api/players/{id}", web::put().to(edit_player))
        .route("/api/players/{id}", web::delete().to(delete_player))
        .route("/api/players/{id}/availability", web::post().to(set_availability))
        .route("/api/rotation", web::post().to(set_rotation))
        .route("/api/line", web::get().to(get_line))
        .route("/api/line/suggest", web::post().to(suggest_line))
        .route("/api/line/candidates", web::get().to(line_candidates))
        .route("/api/line/substitute", web::post().to(substitute))
        .route("/api/line/clear", web::post().to(clear_line))
        .route("/api/line/confirm", web::post().to(confirm_point))
        .route("/api/line/{id}", web::delete().to(remove_from_line))
        .route("/api/undo", web::post().to(undo_point))
        .route("/api/history", web::get().to(get_history))
        .route("/api/export", web::get().to(export_state))
        .route("/api/import", web::post().to(import_state));
}

pub async fn start_server(config: ServerConfig, session: Session, store: StateStore) -> std::io::Result<()> {
    let app_state = web::Data::new(ServerState::new(session, Some(store)));
    info!(host = %config.host, port = config.port, "starting web server");

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
