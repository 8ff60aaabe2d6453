//! Template and editor API handlers.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::editor::{EditorSession, Snapshot};
use crate::template::{Face, FieldId, Group, Template};

use super::super::state::AppState;

/// GET /api/template - the full working state.
pub async fn current(State(state): State<Arc<AppState>>) -> Json<Snapshot> {
    let session = state.session.read().await;
    Json(session.snapshot())
}

/// Request body for opening a template selection.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenRequest {
    pub id_type: String,
    pub template_type: String,
    /// Raw template document, used when no matching snapshot exists.
    #[serde(default)]
    pub template: Option<Value>,
}

/// POST /api/template/open - restore the matching snapshot or import the
/// supplied document. A failed import leaves the current session intact.
pub async fn open(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OpenRequest>,
) -> Result<Json<Snapshot>, (StatusCode, String)> {
    if let Some(store) = &state.snapshots
        && let Some(snapshot) = store.load(&req.id_type, &req.template_type)
    {
        let session = EditorSession::restore(snapshot, Some(store.clone()));
        let snapshot = session.snapshot();
        *state.session.write().await = session;
        return Ok(Json(snapshot));
    }

    let Some(raw) = req.template else {
        return Err((
            StatusCode::BAD_REQUEST,
            "no stored snapshot and no template supplied".to_string(),
        ));
    };
    let template: Template = serde_json::from_value(raw)
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("template load failed: {e}")))?;

    let session = EditorSession::new(
        req.id_type,
        req.template_type,
        template,
        state.snapshots.clone(),
    );
    let snapshot = session.snapshot();
    *state.session.write().await = session;
    Ok(Json(snapshot))
}

/// POST /api/template/reset - clear the stored snapshot and start over
/// with an empty template.
pub async fn reset(State(state): State<Arc<AppState>>) -> Json<Snapshot> {
    if let Some(store) = &state.snapshots {
        store.clear();
    }
    let mut session = state.session.write().await;
    let (id_type, template_type) = (
        session.id_type().to_string(),
        session.template_type().to_string(),
    );
    *session = EditorSession::new(id_type, template_type, Template::empty(), None);
    Json(session.snapshot())
}

#[derive(Deserialize)]
pub struct SelectRequest {
    pub face: Face,
    pub id: FieldId,
    pub selected: bool,
}

/// POST /api/selection - toggle one field's visibility.
pub async fn select(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SelectRequest>,
) -> Json<Value> {
    let mut session = state.session.write().await;
    let changed = if req.selected {
        session.select(req.face, req.id)
    } else {
        session.deselect(req.face, req.id)
    };
    Json(json!({"changed": changed}))
}

#[derive(Deserialize)]
pub struct SelectAllRequest {
    pub face: Face,
    pub selected: bool,
}

/// POST /api/selection/all - select or clear a whole side.
pub async fn select_all(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SelectAllRequest>,
) -> StatusCode {
    let mut session = state.session.write().await;
    if req.selected {
        session.select_all(req.face);
    } else {
        session.clear_all(req.face);
    }
    StatusCode::NO_CONTENT
}

#[derive(Deserialize)]
pub struct MasterColorRequest {
    pub group: Group,
    pub value: String,
}

/// POST /api/groups/color - set a group master color.
pub async fn master_color(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MasterColorRequest>,
) -> StatusCode {
    let mut session = state.session.write().await;
    session.set_master_color(req.group, &req.value);
    StatusCode::NO_CONTENT
}

#[derive(Deserialize)]
pub struct MoveRequest {
    pub face: Face,
    pub id: FieldId,
}

/// POST /api/fields/move - move a field to the opposite side.
pub async fn move_field(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MoveRequest>,
) -> Json<Value> {
    let mut session = state.session.write().await;
    let moved = session.move_to_opposite_side(req.face, req.id);
    Json(json!({"moved": moved}))
}

#[derive(Deserialize)]
pub struct DragRequest {
    pub face: Face,
    pub id: FieldId,
    pub from: [f64; 2],
    pub to: [f64; 2],
}

/// POST /api/fields/drag - one complete pointer drag.
pub async fn drag(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DragRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let mut session = state.session.write().await;
    session
        .begin_drag(req.face, req.id, (req.from[0], req.from[1]))
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    session.update_drag((req.to[0], req.to[1]));
    let Some((left, top)) = session.end_drag() else {
        return Err((StatusCode::INTERNAL_SERVER_ERROR, "drag state lost".into()));
    };
    Ok(Json(
        json!({"left": left.to_string(), "top": top.to_string()}),
    ))
}

#[derive(Deserialize)]
pub struct CollapseRequest {
    pub panel: String,
    pub collapsed: bool,
}

/// POST /api/ui/collapse - persist a panel's collapse flag.
pub async fn collapse(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CollapseRequest>,
) -> StatusCode {
    let mut session = state.session.write().await;
    session.set_collapsed(&req.panel, req.collapsed);
    StatusCode::NO_CONTENT
}

#[derive(Deserialize)]
pub struct ExportQuery {
    /// Comma-separated sides to include; defaults to both.
    #[serde(default)]
    pub sides: Option<String>,
}

/// GET /api/export - the clean downloadable template.
pub async fn export(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ExportQuery>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let sides = parse_sides(query.sides.as_deref())
        .map_err(|e| (StatusCode::BAD_REQUEST, e))?;
    let session = state.session.read().await;
    let clean = session
        .export(&sides)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    serde_json::to_value(&clean)
        .map(Json)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

fn parse_sides(raw: Option<&str>) -> Result<Vec<Face>, String> {
    let Some(raw) = raw else {
        return Ok(vec![Face::Front, Face::Back]);
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| match s {
            "front" => Ok(Face::Front),
            "back" => Ok(Face::Back),
            other => Err(format!("unknown side: {other}")),
        })
        .collect()
}
