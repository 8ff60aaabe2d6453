//! Sheet preview handlers.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::render::{CARDS_PER_SHEET, Record, paginate, render_deck};

use super::super::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    pub records: Vec<Record>,
    /// Zero-based sheet index; defaults to the first sheet.
    #[serde(default)]
    pub sheet: usize,
}

/// POST /api/sheets/preview - render one print sheet as PNG.
///
/// Uses the on-screen template (selected fields only). The record list is
/// taken as handed in; edits made while the preview renders do not affect
/// it.
pub async fn preview(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PreviewRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let Some(rasterizer) = &state.rasterizer else {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "sheet previews need a font; start the server with --font".to_string(),
        ));
    };

    let template = {
        let session = state.session.read().await;
        session.visible_template()
    };

    let deck = render_deck(&template, &req.records)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let images = {
        let mut resolver = state.resolver.write().await;
        resolver.resolve_deck(&deck).await
    };

    let sheets = paginate(deck.cards, CARDS_PER_SHEET);
    let sheet = sheets.get(req.sheet).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            format!("sheet {} of {} does not exist", req.sheet, sheets.len()),
        )
    })?;

    let canvas = rasterizer.rasterize_sheet(sheet, &images);
    let png = crate::render::raster::encode_png(&canvas).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Preview render failed: {e}"),
        )
    })?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}
