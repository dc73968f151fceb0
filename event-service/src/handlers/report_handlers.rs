use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use log::info;
use rsvp_shared::store::EventStore;

use crate::error::Result;
use crate::report::{build_workbook, summarize, ReportSummary};
use crate::state::AppState;

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

// GET /reports/summary
pub async fn report_summary<S>(State(state): State<AppState<S>>) -> Result<Json<ReportSummary>>
where
    S: EventStore,
{
    let events = state.store.list_events().await?;
    Ok(Json(summarize(&events)))
}

// GET /reports/export
pub async fn export_report<S>(State(state): State<AppState<S>>) -> Result<Response>
where
    S: EventStore,
{
    let events = state.store.list_events().await?;
    let bytes = build_workbook(&events)?;

    let filename = format!("rsvp_report_{}.xlsx", Utc::now().format("%Y%m%d_%H%M%S"));
    info!("Exported report {} covering {} events", filename, events.len());

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response())
}
