// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users: time log ingestion and reports.

use super::ApiResponse;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Period, Report, TimeLog, TimeLogFilter, TimeLogView};
use crate::time_utils::{local_midnight, parse_calendar_date};
use crate::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{delete, get},
    Extension, Json, Router,
};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/timelog", get(list_time_logs).post(create_time_log))
        .route("/api/timelog/{id}", delete(delete_time_log))
        .route("/api/report", get(get_report))
}

/// Accept RFC 3339 or a bare `YYYY-MM-DD` (local midnight of that day).
fn parse_timestamp(raw: &str, param: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|date| local_midnight(date, &Local).with_timezone(&Utc))
        .map_err(|_| {
            AppError::BadRequest(format!(
                "Invalid '{}' parameter: must be RFC3339 datetime or YYYY-MM-DD",
                param
            ))
        })
}

// ─── Time Logs ───────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateTimeLogRequest {
    pub site: String,
    pub hostname: String,
    /// Milliseconds
    pub time_spent: u64,
    pub title: Option<String>,
    pub url: Option<String>,
    pub date: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeLogData {
    pub time_log: TimeLogView,
}

async fn create_time_log(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    payload: std::result::Result<Json<CreateTimeLogRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<TimeLogData>>)> {
    let Json(req) = payload?;

    if req.site.trim().is_empty() || req.hostname.trim().is_empty() || req.time_spent == 0 {
        return Err(AppError::BadRequest(
            "Site, timeSpent, and hostname are required".to_string(),
        ));
    }

    let now = Utc::now();
    let date = match req.date.as_deref() {
        Some(raw) => parse_timestamp(raw, "date")?,
        None => now,
    };

    let log = TimeLog {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user.user_id,
        site: req.site,
        hostname: req.hostname,
        time_spent: req.time_spent,
        title: req.title.unwrap_or_default(),
        url: req.url.unwrap_or_default(),
        date,
        created_at: now,
    };

    state.store.insert_time_log(&log).await?;

    tracing::debug!(
        user_id = %log.user_id,
        hostname = %log.hostname,
        time_spent = log.time_spent,
        "Time log saved"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Time log saved successfully",
            TimeLogData {
                time_log: TimeLogView::from(&log),
            },
        )),
    ))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimeLogsQuery {
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_limit")]
    limit: u32,
    hostname: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
}

fn default_page() -> u32 {
    1
}
fn default_limit() -> u32 {
    50
}

const MAX_LIMIT: u32 = 100;

#[derive(Serialize, Debug, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub pages: u64,
}

impl Pagination {
    fn new(page: u32, limit: u32, total: u64) -> Self {
        Self {
            page,
            limit,
            total,
            pages: total.div_ceil(u64::from(limit.max(1))),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeLogsData {
    pub time_logs: Vec<TimeLogView>,
    pub pagination: Pagination,
}

/// List the caller's time logs, newest first.
async fn list_time_logs(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    params: std::result::Result<Query<TimeLogsQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<TimeLogsData>>> {
    let Query(params) = params?;

    if params.page < 1 {
        return Err(AppError::BadRequest(
            "Page must be greater than 0".to_string(),
        ));
    }
    let limit = params.limit.clamp(1, MAX_LIMIT);

    let filter = TimeLogFilter {
        hostname: params.hostname.filter(|h| !h.is_empty()),
        start: params
            .start_date
            .as_deref()
            .map(|raw| parse_timestamp(raw, "startDate"))
            .transpose()?,
        end: params
            .end_date
            .as_deref()
            .map(|raw| parse_timestamp(raw, "endDate"))
            .transpose()?,
    };

    let offset = (params.page as usize - 1)
        .checked_mul(limit as usize)
        .ok_or_else(|| AppError::BadRequest("Page number causes overflow".to_string()))?;

    tracing::debug!(
        user_id = %user.user_id,
        page = params.page,
        limit,
        hostname = ?filter.hostname,
        "Fetching time logs"
    );

    let (logs, total) = state
        .store
        .list_time_logs(&user.user_id, &filter, offset, limit as usize)
        .await?;

    Ok(Json(ApiResponse::ok(TimeLogsData {
        time_logs: logs.iter().map(TimeLogView::from).collect(),
        pagination: Pagination::new(params.page, limit, total),
    })))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteTimeLogResponse {
    pub success: bool,
    pub message: String,
}

/// Delete one of the caller's time logs. Other users' logs look absent.
async fn delete_time_log(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<DeleteTimeLogResponse>> {
    if !state.store.delete_time_log(&user.user_id, &id).await? {
        return Err(AppError::NotFound("Time log not found".to_string()));
    }

    tracing::info!(user_id = %user.user_id, time_log_id = %id, "Time log deleted");

    Ok(Json(DeleteTimeLogResponse {
        success: true,
        message: "Time log deleted successfully".to_string(),
    }))
}

// ─── Reports ─────────────────────────────────────────────────

#[derive(Deserialize, Default)]
struct ReportQuery {
    period: Option<String>,
    date: Option<String>,
}

/// Per-site report for the caller over a daily or weekly window.
async fn get_report(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    params: std::result::Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Report>>> {
    let Query(params) = params?;

    let period = match params.period.as_deref() {
        None | Some("") => Period::Daily,
        Some(raw) => raw.parse::<Period>().map_err(AppError::BadRequest)?,
    };

    let anchor = params
        .date
        .as_deref()
        .filter(|d| !d.is_empty())
        .map(|raw| {
            parse_calendar_date(raw).ok_or_else(|| {
                AppError::BadRequest(
                    "Invalid 'date' parameter: must be YYYY-MM-DD or RFC3339".to_string(),
                )
            })
        })
        .transpose()?;

    let report = state
        .reports
        .report(&user.user_id, period, anchor, Local::now())
        .await?;

    Ok(Json(ApiResponse::ok(report)))
}
