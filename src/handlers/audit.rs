// src/handlers/audit.rs

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use chrono::Utc;

use crate::{
    common::{error::AppError, response::data},
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::audit::{AuditFilters, AuditLog, AuditStats, AuditStatsQuery},
};

#[utoipa::path(
    get,
    path = "/api/audit-logs",
    tag = "Audit",
    params(AuditFilters),
    responses(
        (status = 200, description = "Trilha de auditoria (Global vê todos)", body = [AuditLog])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_audit_logs(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(filters): Query<AuditFilters>,
) -> Result<impl IntoResponse, AppError> {
    let logs = app_state.audit_service.list(&user.context(), &filters).await?;
    Ok(data(logs))
}

#[utoipa::path(
    get,
    path = "/api/audit-logs/stats",
    tag = "Audit",
    params(AuditStatsQuery),
    responses(
        (status = 200, description = "Totais por ação e recurso", body = AuditStats)
    ),
    security(("api_jwt" = []))
)]
pub async fn audit_stats(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<AuditStatsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let stats = app_state.audit_service.stats(&user.context(), query.days).await?;
    Ok(data(stats))
}

#[utoipa::path(
    get,
    path = "/api/audit-logs/export",
    tag = "Audit",
    params(AuditFilters),
    responses(
        (status = 200, description = "CSV da trilha de auditoria", content_type = "text/csv", body = String)
    ),
    security(("api_jwt" = []))
)]
pub async fn export_audit_logs(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(filters): Query<AuditFilters>,
) -> Result<impl IntoResponse, AppError> {
    let csv = app_state.audit_service.export(&user.context(), &filters).await?;
    let disposition = format!(
        "attachment; filename=\"auditoria_{}.csv\"",
        Utc::now().format("%Y-%m-%d")
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}
