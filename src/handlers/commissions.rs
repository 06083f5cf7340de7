// src/handlers/commissions.rs

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::{error::AppError, response::data},
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::commission::{
        Commission, CommissionFilters, CommissionReport, ExportFile, ImportReport, PaymentSummary,
        UpdatePaymentStatusPayload,
    },
};

#[utoipa::path(
    get,
    path = "/api/commissions",
    tag = "Commissions",
    params(CommissionFilters),
    responses(
        (status = 200, description = "Parcelas de comissão visíveis", body = [Commission])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_commissions(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(filters): Query<CommissionFilters>,
) -> Result<impl IntoResponse, AppError> {
    let commissions = app_state.commission_service.list(&user.context(), &filters).await?;
    Ok(data(commissions))
}

#[utoipa::path(
    get,
    path = "/api/commissions/summary",
    tag = "Commissions",
    params(CommissionFilters),
    responses(
        (status = 200, description = "Totais por status", body = PaymentSummary)
    ),
    security(("api_jwt" = []))
)]
pub async fn commission_summary(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(filters): Query<CommissionFilters>,
) -> Result<impl IntoResponse, AppError> {
    let summary = app_state.commission_service.summary(&user.context(), &filters).await?;
    Ok(data(summary))
}

#[utoipa::path(
    patch,
    path = "/api/commissions/{id}/status",
    tag = "Commissions",
    params(("id" = Uuid, Path, description = "ID da parcela de comissão")),
    request_body = UpdatePaymentStatusPayload,
    responses(
        (status = 200, description = "Status atualizado", body = Commission),
        (status = 400, description = "Transição de status inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_commission_status(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePaymentStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    let commission = app_state
        .commission_service
        .update_status(&user.context(), id, payload)
        .await?;
    Ok(data(commission))
}

#[utoipa::path(
    get,
    path = "/api/commissions/report",
    tag = "Commissions",
    params(CommissionFilters),
    responses(
        (status = 200, description = "Totais gerais, por mês e por role, e parcelas vencidas", body = CommissionReport)
    ),
    security(("api_jwt" = []))
)]
pub async fn commission_report(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(filters): Query<CommissionFilters>,
) -> Result<impl IntoResponse, AppError> {
    let report = app_state.commission_service.report(&user.context(), &filters).await?;
    Ok(data(report))
}

#[utoipa::path(
    get,
    path = "/api/commissions/export",
    tag = "Commissions",
    params(CommissionFilters),
    responses(
        (status = 200, description = "Conteúdo CSV e metadados do arquivo", body = ExportFile),
        (status = 400, description = "Nenhuma comissão para exportar")
    ),
    security(("api_jwt" = []))
)]
pub async fn export_commissions(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(filters): Query<CommissionFilters>,
) -> Result<impl IntoResponse, AppError> {
    let file = app_state.commission_service.export(&user.context(), &filters).await?;
    Ok(data(file))
}

#[utoipa::path(
    post,
    path = "/api/commissions/import",
    tag = "Commissions",
    request_body(content = String, content_type = "text/csv", description = "CSV no formato da exportação de comissões"),
    responses(
        (status = 200, description = "Relatório da importação", body = ImportReport),
        (status = 400, description = "Cabeçalho inválido ou arquivo vazio")
    ),
    security(("api_jwt" = []))
)]
pub async fn import_commissions(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    body: String,
) -> Result<impl IntoResponse, AppError> {
    let report = app_state.commission_service.import(&user.context(), &body).await?;
    Ok(data(report))
}
