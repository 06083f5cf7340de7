// src/handlers/remuneracoes.rs

use axum::{
    extract::{Query, State},
    response::IntoResponse,
};

use crate::{
    common::{error::AppError, response::data},
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::{
        commission::{ExportFile, ImportReport, PaymentSummary},
        remuneracao::{Remuneracao, RemuneracaoFilters, SyncReport},
    },
};

#[utoipa::path(
    get,
    path = "/api/remuneracoes",
    tag = "Remuneracoes",
    params(RemuneracaoFilters),
    responses(
        (status = 200, description = "Remunerações visíveis (sincroniza antes de listar)", body = [Remuneracao])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_remuneracoes(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(filters): Query<RemuneracaoFilters>,
) -> Result<impl IntoResponse, AppError> {
    let rows = app_state.remuneracao_service.list(&user.context(), &filters).await?;
    Ok(data(rows))
}

#[utoipa::path(
    get,
    path = "/api/remuneracoes/summary",
    tag = "Remuneracoes",
    params(RemuneracaoFilters),
    responses(
        (status = 200, description = "Totais por status", body = PaymentSummary)
    ),
    security(("api_jwt" = []))
)]
pub async fn remuneracao_summary(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(filters): Query<RemuneracaoFilters>,
) -> Result<impl IntoResponse, AppError> {
    let summary = app_state.remuneracao_service.summary(&user.context(), &filters).await?;
    Ok(data(summary))
}

#[utoipa::path(
    post,
    path = "/api/remuneracoes/sync",
    tag = "Remuneracoes",
    responses(
        (status = 200, description = "Parcelas faltantes geradas", body = SyncReport)
    ),
    security(("api_jwt" = []))
)]
pub async fn sync_remuneracoes(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let report = app_state.remuneracao_service.sync(&user.context()).await?;
    Ok(data(report))
}

#[utoipa::path(
    get,
    path = "/api/remuneracoes/export",
    tag = "Remuneracoes",
    params(RemuneracaoFilters),
    responses(
        (status = 200, description = "Conteúdo CSV e metadados do arquivo", body = ExportFile),
        (status = 400, description = "Nenhuma remuneração para exportar")
    ),
    security(("api_jwt" = []))
)]
pub async fn export_remuneracoes(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(filters): Query<RemuneracaoFilters>,
) -> Result<impl IntoResponse, AppError> {
    let file = app_state.remuneracao_service.export(&user.context(), &filters).await?;
    Ok(data(file))
}

// Corpo da requisição é o próprio CSV (text/csv)
#[utoipa::path(
    post,
    path = "/api/remuneracoes/import",
    tag = "Remuneracoes",
    request_body(content = String, content_type = "text/csv", description = "CSV no formato da exportação"),
    responses(
        (status = 200, description = "Relatório da importação", body = ImportReport),
        (status = 400, description = "Cabeçalho inválido ou arquivo vazio")
    ),
    security(("api_jwt" = []))
)]
pub async fn import_remuneracoes(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    body: String,
) -> Result<impl IntoResponse, AppError> {
    let report = app_state.remuneracao_service.import(&user.context(), &body).await?;
    Ok(data(report))
}
