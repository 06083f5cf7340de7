// src/handlers/investments.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::{error::AppError, response::data},
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::investment::{
        CreateInvestmentPayload, CreatedInvestment, Investment, InvestmentFilters, InvestmentPage,
        UpdateInvestmentStatusPayload,
    },
};

#[utoipa::path(
    get,
    path = "/api/investments",
    tag = "Investments",
    params(InvestmentFilters),
    responses(
        (status = 200, description = "Investimentos visíveis, paginados", body = InvestmentPage)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_investments(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(filters): Query<InvestmentFilters>,
) -> Result<impl IntoResponse, AppError> {
    let page = app_state.investment_service.list(&user.context(), &filters).await?;
    Ok(data(page))
}

// Cria o investimento e gera comissões e remunerações na mesma transação
#[utoipa::path(
    post,
    path = "/api/investments",
    tag = "Investments",
    request_body = CreateInvestmentPayload,
    responses(
        (status = 201, description = "Investimento e cronogramas criados", body = CreatedInvestment),
        (status = 400, description = "Valor fora dos limites da série ou comissões acima do teto")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_investment(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateInvestmentPayload>,
) -> Result<impl IntoResponse, AppError> {
    let created = app_state.investment_service.create(&user.context(), payload).await?;
    Ok((StatusCode::CREATED, data(created)))
}

#[utoipa::path(
    patch,
    path = "/api/investments/{id}/status",
    tag = "Investments",
    params(("id" = Uuid, Path, description = "ID do investimento")),
    request_body = UpdateInvestmentStatusPayload,
    responses(
        (status = 200, description = "Status atualizado", body = Investment),
        (status = 403, description = "Apenas Global")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_investment_status(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateInvestmentStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    let investment = app_state
        .investment_service
        .update_status(&user.context(), id, payload.status)
        .await?;
    Ok(data(investment))
}

#[utoipa::path(
    delete,
    path = "/api/investments/{id}",
    tag = "Investments",
    params(("id" = Uuid, Path, description = "ID do investimento")),
    responses(
        (status = 204, description = "Investimento excluído e captação devolvida"),
        (status = 409, description = "Investimento com parcelas pagas")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_investment(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.investment_service.delete(&user.context(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
