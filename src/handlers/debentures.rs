// src/handlers/debentures.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::{error::AppError, response::data},
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::debenture::{
        CreateDebenturePayload, CreateSeriesPayload, DebentureView, Series, UpdateDebenturePayload,
        UpdateSeriesPayload,
    },
};

// =============================================================================
//  DEBÊNTURES
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/debentures",
    tag = "Debentures",
    responses(
        (status = 200, description = "Debêntures ativas, com situação (ativa/vencida)", body = [DebentureView])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_debentures(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let debentures = app_state.debenture_service.list_debentures().await?;
    Ok(data(debentures))
}

#[utoipa::path(
    get,
    path = "/api/debentures/{id}",
    tag = "Debentures",
    params(("id" = Uuid, Path, description = "ID da debênture")),
    responses(
        (status = 200, description = "Debênture", body = DebentureView)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_debenture(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let debenture = app_state.debenture_service.get_debenture(id).await?;
    Ok(data(debenture))
}

#[utoipa::path(
    post,
    path = "/api/debentures",
    tag = "Debentures",
    request_body = CreateDebenturePayload,
    responses(
        (status = 201, description = "Debênture criada", body = DebentureView),
        (status = 403, description = "Apenas Global")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_debenture(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateDebenturePayload>,
) -> Result<impl IntoResponse, AppError> {
    let debenture = app_state
        .debenture_service
        .create_debenture(&user.context(), payload)
        .await?;
    Ok((StatusCode::CREATED, data(debenture)))
}

#[utoipa::path(
    put,
    path = "/api/debentures/{id}",
    tag = "Debentures",
    params(("id" = Uuid, Path, description = "ID da debênture")),
    request_body = UpdateDebenturePayload,
    responses(
        (status = 200, description = "Debênture atualizada", body = DebentureView)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_debenture(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDebenturePayload>,
) -> Result<impl IntoResponse, AppError> {
    let debenture = app_state
        .debenture_service
        .update_debenture(&user.context(), id, payload)
        .await?;
    Ok(data(debenture))
}

#[utoipa::path(
    delete,
    path = "/api/debentures/{id}",
    tag = "Debentures",
    params(("id" = Uuid, Path, description = "ID da debênture")),
    responses(
        (status = 204, description = "Debênture excluída"),
        (status = 409, description = "Debênture com séries ativas")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_debenture(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.debenture_service.delete_debenture(&user.context(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  SÉRIES
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/debentures/{id}/series",
    tag = "Debentures",
    params(("id" = Uuid, Path, description = "ID da debênture")),
    responses(
        (status = 200, description = "Séries ativas da debênture", body = [Series])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_series(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let series = app_state.debenture_service.list_series(id).await?;
    Ok(data(series))
}

#[utoipa::path(
    post,
    path = "/api/debentures/{id}/series",
    tag = "Debentures",
    params(("id" = Uuid, Path, description = "ID da debênture")),
    request_body = CreateSeriesPayload,
    responses(
        (status = 201, description = "Série criada", body = Series),
        (status = 409, description = "Código de série já existe na debênture")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_series(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateSeriesPayload>,
) -> Result<impl IntoResponse, AppError> {
    let series = app_state
        .debenture_service
        .create_series(&user.context(), id, payload)
        .await?;
    Ok((StatusCode::CREATED, data(series)))
}

#[utoipa::path(
    put,
    path = "/api/series/{id}",
    tag = "Debentures",
    params(("id" = Uuid, Path, description = "ID da série")),
    request_body = UpdateSeriesPayload,
    responses(
        (status = 200, description = "Série atualizada", body = Series)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_series(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSeriesPayload>,
) -> Result<impl IntoResponse, AppError> {
    let series = app_state
        .debenture_service
        .update_series(&user.context(), id, payload)
        .await?;
    Ok(data(series))
}

#[utoipa::path(
    delete,
    path = "/api/series/{id}",
    tag = "Debentures",
    params(("id" = Uuid, Path, description = "ID da série")),
    responses(
        (status = 204, description = "Série excluída"),
        (status = 409, description = "Série com investimentos")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_series(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.debenture_service.delete_series(&user.context(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
