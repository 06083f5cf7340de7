// src/handlers/users.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    common::{error::AppError, response::data},
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::user::{
        CreateUserPayload, DeleteUserQuery, Role, SuperiorCandidates, UpdateUserPayload, User,
    },
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SuperiorCandidatesQuery {
    /// Role que o usuário passará a ter.
    pub role: Role,
}

// GET /api/users
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    responses(
        (status = 200, description = "Usuários visíveis para quem chama", body = [User])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let users = app_state.user_service.list(&user.context()).await?;
    Ok(data(users))
}

// GET /api/users/{id}
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Usuário", body = User),
        (status = 403, description = "Fora da hierarquia de quem chama")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_user(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let found = app_state.user_service.get(&user.context(), id).await?;
    Ok(data(found))
}

// POST /api/users
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    request_body = CreateUserPayload,
    responses(
        (status = 201, description = "Usuário criado", body = User),
        (status = 403, description = "Role não permitida para quem chama"),
        (status = 409, description = "E-mail já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_user(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    let created = app_state.user_service.create(&user.context(), payload).await?;
    Ok((StatusCode::CREATED, data(created)))
}

// PUT /api/users/{id}
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    request_body = UpdateUserPayload,
    responses(
        (status = 200, description = "Usuário atualizado", body = User)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_user(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    let updated = app_state.user_service.update(&user.context(), id, payload).await?;
    Ok(data(updated))
}

// DELETE /api/users/{id}?hard=true
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "ID do usuário"),
        ("hard" = Option<bool>, Query, description = "Exclusão definitiva em vez de desativar")
    ),
    responses(
        (status = 204, description = "Usuário desativado ou excluído"),
        (status = 409, description = "Usuário com subordinados ou vínculos")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_user(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Query(query): Query<DeleteUserQuery>,
) -> Result<impl IntoResponse, AppError> {
    app_state.user_service.delete(&user.context(), id, query.hard).await?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/users/{id}/superior-candidates?role=Assessor
#[utoipa::path(
    get,
    path = "/api/users/{id}/superior-candidates",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID do usuário"), SuperiorCandidatesQuery),
    responses(
        (status = 200, description = "Candidatos a superior para a nova role", body = SuperiorCandidates)
    ),
    security(("api_jwt" = []))
)]
pub async fn superior_candidates(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Query(query): Query<SuperiorCandidatesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let candidates = app_state
        .user_service
        .superior_candidates(&user.context(), id, query.role)
        .await?;
    Ok(data(candidates))
}
