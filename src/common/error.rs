// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro único. Services e repositórios devolvem AppError e o
// handler converte para HTTP uma única vez (IntoResponse).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Um ou mais campos são inválidos.")]
    ValidationError(#[from] validator::ValidationErrors),

    // Regras de negócio (comissão acima do teto, valor abaixo do mínimo, ...)
    #[error("{0}")]
    BusinessRule(String),

    #[error("E-mail ou senha inválidos.")]
    InvalidCredentials,

    #[error("Token inválido ou expirado. Faça login novamente.")]
    InvalidToken,

    #[error("Usuário inativo.")]
    InactiveUser,

    #[error("Acesso Negado. {0}")]
    AccessDenied(String),

    #[error("{0} não encontrado(a).")]
    ResourceNotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Arquivo CSV inválido: {0}")]
    InvalidCsv(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Erro de CSV: {0}")]
    CsvError(#[from] csv::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::BusinessRule(_)
            | AppError::InvalidCsv(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::InactiveUser | AppError::AccessDenied(_) => StatusCode::FORBIDDEN,
            AppError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            AppError::DatabaseError(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Código estável enviado ao cliente (o front decide se faz retry com base nele).
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) | AppError::BusinessRule(_) => "VALIDATION_FAILED",
            AppError::InvalidCsv(_) | AppError::CsvError(_) => "IMPORT_ERROR",
            AppError::InvalidCredentials => "AUTH_INVALID",
            AppError::InvalidToken => "AUTH_MISSING",
            AppError::InactiveUser => "USER_INACTIVE",
            AppError::AccessDenied(_) => "ACCESS_DENIED",
            AppError::ResourceNotFound(_) => "NOT_FOUND",
            AppError::DatabaseError(sqlx::Error::RowNotFound) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            _ => "INTERNAL_ERROR",
        }
    }

    pub fn rule(message: impl Into<String>) -> Self {
        AppError::BusinessRule(message.into())
    }

    pub fn denied(message: impl Into<String>) -> Self {
        AppError::AccessDenied(message.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        AppError::ResourceNotFound(resource.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let timestamp = Utc::now().to_rfc3339();

        if let AppError::ValidationError(errors) = &self {
            // Retorna todos os detalhes da validação, campo a campo.
            let mut details = std::collections::HashMap::new();
            for (field, field_errors) in errors.field_errors() {
                let messages: Vec<String> = field_errors
                    .iter()
                    .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .collect();
                details.insert(field.to_string(), messages);
            }
            let body = Json(json!({
                "error": {
                    "code": code,
                    "message": self.to_string(),
                    "timestamp": timestamp,
                    "details": details,
                }
            }));
            return (status, body).into_response();
        }

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("🔥 Erro Interno do Servidor: {:?}", self);
            "Ocorreu um erro inesperado.".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
                "timestamp": timestamp,
            }
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_each_error_family_to_its_http_status() {
        assert_eq!(AppError::rule("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::denied("x").status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::not_found("Série").status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::DatabaseError(sqlx::Error::RowNotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::InternalServerError(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn access_denied_message_is_user_facing() {
        let err = AppError::denied("Apenas usuários Global podem excluir debêntures.");
        assert_eq!(err.code(), "ACCESS_DENIED");
        assert!(err.to_string().starts_with("Acesso Negado."));
    }
}
