// src/common/db_utils.rs

use crate::common::error::AppError;

/// Converte violação de chave única em `Conflict` com mensagem amigável;
/// qualquer outro erro segue como erro de banco.
pub(crate) fn map_unique_violation(err: sqlx::Error, message: &str) -> AppError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            return AppError::Conflict(message.to_string());
        }
    }
    AppError::DatabaseError(err)
}

/// Limites de paginação usados pelas listagens.
pub(crate) const DEFAULT_PAGE_LIMIT: i64 = 50;
pub(crate) const MAX_PAGE_LIMIT: i64 = 200;

/// Normaliza (page, limit) vindos da query string e devolve (limit, offset).
pub(crate) fn page_window(page: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
    let page = page.unwrap_or(1).max(1);
    (limit, (page - 1) * limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_window_clamps_limit_and_page() {
        assert_eq!(page_window(None, None), (50, 0));
        assert_eq!(page_window(Some(3), Some(20)), (20, 40));
        assert_eq!(page_window(Some(0), Some(10_000)), (200, 0));
    }

    #[test]
    fn non_unique_errors_stay_database_errors() {
        let err = map_unique_violation(sqlx::Error::RowNotFound, "duplicado");
        assert!(matches!(err, AppError::DatabaseError(sqlx::Error::RowNotFound)));
    }
}
