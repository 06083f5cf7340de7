// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_unique_violation, error::AppError},
    models::user::{Role, User, UserNode, UserStatus, UserSummary},
};

/// Campos gravados na criação de um usuário.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub full_name: &'a str,
    pub email: &'a str,
    pub role: Role,
    pub superior_user_id: Option<Uuid>,
    pub password_hash: &'a str,
    pub cpf_cnpj: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub company_name: Option<&'a str>,
    pub pix: Option<&'a str>,
    pub pix_key_type: Option<&'a str>,
}

/// Estado final de um usuário depois de uma edição (o service resolve o merge).
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub full_name: String,
    pub role: Role,
    pub superior_user_id: Option<Uuid>,
    pub status: UserStatus,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub pix: Option<String>,
    pub pix_key_type: Option<String>,
}

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Login usa a pool direto, fora de transação.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE lower(email) = lower($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(user)
    }

    /// Projeção mínima de todos os usuários para montar a árvore.
    pub async fn list_nodes<'e, E>(&self, executor: E) -> Result<Vec<UserNode>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let nodes = sqlx::query_as::<_, UserNode>(
            "SELECT id, role, superior_user_id, status FROM users",
        )
        .fetch_all(executor)
        .await?;
        Ok(nodes)
    }

    /// `ids = None` lista todos (Global).
    pub async fn list<'e, E>(&self, executor: E, ids: Option<Vec<Uuid>>) -> Result<Vec<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE ($1::uuid[] IS NULL OR id = ANY($1))
            ORDER BY full_name ASC
            "#,
        )
        .bind(ids)
        .fetch_all(executor)
        .await?;
        Ok(users)
    }

    pub async fn summaries<'e, E>(&self, executor: E, ids: &[Uuid]) -> Result<Vec<UserSummary>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let summaries = sqlx::query_as::<_, UserSummary>(
            "SELECT id, full_name, role FROM users WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(executor)
        .await?;
        Ok(summaries)
    }

    pub async fn create<'e, E>(&self, executor: E, new_user: &NewUser<'_>) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (
                full_name, email, role, superior_user_id, password_hash,
                cpf_cnpj, phone, company_name, pix, pix_key_type
            )
            VALUES ($1, lower($2), $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(new_user.full_name)
        .bind(new_user.email)
        .bind(new_user.role)
        .bind(new_user.superior_user_id)
        .bind(new_user.password_hash)
        .bind(new_user.cpf_cnpj)
        .bind(new_user.phone)
        .bind(new_user.company_name)
        .bind(new_user.pix)
        .bind(new_user.pix_key_type)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, "Já existe um usuário com este e-mail."))
    }

    pub async fn update<'e, E>(&self, executor: E, id: Uuid, changes: &UserChanges) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                full_name = $2,
                role = $3,
                superior_user_id = $4,
                status = $5,
                phone = $6,
                company_name = $7,
                pix = $8,
                pix_key_type = $9,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&changes.full_name)
        .bind(changes.role)
        .bind(changes.superior_user_id)
        .bind(changes.status)
        .bind(&changes.phone)
        .bind(&changes.company_name)
        .bind(&changes.pix)
        .bind(&changes.pix_key_type)
        .fetch_optional(executor)
        .await?;

        user.ok_or_else(|| AppError::not_found("Usuário"))
    }

    pub async fn set_status<'e, E>(&self, executor: E, id: Uuid, status: UserStatus) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("UPDATE users SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Usuário"));
        }
        Ok(())
    }

    /// Exclusão definitiva. Falha com `Conflict` se ainda houver investimentos
    /// ou pagamentos apontando para o usuário.
    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await
            .map_err(|e| {
                if let Some(db_err) = e.as_database_error() {
                    if db_err.is_foreign_key_violation() {
                        return AppError::Conflict(
                            "O usuário possui investimentos ou pagamentos vinculados. Desative-o em vez de excluir."
                                .into(),
                        );
                    }
                }
                AppError::DatabaseError(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Usuário"));
        }
        Ok(())
    }
}
