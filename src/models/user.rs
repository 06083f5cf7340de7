// src/models/user.rs

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;

// --- Enums (Mapeando o Postgres) ---

/// Os cinco níveis fixos da hierarquia. A ordem das variantes é a ordem
/// hierárquica (Global no topo).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "role_name")]
pub enum Role {
    Global,
    Master,
    #[serde(rename = "Escritório", alias = "Escritorio")]
    #[sqlx(rename = "Escritório")]
    Escritorio,
    Assessor,
    Investidor,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Global,
        Role::Master,
        Role::Escritorio,
        Role::Assessor,
        Role::Investidor,
    ];

    /// 1 = Global ... 5 = Investidor.
    pub fn level(self) -> u8 {
        match self {
            Role::Global => 1,
            Role::Master => 2,
            Role::Escritorio => 3,
            Role::Assessor => 4,
            Role::Investidor => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Global => "Global",
            Role::Master => "Master",
            Role::Escritorio => "Escritório",
            Role::Assessor => "Assessor",
            Role::Investidor => "Investidor",
        }
    }

    /// `true` quando `self` está estritamente acima de `other`.
    pub fn outranks(self, other: Role) -> bool {
        self.level() < other.level()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "Global" => Ok(Role::Global),
            "Master" => Ok(Role::Master),
            "Escritório" | "Escritorio" => Ok(Role::Escritorio),
            "Assessor" => Ok(Role::Assessor),
            "Investidor" => Ok(Role::Investidor),
            other => Err(AppError::rule(format!("Role desconhecida: '{}'.", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
}

// --- Structs ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub superior_user_id: Option<Uuid>,
    pub status: UserStatus,
    pub pix: Option<String>,
    pub pix_key_type: Option<String>,
    pub company_name: Option<String>,
    pub cpf_cnpj: Option<String>,
    pub phone: Option<String>,

    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub password_hash: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}

/// Projeção mínima usada para montar a árvore hierárquica em memória.
#[derive(Debug, Clone, FromRow)]
pub struct UserNode {
    pub id: Uuid,
    pub role: Role,
    pub superior_user_id: Option<Uuid>,
    pub status: UserStatus,
}

/// Perfil do usuário logado com a cadeia de superiores resolvida.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub superiors: Vec<UserSummary>,
    pub direct_subordinates: usize,
    pub total_subordinates: usize,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub full_name: String,
    pub role: Role,
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,

    #[validate(length(min = 1, message = "O nome completo é obrigatório."))]
    pub full_name: String,

    pub role: Role,

    pub superior_user_id: Option<Uuid>,

    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: Option<String>,

    pub cpf_cnpj: Option<String>,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub pix: Option<String>,
    pub pix_key_type: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserPayload {
    #[validate(length(min = 1, message = "O nome completo é obrigatório."))]
    pub full_name: Option<String>,

    pub role: Option<Role>,

    /// `Some(None)` limpa o superior; ausente mantém o atual.
    #[serde(default, with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub superior_user_id: Option<Option<Uuid>>,

    pub status: Option<UserStatus>,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub pix: Option<String>,
    pub pix_key_type: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUserQuery {
    /// Exclusão definitiva (só quando o usuário não tem vínculos).
    #[serde(default)]
    pub hard: bool,
}

/// Resposta da listagem de candidatos a superior (fluxo de troca de role).
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuperiorCandidates {
    pub role: Role,
    pub candidates: Vec<UserSummary>,
    /// Preenchido quando existe exatamente um candidato.
    pub auto_selected: Option<Uuid>,
}

// Distingue "campo ausente" de "campo null" no JSON de atualização.
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parsing_rejects_unknown_values() {
        assert_eq!("Escritorio".parse::<Role>().unwrap(), Role::Escritorio);
        assert_eq!("Escritório".parse::<Role>().unwrap(), Role::Escritorio);
        assert!("Admin".parse::<Role>().is_err());
        assert!(serde_json::from_str::<Role>("\"Supervisor\"").is_err());
    }

    #[test]
    fn role_levels_follow_the_hierarchy() {
        assert!(Role::Global.outranks(Role::Master));
        assert!(Role::Assessor.outranks(Role::Investidor));
        assert!(!Role::Investidor.outranks(Role::Investidor));
        assert_eq!(serde_json::to_string(&Role::Escritorio).unwrap(), "\"Escritório\"");
    }

    #[test]
    fn update_payload_distinguishes_missing_and_null_superior() {
        let missing: UpdateUserPayload = serde_json::from_str(r#"{"fullName":"Ana"}"#).unwrap();
        assert!(missing.superior_user_id.is_none());

        let cleared: UpdateUserPayload =
            serde_json::from_str(r#"{"superiorUserId":null}"#).unwrap();
        assert_eq!(cleared.superior_user_id, Some(None));
    }
}
