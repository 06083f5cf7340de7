// src/models/investment.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::debenture::{validate_percentage, validate_positive, InterestType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "investment_status")]
pub enum InvestmentStatus {
    #[serde(rename = "ativo")]
    #[sqlx(rename = "ativo")]
    Ativo,
    #[serde(rename = "liquidado")]
    #[sqlx(rename = "liquidado")]
    Liquidado,
    #[serde(rename = "pending")]
    #[sqlx(rename = "pending")]
    Pending,
    #[serde(rename = "canceled")]
    #[sqlx(rename = "canceled")]
    Canceled,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Investment {
    pub id: Uuid,
    pub series_id: Uuid,
    pub investor_user_id: Uuid,
    pub assessor_user_id: Uuid,
    // Denormalizados da cadeia hierárquica no momento da criação
    pub escritorio_user_id: Option<Uuid>,
    pub master_user_id: Option<Uuid>,
    pub global_user_id: Option<Uuid>,

    #[schema(example = "100000.00")]
    pub invested_amount: Decimal,
    pub investment_date: NaiveDate,
    pub maturity_date: NaiveDate,
    pub interest_rate: Decimal,
    pub interest_type: InterestType,
    pub status: InvestmentStatus,

    pub commission_master: Decimal,
    pub commission_escritorio: Decimal,
    pub commission_assessor: Decimal,
    pub commission_global: Decimal,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Investment {
    pub fn total_commission_percentage(&self) -> Decimal {
        self.commission_master
            + self.commission_escritorio
            + self.commission_assessor
            + self.commission_global
    }
}

/// Linha da listagem com os nomes já resolvidos.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentListItem {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub investment: Investment,
    pub investor_name: String,
    pub assessor_name: String,
    pub series_code: String,
    pub debenture_name: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentPage {
    pub investments: Vec<InvestmentListItem>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };
        Self { page, limit, total, total_pages }
    }
}

/// Resultado da criação: o investimento e quantas parcelas foram geradas
/// na mesma transação.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedInvestment {
    pub investment: Investment,
    pub commissions_created: u64,
    pub remuneracoes_created: u64,
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvestmentPayload {
    pub series_id: Uuid,
    pub investor_user_id: Uuid,

    #[validate(custom(function = "validate_positive"))]
    pub invested_amount: Decimal,

    /// Padrão: hoje.
    pub investment_date: Option<NaiveDate>,

    /// Padrão: o tipo de juros da série.
    pub interest_type: Option<InterestType>,

    #[serde(default)]
    #[validate(custom(function = "validate_percentage"))]
    pub commission_master: Decimal,
    #[serde(default)]
    #[validate(custom(function = "validate_percentage"))]
    pub commission_escritorio: Decimal,
    #[serde(default)]
    #[validate(custom(function = "validate_percentage"))]
    pub commission_assessor: Decimal,
    #[serde(default)]
    #[validate(custom(function = "validate_percentage"))]
    pub commission_global: Decimal,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvestmentStatusPayload {
    pub status: InvestmentStatus,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct InvestmentFilters {
    pub status: Option<InvestmentStatus>,
    pub series_id: Option<Uuid>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_rounds_pages_up() {
        let p = Pagination::new(1, 50, 101);
        assert_eq!(p.total_pages, 3);
        assert_eq!(Pagination::new(1, 50, 0).total_pages, 0);
    }

    #[test]
    fn status_uses_portuguese_wire_values() {
        assert_eq!(serde_json::to_string(&InvestmentStatus::Ativo).unwrap(), "\"ativo\"");
        assert_eq!(
            serde_json::from_str::<InvestmentStatus>("\"canceled\"").unwrap(),
            InvestmentStatus::Canceled
        );
    }
}
