// src/models/debenture.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

// --- Enums ---

/// Situação gravada no banco. "Vencida" é derivada da data de vencimento.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "record_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Active,
    Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DebentureLifecycle {
    Active,
    Expired,
    Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "interest_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InterestType {
    Simple,
    Compound,
}

// --- Structs ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Debenture {
    pub id: Uuid,
    #[schema(example = "Debênture Infra I")]
    pub name: String,
    #[schema(example = "Companhia XYZ S.A.")]
    pub issuer_name: String,
    #[schema(example = "5000000.00")]
    pub total_emission_value: Decimal,
    pub emission_date: NaiveDate,
    pub maturity_date: NaiveDate,
    pub status: RecordStatus,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Debenture {
    pub fn lifecycle(&self, today: NaiveDate) -> DebentureLifecycle {
        match self.status {
            RecordStatus::Deleted => DebentureLifecycle::Deleted,
            RecordStatus::Active if self.maturity_date < today => DebentureLifecycle::Expired,
            RecordStatus::Active => DebentureLifecycle::Active,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DebentureView {
    #[serde(flatten)]
    pub debenture: Debenture,
    pub lifecycle: DebentureLifecycle,
}

impl DebentureView {
    pub fn new(debenture: Debenture, today: NaiveDate) -> Self {
        let lifecycle = debenture.lifecycle(today);
        Self { debenture, lifecycle }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub id: Uuid,
    pub debenture_id: Uuid,
    #[schema(example = "A")]
    pub series_code: String,
    #[schema(example = "Série A - 12 meses")]
    pub name: String,
    #[schema(example = "1000.00")]
    pub minimum_investment: Decimal,
    pub maximum_investment: Option<Decimal>,
    pub max_total_captation: Option<Decimal>,
    #[schema(example = 12)]
    pub duration_months: i32,
    #[schema(example = "14.5")]
    pub interest_rate: Decimal,
    pub interest_type: InterestType,
    #[schema(example = "4.0")]
    pub max_commission_percentage: Decimal,
    pub current_captation: Decimal,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Series {
    /// Quanto ainda cabe na série (None = sem teto de captação).
    pub fn remaining_captation(&self) -> Option<Decimal> {
        self.max_total_captation
            .map(|max| (max - self.current_captation).max(Decimal::ZERO))
    }
}

// --- Validações customizadas ---

pub(crate) fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.message = Some("O valor deve ser maior que zero.".into());
        return Err(err);
    }
    Ok(())
}

pub(crate) fn validate_percentage(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() || *val > Decimal::ONE_HUNDRED {
        let mut err = ValidationError::new("percentage");
        err.message = Some("O percentual deve estar entre 0 e 100.".into());
        return Err(err);
    }
    Ok(())
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDebenturePayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,

    #[validate(length(min = 1, message = "O emissor é obrigatório."))]
    pub issuer_name: String,

    #[validate(custom(function = "validate_positive"))]
    pub total_emission_value: Decimal,

    pub emission_date: NaiveDate,
    pub maturity_date: NaiveDate,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDebenturePayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "O emissor é obrigatório."))]
    pub issuer_name: Option<String>,
    #[validate(custom(function = "validate_positive"))]
    pub total_emission_value: Option<Decimal>,
    pub emission_date: Option<NaiveDate>,
    pub maturity_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSeriesPayload {
    #[validate(length(min = 1, message = "O código da série é obrigatório."))]
    pub series_code: String,

    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,

    #[validate(custom(function = "validate_positive"))]
    pub minimum_investment: Decimal,

    #[validate(custom(function = "validate_positive"))]
    pub maximum_investment: Option<Decimal>,

    #[validate(custom(function = "validate_positive"))]
    pub max_total_captation: Option<Decimal>,

    #[validate(range(min = 1, max = 600, message = "O prazo deve estar entre 1 e 600 meses."))]
    pub duration_months: i32,

    #[validate(custom(function = "validate_percentage"))]
    pub interest_rate: Decimal,

    pub interest_type: InterestType,

    #[validate(custom(function = "validate_percentage"))]
    pub max_commission_percentage: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSeriesPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: Option<String>,
    #[validate(custom(function = "validate_positive"))]
    pub minimum_investment: Option<Decimal>,
    #[validate(custom(function = "validate_positive"))]
    pub maximum_investment: Option<Decimal>,
    #[validate(custom(function = "validate_positive"))]
    pub max_total_captation: Option<Decimal>,
    #[validate(custom(function = "validate_percentage"))]
    pub interest_rate: Option<Decimal>,
    #[validate(custom(function = "validate_percentage"))]
    pub max_commission_percentage: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn debenture(maturity: NaiveDate, status: RecordStatus) -> Debenture {
        Debenture {
            id: Uuid::new_v4(),
            name: "Infra I".into(),
            issuer_name: "XYZ".into(),
            total_emission_value: dec!(1000000),
            emission_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            maturity_date: maturity,
            status,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn expired_is_derived_from_maturity_date() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let past = NaiveDate::from_ymd_opt(2025, 5, 31).unwrap();

        assert_eq!(debenture(past, RecordStatus::Active).lifecycle(today), DebentureLifecycle::Expired);
        assert_eq!(debenture(today, RecordStatus::Active).lifecycle(today), DebentureLifecycle::Active);
        assert_eq!(debenture(past, RecordStatus::Deleted).lifecycle(today), DebentureLifecycle::Deleted);
    }

    #[test]
    fn percentage_validator_bounds() {
        assert!(validate_percentage(&dec!(0)).is_ok());
        assert!(validate_percentage(&dec!(100)).is_ok());
        assert!(validate_percentage(&dec!(-0.1)).is_err());
        assert!(validate_percentage(&dec!(100.01)).is_err());
    }
}
