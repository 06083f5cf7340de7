// src/models/remuneracao.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::commission::PaymentStatus;

/// Pagamento periódico do próprio investidor (rendimento da série).
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Remuneracao {
    pub id: Uuid,
    #[schema(example = "INV-3f1c...-2025-01")]
    pub id_pagamento: String,
    pub investment_id: Uuid,
    pub user_id: Uuid,
    pub nome_investidor: String,
    pub debenture: String,
    pub serie: String,
    pub valor_remuneracao: Decimal,
    pub installment_number: i32,
    pub total_installments: i32,
    pub status: PaymentStatus,
    pub data_vencimento: NaiveDate,
    pub data_pagamento: Option<NaiveDate>,
    pub pix: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRemuneracao {
    pub id_pagamento: String,
    pub investment_id: Uuid,
    pub user_id: Uuid,
    pub nome_investidor: String,
    pub debenture: String,
    pub serie: String,
    pub valor_remuneracao: Decimal,
    pub installment_number: i32,
    pub total_installments: i32,
    pub data_vencimento: NaiveDate,
    pub pix: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RemuneracaoFilters {
    pub status: Option<PaymentStatus>,
    pub investment_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub due_from: Option<NaiveDate>,
    pub due_to: Option<NaiveDate>,
    /// Busca por nome do investidor (ILIKE).
    pub search: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub investments_processed: usize,
    pub records_created: u64,
    pub commissions_created: u64,
}
