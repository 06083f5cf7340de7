// src/models/commission.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{common::error::AppError, models::user::Role};

/// Situação de pagamento, compartilhada por comissões e remunerações.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Pendente,
    Pago,
    Erro,
    Cancelado,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pendente => "PENDENTE",
            PaymentStatus::Pago => "PAGO",
            PaymentStatus::Erro => "ERRO",
            PaymentStatus::Cancelado => "CANCELADO",
        }
    }

    /// Transições permitidas. Valores nunca mudam, só o status.
    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, next),
            (Pendente, Pago) | (Pendente, Erro) | (Pendente, Cancelado) | (Erro, Pendente) | (Erro, Pago)
        )
    }

    pub fn ensure_transition(self, next: PaymentStatus) -> Result<(), AppError> {
        if self == next || self.can_transition_to(next) {
            Ok(())
        } else {
            Err(AppError::rule(format!(
                "Transição de status inválida: {} -> {}.",
                self.as_str(),
                next.as_str()
            )))
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Commission {
    pub id: Uuid,
    pub investment_id: Uuid,
    pub recipient_user_id: Uuid,
    pub recipient_role: Role,
    pub commission_percentage: Decimal,
    pub base_amount: Decimal,
    #[schema(example = "166.67")]
    pub monthly_amount: Decimal,
    pub payment_month: NaiveDate,
    pub installment_number: i32,
    pub total_installments: i32,
    pub due_date: NaiveDate,
    pub status: PaymentStatus,
    pub payment_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Linha pronta para INSERT (ainda sem id).
#[derive(Debug, Clone, PartialEq)]
pub struct NewCommission {
    pub investment_id: Uuid,
    pub recipient_user_id: Uuid,
    pub recipient_role: Role,
    pub commission_percentage: Decimal,
    pub base_amount: Decimal,
    pub monthly_amount: Decimal,
    pub payment_month: NaiveDate,
    pub installment_number: i32,
    pub total_installments: i32,
    pub due_date: NaiveDate,
}

impl NewCommission {
    /// Chave de unicidade (investment_id, recipient_user_id, installment_number).
    pub fn key(&self) -> (Uuid, Uuid, i32) {
        (self.investment_id, self.recipient_user_id, self.installment_number)
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CommissionFilters {
    pub status: Option<PaymentStatus>,
    pub recipient_user_id: Option<Uuid>,
    pub investment_id: Option<Uuid>,
    pub month_from: Option<NaiveDate>,
    pub month_to: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentStatusPayload {
    pub status: PaymentStatus,
    pub payment_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    pub total_records: i64,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub pending_amount: Decimal,
    pub error_amount: Decimal,
    pub canceled_amount: Decimal,
}

/// Parcela de comissão com os nomes e o PIX usados no arquivo de pagamento.
#[derive(Debug, Clone, FromRow)]
pub struct CommissionExportRow {
    pub id: Uuid,
    pub investor_name: String,
    pub invested_amount: Decimal,
    pub recipient_name: String,
    pub recipient_role: Role,
    pub installment_number: i32,
    pub total_installments: i32,
    pub monthly_amount: Decimal,
    pub pix_key_type: Option<String>,
    pub pix: Option<String>,
    pub due_date: NaiveDate,
    pub status: PaymentStatus,
    pub payment_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommissionTotals {
    pub total_records: usize,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub pending_amount: Decimal,
    pub error_amount: Decimal,
    pub canceled_amount: Decimal,
    pub paid_count: usize,
    pub pending_count: usize,
}

impl CommissionTotals {
    pub fn add(&mut self, commission: &Commission) {
        let amount = commission.monthly_amount;
        self.total_records += 1;
        self.total_amount += amount;
        match commission.status {
            PaymentStatus::Pago => {
                self.paid_amount += amount;
                self.paid_count += 1;
            }
            PaymentStatus::Pendente => {
                self.pending_amount += amount;
                self.pending_count += 1;
            }
            PaymentStatus::Erro => self.error_amount += amount,
            PaymentStatus::Cancelado => self.canceled_amount += amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyCommissionTotals {
    /// Primeiro dia do mês de competência.
    pub month: NaiveDate,
    pub totals: CommissionTotals,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleCommissionTotals {
    pub role: Role,
    pub unique_recipients: usize,
    pub totals: CommissionTotals,
}

/// Relatório de comissões: totais gerais, por mês, por role e as pendentes
/// mais antigas já vencidas.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommissionReport {
    pub totals: CommissionTotals,
    pub by_month: Vec<MonthlyCommissionTotals>,
    pub by_role: Vec<RoleCommissionTotals>,
    pub overdue: Vec<Commission>,
}

/// Atualização permitida via CSV: apenas status e data de pagamento.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentStatusUpdate {
    pub payment_id: String,
    pub status: PaymentStatus,
    pub payment_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub total_processed: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportFile {
    pub csv_content: String,
    pub file_name: String,
    pub total_records: usize,
    pub total_amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_transitions_only_move_forward() {
        assert!(PaymentStatus::Pendente.can_transition_to(PaymentStatus::Pago));
        assert!(PaymentStatus::Erro.can_transition_to(PaymentStatus::Pendente));
        assert!(!PaymentStatus::Pago.can_transition_to(PaymentStatus::Pendente));
        assert!(!PaymentStatus::Cancelado.can_transition_to(PaymentStatus::Pago));
        assert!(PaymentStatus::Pago.ensure_transition(PaymentStatus::Pago).is_ok());
        assert!(PaymentStatus::Pago.ensure_transition(PaymentStatus::Erro).is_err());
    }
}
