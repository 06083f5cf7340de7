// src/services/commission_report.rs
//
// Relatório de comissões montado a partir das parcelas visíveis ao chamador.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{
    commission::{
        Commission, CommissionReport, CommissionTotals, MonthlyCommissionTotals, PaymentStatus,
        RoleCommissionTotals,
    },
    user::Role,
};

pub const MAX_OVERDUE: usize = 10;

/// Totais gerais, por mês de competência (mais recente primeiro) e por role
/// (Global a Assessor), além das pendentes já vencidas em `today`.
pub fn build_commission_report(rows: &[Commission], today: NaiveDate) -> CommissionReport {
    let mut totals = CommissionTotals::default();
    let mut by_month: BTreeMap<NaiveDate, CommissionTotals> = BTreeMap::new();
    let mut by_role: BTreeMap<Role, (HashSet<Uuid>, CommissionTotals)> = BTreeMap::new();

    for row in rows {
        totals.add(row);
        by_month.entry(row.payment_month).or_default().add(row);

        let (recipients, role_totals) = by_role.entry(row.recipient_role).or_default();
        recipients.insert(row.recipient_user_id);
        role_totals.add(row);
    }

    let mut overdue: Vec<Commission> = rows
        .iter()
        .filter(|row| row.status == PaymentStatus::Pendente && row.due_date < today)
        .cloned()
        .collect();
    overdue.sort_by_key(|row| (row.due_date, row.installment_number));
    overdue.truncate(MAX_OVERDUE);

    CommissionReport {
        totals,
        by_month: by_month
            .into_iter()
            .rev()
            .map(|(month, totals)| MonthlyCommissionTotals { month, totals })
            .collect(),
        by_role: by_role
            .into_iter()
            .map(|(role, (recipients, totals))| RoleCommissionTotals {
                role,
                unique_recipients: recipients.len(),
                totals,
            })
            .collect(),
        overdue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn commission(
        recipient: Uuid,
        role: Role,
        amount: Decimal,
        month: NaiveDate,
        status: PaymentStatus,
    ) -> Commission {
        Commission {
            id: Uuid::new_v4(),
            investment_id: Uuid::new_v4(),
            recipient_user_id: recipient,
            recipient_role: role,
            commission_percentage: dec!(1),
            base_amount: dec!(100000),
            monthly_amount: amount,
            payment_month: month,
            installment_number: 1,
            total_installments: 12,
            due_date: crate::common::dates::last_day_of_month(month),
            status,
            payment_date: (status == PaymentStatus::Pago).then_some(month),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn groups_by_month_and_role() {
        let assessor_a = Uuid::new_v4();
        let assessor_b = Uuid::new_v4();
        let master = Uuid::new_v4();
        let jan = d(2025, 1, 1);
        let feb = d(2025, 2, 1);

        let rows = vec![
            commission(assessor_a, Role::Assessor, dec!(166.67), jan, PaymentStatus::Pago),
            commission(assessor_a, Role::Assessor, dec!(166.67), feb, PaymentStatus::Pendente),
            commission(assessor_b, Role::Assessor, dec!(100), feb, PaymentStatus::Erro),
            commission(master, Role::Master, dec!(41.67), jan, PaymentStatus::Cancelado),
        ];
        let report = build_commission_report(&rows, d(2025, 1, 15));

        assert_eq!(report.totals.total_records, 4);
        assert_eq!(report.totals.total_amount, dec!(475.01));
        assert_eq!(report.totals.paid_amount, dec!(166.67));
        assert_eq!(report.totals.pending_amount, dec!(166.67));
        assert_eq!(report.totals.error_amount, dec!(100));
        assert_eq!(report.totals.canceled_amount, dec!(41.67));
        assert_eq!(report.totals.paid_count, 1);
        assert_eq!(report.totals.pending_count, 1);

        // Mês mais recente primeiro.
        assert_eq!(report.by_month[0].month, feb);
        assert_eq!(report.by_month[0].totals.total_amount, dec!(266.67));
        assert_eq!(report.by_month[1].month, jan);
        assert_eq!(report.by_month[1].totals.total_records, 2);

        // Ordem da hierarquia: Master antes de Assessor.
        assert_eq!(report.by_role.len(), 2);
        assert_eq!(report.by_role[0].role, Role::Master);
        assert_eq!(report.by_role[1].role, Role::Assessor);
        assert_eq!(report.by_role[1].unique_recipients, 2);
        assert_eq!(report.by_role[1].totals.total_amount, dec!(433.34));
    }

    #[test]
    fn overdue_lists_only_pending_past_due_oldest_first() {
        let recipient = Uuid::new_v4();
        let mut rows: Vec<Commission> = (1..=12)
            .map(|m| commission(recipient, Role::Assessor, dec!(10), d(2024, m, 1), PaymentStatus::Pendente))
            .collect();
        rows.push(commission(recipient, Role::Assessor, dec!(10), d(2023, 12, 1), PaymentStatus::Pago));
        rows.reverse();

        let report = build_commission_report(&rows, d(2025, 1, 1));
        assert_eq!(report.overdue.len(), MAX_OVERDUE);
        assert!(report.overdue.iter().all(|c| c.status == PaymentStatus::Pendente));
        assert_eq!(report.overdue[0].due_date, d(2024, 1, 31));
        assert_eq!(report.overdue[9].due_date, d(2024, 10, 31));

        // Parcela que vence hoje ainda não está atrasada.
        let report = build_commission_report(&rows, d(2024, 1, 31));
        assert!(report.overdue.is_empty());
    }

    #[test]
    fn empty_input_gives_zeroed_report() {
        let report = build_commission_report(&[], d(2025, 1, 1));
        assert_eq!(report.totals, CommissionTotals::default());
        assert!(report.by_month.is_empty());
        assert!(report.by_role.is_empty());
        assert!(report.overdue.is_empty());
    }
}
