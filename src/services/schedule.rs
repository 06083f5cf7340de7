// src/services/schedule.rs
//
// Geração dos cronogramas mensais: comissões por role e remunerações do
// investidor. Tudo aqui é puro; a persistência fica com os services.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::{
        dates::{add_months, first_day_of_month, last_day_of_month},
        error::AppError,
        money::{format_brl, percent_of, round_cents},
    },
    models::{
        commission::NewCommission,
        debenture::{InterestType, Series},
        investment::Investment,
        remuneracao::NewRemuneracao,
        user::Role,
    },
};

const MONTHS_PER_YEAR: u32 = 12;

/// Condições da série relevantes para validar e gerar um investimento.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesTerms {
    pub minimum_investment: Decimal,
    pub maximum_investment: Option<Decimal>,
    pub remaining_captation: Option<Decimal>,
    pub max_commission_percentage: Decimal,
    pub duration_months: u32,
    pub interest_rate: Decimal,
    pub interest_type: InterestType,
}

impl From<&Series> for SeriesTerms {
    fn from(series: &Series) -> Self {
        Self {
            minimum_investment: series.minimum_investment,
            maximum_investment: series.maximum_investment,
            remaining_captation: series.remaining_captation(),
            max_commission_percentage: series.max_commission_percentage,
            duration_months: series.duration_months.max(0) as u32,
            interest_rate: series.interest_rate,
            interest_type: series.interest_type,
        }
    }
}

/// Percentuais de comissão por role, como informados no investimento.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CommissionSplit {
    pub master: Decimal,
    pub escritorio: Decimal,
    pub assessor: Decimal,
    pub global: Decimal,
}

impl CommissionSplit {
    pub fn total(&self) -> Decimal {
        self.master + self.escritorio + self.assessor + self.global
    }

    fn entries(&self) -> [(Role, Decimal); 4] {
        [
            (Role::Assessor, self.assessor),
            (Role::Escritorio, self.escritorio),
            (Role::Master, self.master),
            (Role::Global, self.global),
        ]
    }
}

impl From<&Investment> for CommissionSplit {
    fn from(investment: &Investment) -> Self {
        Self {
            master: investment.commission_master,
            escritorio: investment.commission_escritorio,
            assessor: investment.commission_assessor,
            global: investment.commission_global,
        }
    }
}

/// Regras checadas antes de qualquer linha ser gravada.
pub fn validate_terms(
    invested_amount: Decimal,
    split: &CommissionSplit,
    terms: &SeriesTerms,
) -> Result<(), AppError> {
    if invested_amount < terms.minimum_investment {
        return Err(AppError::rule(format!(
            "O valor investido ({}) é menor que o investimento mínimo da série ({}).",
            format_brl(invested_amount),
            format_brl(terms.minimum_investment)
        )));
    }
    if let Some(maximum) = terms.maximum_investment {
        if invested_amount > maximum {
            return Err(AppError::rule(format!(
                "O valor investido ({}) excede o investimento máximo da série ({}).",
                format_brl(invested_amount),
                format_brl(maximum)
            )));
        }
    }
    if let Some(remaining) = terms.remaining_captation {
        if invested_amount > remaining {
            return Err(AppError::rule(format!(
                "A série não possui captação disponível suficiente (restante: {}).",
                format_brl(remaining)
            )));
        }
    }
    if split.total() > terms.max_commission_percentage {
        return Err(AppError::rule(format!(
            "A soma das comissões ({}%) excede o máximo permitido pela série ({}%).",
            split.total().normalize(),
            terms.max_commission_percentage.normalize()
        )));
    }
    if terms.duration_months == 0 {
        return Err(AppError::rule("A série não possui prazo definido."));
    }
    Ok(())
}

/// Divide um valor anual em `months` parcelas mensais em centavos.
///
/// Cada bloco de 12 meses (ou o bloco final parcial, pro-rata) soma
/// exatamente o valor anual correspondente: as parcelas usam o valor mensal
/// arredondado e a última do bloco absorve a diferença.
pub fn monthly_installments(annual_amount: Decimal, months: u32) -> Vec<Decimal> {
    let mut installments = Vec::with_capacity(months as usize);
    let nominal = round_cents(annual_amount / Decimal::from(MONTHS_PER_YEAR));

    let mut remaining = months;
    while remaining > 0 {
        let block = remaining.min(MONTHS_PER_YEAR);
        let block_total =
            round_cents(annual_amount * Decimal::from(block) / Decimal::from(MONTHS_PER_YEAR));
        let leading = nominal * Decimal::from(block - 1);

        if leading <= block_total {
            installments.extend(std::iter::repeat_n(nominal, (block - 1) as usize));
            installments.push(block_total - leading);
        } else {
            // Valores muito pequenos: arredondamento acumulado para nunca
            // gerar parcela negativa.
            let mut previous = Decimal::ZERO;
            for i in 1..=block {
                let cumulative =
                    round_cents(block_total * Decimal::from(i) / Decimal::from(block));
                installments.push(cumulative - previous);
                previous = cumulative;
            }
        }
        remaining -= block;
    }

    installments
}

/// Mês de competência da parcela `n` (1-based) e o respectivo vencimento.
pub fn installment_dates(investment_date: NaiveDate, installment_number: u32) -> (NaiveDate, NaiveDate) {
    let payment_month =
        first_day_of_month(add_months(investment_date, installment_number.saturating_sub(1)));
    (payment_month, last_day_of_month(payment_month))
}

/// Gera as linhas de comissão de todas as roles com percentual > 0.
///
/// Falha se uma role tem percentual mas o investimento não tem quem receba.
pub fn generate_schedule(
    investment: &Investment,
    duration_months: u32,
) -> Result<Vec<NewCommission>, AppError> {
    let split = CommissionSplit::from(investment);
    let mut rows = Vec::new();

    for (role, percentage) in split.entries() {
        if percentage <= Decimal::ZERO {
            continue;
        }
        let recipient = recipient_for(investment, role).ok_or_else(|| {
            AppError::rule(format!(
                "Comissão de {} informada, mas o investidor não possui {} na hierarquia.",
                role, role
            ))
        })?;

        let annual = percent_of(investment.invested_amount, percentage);
        let amounts = monthly_installments(annual, duration_months);

        for (index, monthly_amount) in amounts.into_iter().enumerate() {
            let installment_number = index as u32 + 1;
            let (payment_month, due_date) =
                installment_dates(investment.investment_date, installment_number);
            rows.push(NewCommission {
                investment_id: investment.id,
                recipient_user_id: recipient,
                recipient_role: role,
                commission_percentage: percentage,
                base_amount: investment.invested_amount,
                monthly_amount,
                payment_month,
                installment_number: installment_number as i32,
                total_installments: duration_months as i32,
                due_date,
            });
        }
    }

    Ok(rows)
}

fn recipient_for(investment: &Investment, role: Role) -> Option<Uuid> {
    match role {
        Role::Assessor => Some(investment.assessor_user_id),
        Role::Escritorio => investment.escritorio_user_id,
        Role::Master => investment.master_user_id,
        Role::Global => investment.global_user_id,
        Role::Investidor => None,
    }
}

/// Dados de exibição gravados junto da remuneração.
#[derive(Debug, Clone)]
pub struct RemuneracaoLabels {
    pub investor_name: String,
    pub investor_pix: Option<String>,
    pub debenture_name: String,
    pub series_code: String,
}

pub fn payment_id(investment_id: Uuid, payment_month: NaiveDate) -> String {
    format!(
        "INV-{}-{:04}-{:02}",
        investment_id,
        payment_month.year(),
        payment_month.month()
    )
}

/// Identificador de pagamento de uma parcela de comissão nos arquivos CSV.
pub fn commission_payment_id(commission_id: Uuid) -> String {
    format!("COM-{}", commission_id)
}

pub fn parse_commission_payment_id(payment_id: &str) -> Option<Uuid> {
    payment_id
        .strip_prefix("COM-")
        .and_then(|id| Uuid::parse_str(id).ok())
}

/// Rendimento mensal do investidor: taxa anual da série aplicada sobre o
/// principal, rateada por mês.
pub fn generate_remuneracoes(
    investment: &Investment,
    duration_months: u32,
    labels: &RemuneracaoLabels,
) -> Vec<NewRemuneracao> {
    let annual = percent_of(investment.invested_amount, investment.interest_rate);

    monthly_installments(annual, duration_months)
        .into_iter()
        .enumerate()
        .map(|(index, valor)| {
            let installment_number = index as u32 + 1;
            let (payment_month, due_date) =
                installment_dates(investment.investment_date, installment_number);
            NewRemuneracao {
                id_pagamento: payment_id(investment.id, payment_month),
                investment_id: investment.id,
                user_id: investment.investor_user_id,
                nome_investidor: labels.investor_name.clone(),
                debenture: labels.debenture_name.clone(),
                serie: labels.series_code.clone(),
                valor_remuneracao: valor,
                installment_number: installment_number as i32,
                total_installments: duration_months as i32,
                data_vencimento: due_date,
                pix: labels.investor_pix.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::investment::InvestmentStatus;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    pub(crate) fn investment(amount: Decimal, date: NaiveDate) -> Investment {
        Investment {
            id: Uuid::new_v4(),
            series_id: Uuid::new_v4(),
            investor_user_id: Uuid::new_v4(),
            assessor_user_id: Uuid::new_v4(),
            escritorio_user_id: Some(Uuid::new_v4()),
            master_user_id: Some(Uuid::new_v4()),
            global_user_id: Some(Uuid::new_v4()),
            invested_amount: amount,
            investment_date: date,
            maturity_date: add_months(date, 12),
            interest_rate: dec!(12),
            interest_type: InterestType::Simple,
            status: InvestmentStatus::Ativo,
            commission_master: dec!(0.5),
            commission_escritorio: dec!(1),
            commission_assessor: dec!(2),
            commission_global: Decimal::ZERO,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn terms() -> SeriesTerms {
        SeriesTerms {
            minimum_investment: dec!(1000),
            maximum_investment: None,
            remaining_captation: None,
            max_commission_percentage: dec!(4),
            duration_months: 12,
            interest_rate: dec!(12),
            interest_type: InterestType::Simple,
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn amounts_for(rows: &[NewCommission], role: Role) -> Vec<Decimal> {
        rows.iter()
            .filter(|r| r.recipient_role == role)
            .map(|r| r.monthly_amount)
            .collect()
    }

    #[test]
    fn twelve_month_scenario_produces_36_rows() {
        let inv = investment(dec!(100000), d(2025, 1, 15));
        let rows = generate_schedule(&inv, 12).unwrap();
        assert_eq!(rows.len(), 36);

        let assessor = amounts_for(&rows, Role::Assessor);
        let escritorio = amounts_for(&rows, Role::Escritorio);
        let master = amounts_for(&rows, Role::Master);
        assert_eq!(assessor.len(), 12);
        assert_eq!(escritorio.len(), 12);
        assert_eq!(master.len(), 12);

        assert!(assessor[..11].iter().all(|a| *a == dec!(166.67)));
        assert!(escritorio[..11].iter().all(|a| *a == dec!(83.33)));
        assert!(master[..11].iter().all(|a| *a == dec!(41.67)));

        // A última parcela fecha o total anual.
        assert_eq!(assessor[11], dec!(166.63));
        assert_eq!(escritorio[11], dec!(83.37));
        assert_eq!(master[11], dec!(41.63));
        assert_eq!(assessor.iter().sum::<Decimal>(), dec!(2000));
        assert_eq!(escritorio.iter().sum::<Decimal>(), dec!(1000));
        assert_eq!(master.iter().sum::<Decimal>(), dec!(500));
    }

    #[test]
    fn installments_and_due_dates_follow_the_calendar() {
        let inv = investment(dec!(100000), d(2025, 1, 31));
        let rows = generate_schedule(&inv, 12).unwrap();
        let assessor: Vec<&NewCommission> =
            rows.iter().filter(|r| r.recipient_role == Role::Assessor).collect();

        assert_eq!(assessor[0].installment_number, 1);
        assert_eq!(assessor[0].payment_month, d(2025, 1, 1));
        assert_eq!(assessor[0].due_date, d(2025, 1, 31));
        assert_eq!(assessor[1].payment_month, d(2025, 2, 1));
        assert_eq!(assessor[1].due_date, d(2025, 2, 28));
        assert_eq!(assessor[11].payment_month, d(2025, 12, 1));
        assert!(assessor.iter().all(|r| r.total_installments == 12));
        assert!(assessor.iter().all(|r| r.recipient_user_id == inv.assessor_user_id));
    }

    #[test]
    fn every_twelve_month_block_sums_to_the_annual_amount() {
        for (amount, pct) in [(dec!(100000), dec!(2)), (dec!(12345.67), dec!(1.3)), (dec!(777), dec!(0.7))] {
            let annual = percent_of(amount, pct);
            let installments = monthly_installments(annual, 36);
            assert_eq!(installments.len(), 36);
            for block in installments.chunks(12) {
                assert_eq!(block.iter().sum::<Decimal>(), round_cents(annual));
            }
            assert!(installments.iter().all(|v| !v.is_sign_negative()));
        }
    }

    #[test]
    fn partial_final_block_is_pro_rated() {
        let installments = monthly_installments(dec!(2000), 18);
        assert_eq!(installments.len(), 18);
        assert_eq!(installments[12..].iter().sum::<Decimal>(), dec!(1000));
        assert_eq!(installments.iter().sum::<Decimal>(), dec!(3000));
    }

    #[test]
    fn block_residue_can_pass_the_monthly_pool_by_a_few_cents() {
        // Escritório 1% sobre 100000: pool mensal exato de 83,333...
        let pool = dec!(1000) / dec!(12);
        let installments = monthly_installments(dec!(1000), 12);
        assert_eq!(installments[11], dec!(83.37));
        assert!(installments[11] > pool);

        // Fora a última de cada bloco, cada parcela fica a meio centavo do
        // pool; a última pode se afastar no máximo 6 centavos (11 × 0,005
        // do valor nominal mais 0,005 do total do bloco).
        for (amount, pct) in [(dec!(100000), dec!(1)), (dec!(12345.67), dec!(1.3)), (dec!(98765.43), dec!(3.5))] {
            let annual = percent_of(amount, pct);
            let exact = annual / dec!(12);
            let installments = monthly_installments(annual, 24);
            for (i, value) in installments.iter().enumerate() {
                let drift = (*value - exact).abs();
                if (i + 1) % 12 == 0 {
                    assert!(drift <= dec!(0.06), "parcela {} = {} (exato {})", i + 1, value, exact);
                } else {
                    assert!(drift <= dec!(0.005), "parcela {} = {} (exato {})", i + 1, value, exact);
                }
            }
        }
    }

    #[test]
    fn tiny_amounts_never_go_negative() {
        // Nominal de 0,01 vezes 11 parcelas já passa do total anual.
        let installments = monthly_installments(dec!(0.06), 12);
        assert_eq!(installments.iter().sum::<Decimal>(), dec!(0.06));
        assert!(installments.iter().all(|v| !v.is_sign_negative()));

        let installments = monthly_installments(dec!(0.10), 12);
        assert_eq!(installments.iter().sum::<Decimal>(), dec!(0.10));
        assert!(installments.iter().all(|v| !v.is_sign_negative()));
    }

    #[test]
    fn commission_sum_above_series_cap_is_rejected() {
        let split = CommissionSplit {
            master: dec!(1),
            escritorio: dec!(1.5),
            assessor: dec!(2),
            global: Decimal::ZERO,
        };
        let err = validate_terms(dec!(100000), &split, &terms()).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_FAILED");
        assert!(err.to_string().contains("4.5%"));
    }

    #[test]
    fn below_minimum_investment_is_rejected() {
        let split = CommissionSplit { assessor: dec!(2), ..Default::default() };
        let err = validate_terms(dec!(999.99), &split, &terms()).unwrap_err();
        assert!(err.to_string().contains("mínimo"));
        assert!(validate_terms(dec!(1000), &split, &terms()).is_ok());
    }

    #[test]
    fn captation_limit_is_checked() {
        let split = CommissionSplit::default();
        let limited = SeriesTerms { remaining_captation: Some(dec!(5000)), ..terms() };
        assert!(validate_terms(dec!(5000), &split, &limited).is_ok());
        assert!(validate_terms(dec!(5000.01), &split, &limited).is_err());
    }

    #[test]
    fn percentage_without_recipient_fails_without_rows() {
        let mut inv = investment(dec!(100000), d(2025, 1, 15));
        inv.master_user_id = None;
        assert!(generate_schedule(&inv, 12).is_err());

        inv.commission_master = Decimal::ZERO;
        assert_eq!(generate_schedule(&inv, 12).unwrap().len(), 24);
    }

    #[test]
    fn remuneracoes_use_monthly_payment_ids() {
        let inv = investment(dec!(100000), d(2025, 11, 20));
        let labels = RemuneracaoLabels {
            investor_name: "Maria".into(),
            investor_pix: Some("maria@pix".into()),
            debenture_name: "Infra I".into(),
            series_code: "A".into(),
        };
        let rows = generate_remuneracoes(&inv, 12, &labels);

        assert_eq!(rows.len(), 12);
        assert_eq!(rows[0].id_pagamento, format!("INV-{}-2025-11", inv.id));
        assert_eq!(rows[2].id_pagamento, format!("INV-{}-2026-01", inv.id));
        assert_eq!(rows[0].data_vencimento, d(2025, 11, 30));
        // 100000 * 12% / 12 = 1000,00 por mês
        assert!(rows.iter().all(|r| r.valor_remuneracao == dec!(1000)));
        assert!(rows.iter().all(|r| r.user_id == inv.investor_user_id));
    }
}
