// src/services/reconciliation.rs
//
// Reconciliação de pagamentos: o plano de sincronização (o que falta gerar)
// e os arquivos CSV de exportação/importação de remunerações e comissões.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use csv::{QuoteStyle, ReaderBuilder, StringRecord, Trim, WriterBuilder};
use uuid::Uuid;

use crate::{
    common::{
        dates::{format_br_date, parse_br_date},
        error::AppError,
        money::format_brl,
    },
    models::{
        commission::{CommissionExportRow, ImportReport, NewCommission, PaymentStatus, PaymentStatusUpdate},
        investment::Investment,
        remuneracao::{NewRemuneracao, Remuneracao},
    },
    services::schedule::{commission_payment_id, generate_remuneracoes, generate_schedule, RemuneracaoLabels},
};

// =============================================================================
//  SINCRONIZAÇÃO
// =============================================================================

/// Investimento ativo com o que é preciso para gerar seus cronogramas.
#[derive(Debug, Clone)]
pub struct SyncCandidate {
    pub investment: Investment,
    pub duration_months: u32,
    pub labels: RemuneracaoLabels,
}

#[derive(Debug, Default)]
pub struct SyncPlan {
    pub commissions: Vec<NewCommission>,
    pub remuneracoes: Vec<NewRemuneracao>,
    /// Investimentos que não puderam ser gerados (ex.: recebedor ausente).
    pub skipped: Vec<(Uuid, String)>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.commissions.is_empty() && self.remuneracoes.is_empty()
    }
}

/// Calcula apenas as linhas que ainda não existem. Rodar de novo depois de
/// gravar o plano devolve um plano vazio.
pub fn plan_sync(
    candidates: &[SyncCandidate],
    existing_commissions: &HashSet<(Uuid, Uuid, i32)>,
    existing_payment_ids: &HashSet<String>,
) -> SyncPlan {
    let mut plan = SyncPlan::default();

    for candidate in candidates {
        let investment = &candidate.investment;

        match generate_schedule(investment, candidate.duration_months) {
            Ok(rows) => plan.commissions.extend(
                rows.into_iter()
                    .filter(|row| !existing_commissions.contains(&row.key())),
            ),
            Err(err) => {
                tracing::warn!("⚠️ Investimento {} ignorado na sincronização: {}", investment.id, err);
                plan.skipped.push((investment.id, err.to_string()));
                continue;
            }
        }

        plan.remuneracoes.extend(
            generate_remuneracoes(investment, candidate.duration_months, &candidate.labels)
                .into_iter()
                .filter(|row| !existing_payment_ids.contains(&row.id_pagamento)),
        );
    }

    plan
}

// =============================================================================
//  CSV
// =============================================================================

/// Formato de um arquivo de pagamentos: colunas obrigatórias e onde ficam
/// id, status e data de pagamento. Só essas três são lidas na importação.
#[derive(Debug)]
pub struct CsvLayout {
    pub headers: &'static [&'static str],
    pub id_column: &'static str,
    pub status_column: &'static str,
    pub payment_date_column: &'static str,
    /// Nome do registro nas mensagens de erro.
    pub record_label: &'static str,
}

pub const REMUNERACAO_CSV: CsvLayout = CsvLayout {
    headers: &[
        "ID Pagamento",
        "Nome do Investidor",
        "Debênture",
        "Série",
        "Valor da Remuneração",
        "Status",
        "Data de Vencimento",
        "Data do Pagamento",
        "PIX",
    ],
    id_column: "ID Pagamento",
    status_column: "Status",
    payment_date_column: "Data do Pagamento",
    record_label: "Remuneração",
};

pub const COMMISSION_CSV: CsvLayout = CsvLayout {
    headers: &[
        "ID Pagamento",
        "Nome do Investidor",
        "Valor do Investimento",
        "Destinatário",
        "Parcela",
        "Valor da Comissão Mensal",
        "Tipo de Chave PIX",
        "PIX",
        "Data de Vencimento",
        "Status",
        "Data do Pagamento",
    ],
    id_column: "ID Pagamento",
    status_column: "Status",
    payment_date_column: "Data do Pagamento",
    record_label: "Comissão",
};

pub const MAX_REPORTED_ERRORS: usize = 10;

/// Cabeçalho sem aspas, campos sempre entre aspas.
fn write_csv<I, R>(layout: &CsvLayout, records: I) -> Result<String, AppError>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = String>,
{
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for record in records {
        writer.write_record(record)?;
    }

    let body = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Falha ao finalizar CSV: {}", e))?;
    let body = String::from_utf8(body).map_err(|e| anyhow::anyhow!("CSV não é UTF-8: {}", e))?;

    Ok(format!("{}\n{}", layout.headers.join(","), body))
}

pub fn export_csv(rows: &[Remuneracao]) -> Result<String, AppError> {
    write_csv(
        &REMUNERACAO_CSV,
        rows.iter().map(|row| {
            [
                row.id_pagamento.clone(),
                row.nome_investidor.clone(),
                row.debenture.clone(),
                row.serie.clone(),
                format_brl(row.valor_remuneracao),
                row.status.as_str().to_string(),
                format_br_date(row.data_vencimento),
                row.data_pagamento.map(format_br_date).unwrap_or_default(),
                row.pix.clone().unwrap_or_default(),
            ]
        }),
    )
}

pub fn export_commission_csv(rows: &[CommissionExportRow]) -> Result<String, AppError> {
    write_csv(
        &COMMISSION_CSV,
        rows.iter().map(|row| {
            [
                commission_payment_id(row.id),
                row.investor_name.clone(),
                format_brl(row.invested_amount),
                format!("{} ({})", row.recipient_name, row.recipient_role.as_str()),
                format!("{}/{}", row.installment_number, row.total_installments),
                format_brl(row.monthly_amount),
                row.pix_key_type.clone().unwrap_or_default(),
                row.pix.clone().unwrap_or_default(),
                format_br_date(row.due_date),
                row.status.as_str().to_string(),
                row.payment_date.map(format_br_date).unwrap_or_default(),
            ]
        }),
    )
}

/// Linha válida do arquivo importado.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRow {
    pub line: usize,
    pub update: PaymentStatusUpdate,
}

#[derive(Debug, Default)]
pub struct ParsedImport {
    pub total: usize,
    pub rows: Vec<ImportRow>,
    pub errors: Vec<String>,
}

/// Lê o CSV de importação. Erros de estrutura (cabeçalho) abortam; erros de
/// linha são coletados e o restante segue.
pub fn parse_import(content: &str, layout: &CsvLayout, today: NaiveDate) -> Result<ParsedImport, AppError> {
    let content = content.trim_start_matches('\u{feff}');
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let columns = column_indexes(&headers, layout)?;

    let mut parsed = ParsedImport::default();
    for (index, result) in reader.records().enumerate() {
        let fallback_line = index + 2;
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                let line = err.position().map(|p| p.line() as usize).unwrap_or(fallback_line);
                parsed.total += 1;
                parsed.errors.push(format!("Linha {}: {}", line, err));
                continue;
            }
        };
        if record.iter().all(str::is_empty) {
            continue;
        }

        parsed.total += 1;
        let line = record.position().map(|p| p.line() as usize).unwrap_or(fallback_line);
        match parse_row(&record, layout, &columns, line, today) {
            Ok(update) => parsed.rows.push(ImportRow { line, update }),
            Err(message) => parsed.errors.push(message),
        }
    }

    if parsed.total == 0 {
        return Err(AppError::InvalidCsv(
            "o arquivo deve conter um cabeçalho e ao menos uma linha de dados.".into(),
        ));
    }
    Ok(parsed)
}

struct Columns {
    id: usize,
    status: usize,
    payment_date: usize,
}

fn column_indexes(headers: &StringRecord, layout: &CsvLayout) -> Result<Columns, AppError> {
    let position = |name: &str| headers.iter().position(|h| h.trim_matches('"') == name);

    let missing: Vec<&str> = layout
        .headers
        .iter()
        .copied()
        .filter(|name| position(name).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(AppError::InvalidCsv(format!(
            "colunas obrigatórias ausentes: {}.",
            missing.join(", ")
        )));
    }

    let required = |name: &str| {
        position(name).ok_or_else(|| AppError::InvalidCsv(format!("coluna obrigatória ausente: {}.", name)))
    };
    Ok(Columns {
        id: required(layout.id_column)?,
        status: required(layout.status_column)?,
        payment_date: required(layout.payment_date_column)?,
    })
}

fn parse_row(
    record: &StringRecord,
    layout: &CsvLayout,
    columns: &Columns,
    line: usize,
    today: NaiveDate,
) -> Result<PaymentStatusUpdate, String> {
    let expected = layout.headers.len();
    if record.len() < expected {
        return Err(format!(
            "Linha {}: Formato inválido. Esperado {} colunas, encontrado {}.",
            line,
            expected,
            record.len()
        ));
    }

    let payment_id = record.get(columns.id).unwrap_or_default();
    if payment_id.is_empty() {
        return Err(format!("Linha {}: ID de pagamento não pode estar vazio.", line));
    }

    let status = match record.get(columns.status).unwrap_or_default().to_uppercase().as_str() {
        "PAGO" => PaymentStatus::Pago,
        "PENDENTE" => PaymentStatus::Pendente,
        "ERRO" => PaymentStatus::Erro,
        _ => return Err(format!("Linha {}: Status deve ser PAGO, PENDENTE ou ERRO.", line)),
    };

    let payment_date = match (status, record.get(columns.payment_date).unwrap_or_default()) {
        (PaymentStatus::Pago, "") => Some(today),
        (PaymentStatus::Pago, text) => Some(parse_br_date(text).ok_or_else(|| {
            format!("Linha {}: Data do pagamento inválida '{}' (use dd/mm/aaaa).", line, text)
        })?),
        _ => None,
    };

    Ok(PaymentStatusUpdate {
        payment_id: payment_id.to_string(),
        status,
        payment_date,
    })
}

/// Cruza as linhas lidas com o status atual de cada pagamento. Id
/// desconhecido ou transição inválida vira erro apenas daquela linha.
/// Um id repetido no arquivo é validado contra o status que a linha
/// anterior já deixou.
pub fn reconcile_import(
    parsed: &ParsedImport,
    current: &HashMap<String, PaymentStatus>,
    layout: &CsvLayout,
) -> (Vec<PaymentStatusUpdate>, Vec<String>) {
    let mut statuses = current.clone();
    let mut updates = Vec::new();
    let mut errors = Vec::new();

    for row in &parsed.rows {
        let update = &row.update;
        let Some(status) = statuses.get_mut(&update.payment_id) else {
            errors.push(format!(
                "Linha {}: {} com ID {} não encontrada.",
                row.line, layout.record_label, update.payment_id
            ));
            continue;
        };
        if let Err(err) = status.ensure_transition(update.status) {
            errors.push(format!("Linha {}: {}", row.line, err));
            continue;
        }
        *status = update.status;
        updates.push(update.clone());
    }

    (updates, errors)
}

pub fn build_report(total: usize, success_count: usize, mut errors: Vec<String>) -> ImportReport {
    let error_count = errors.len();
    errors.truncate(MAX_REPORTED_ERRORS);
    ImportReport {
        total_processed: total,
        success_count,
        error_count,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::schedule::tests::investment;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn candidate() -> SyncCandidate {
        SyncCandidate {
            investment: investment(dec!(100000), d(2025, 3, 10)),
            duration_months: 12,
            labels: RemuneracaoLabels {
                investor_name: "João Silva".into(),
                investor_pix: None,
                debenture_name: "Infra I".into(),
                series_code: "A".into(),
            },
        }
    }

    #[test]
    fn second_sync_plan_is_empty() {
        let candidates = vec![candidate()];
        let mut commissions = HashSet::new();
        let mut payments = HashSet::new();

        let first = plan_sync(&candidates, &commissions, &payments);
        assert_eq!(first.commissions.len(), 36);
        assert_eq!(first.remuneracoes.len(), 12);

        // Simula a gravação do primeiro plano.
        commissions.extend(first.commissions.iter().map(NewCommission::key));
        payments.extend(first.remuneracoes.iter().map(|r| r.id_pagamento.clone()));

        let second = plan_sync(&candidates, &commissions, &payments);
        assert!(second.is_empty());
    }

    #[test]
    fn sync_fills_only_missing_rows() {
        let candidates = vec![candidate()];
        let full = plan_sync(&candidates, &HashSet::new(), &HashSet::new());

        let existing: HashSet<_> = full.commissions.iter().take(10).map(NewCommission::key).collect();
        let partial = plan_sync(&candidates, &existing, &HashSet::new());
        assert_eq!(partial.commissions.len(), 26);
    }

    #[test]
    fn sync_skips_investments_that_cannot_be_generated() {
        let mut broken = candidate();
        broken.investment.escritorio_user_id = None;
        let plan = plan_sync(&[broken, candidate()], &HashSet::new(), &HashSet::new());

        assert_eq!(plan.skipped.len(), 1);
        assert_eq!(plan.commissions.len(), 36);
        assert_eq!(plan.remuneracoes.len(), 12);
    }

    fn remuneracao(id: &str, status: PaymentStatus) -> Remuneracao {
        Remuneracao {
            id: Uuid::new_v4(),
            id_pagamento: id.into(),
            investment_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            nome_investidor: "João \"JJ\" Silva".into(),
            debenture: "Infra I".into(),
            serie: "A".into(),
            valor_remuneracao: dec!(1234.5),
            installment_number: 1,
            total_installments: 12,
            status,
            data_vencimento: d(2025, 3, 31),
            data_pagamento: None,
            pix: Some("joao@pix".into()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn export_quotes_every_field_and_formats_values() {
        let csv = export_csv(&[remuneracao("INV-1-2025-03", PaymentStatus::Pendente)]).unwrap();
        let mut lines = csv.lines();

        assert_eq!(lines.next().unwrap(), REMUNERACAO_CSV.headers.join(","));
        assert_eq!(
            lines.next().unwrap(),
            r#""INV-1-2025-03","João ""JJ"" Silva","Infra I","A","R$ 1.234,50","PENDENTE","31/03/2025","","joao@pix""#
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn exported_file_can_be_imported_back() {
        let csv = export_csv(&[remuneracao("INV-1-2025-03", PaymentStatus::Pendente)]).unwrap();
        let parsed = parse_import(&csv, &REMUNERACAO_CSV, d(2025, 4, 2)).unwrap();
        assert_eq!(parsed.total, 1);
        assert_eq!(parsed.rows[0].update.status, PaymentStatus::Pendente);
        assert_eq!(parsed.rows[0].update.payment_date, None);
    }

    const HEADER: &str = "ID Pagamento,Nome do Investidor,Debênture,Série,Valor da Remuneração,Status,Data de Vencimento,Data do Pagamento,PIX";

    #[test]
    fn unknown_id_is_a_row_error_and_pago_updates_only_its_row() {
        let content = format!(
            "{HEADER}\n\
             \"INV-A\",\"Ana\",\"Infra\",\"A\",\"R$ 999.999,00\",\"PAGO\",\"31/03/2025\",\"05/04/2025\",\"\"\n\
             \"INV-X\",\"Zé\",\"Infra\",\"A\",\"R$ 10,00\",\"PAGO\",\"31/03/2025\",\"\",\"\"\n\
             \"INV-B\",\"Bia\",\"Infra\",\"A\",\"R$ 10,00\",\"pendente\",\"31/03/2025\",\"01/04/2025\",\"\"\n"
        );
        let parsed = parse_import(&content, &REMUNERACAO_CSV, d(2025, 4, 10)).unwrap();
        assert_eq!(parsed.total, 3);
        assert!(parsed.errors.is_empty());

        let current = HashMap::from([
            ("INV-A".to_string(), PaymentStatus::Pendente),
            ("INV-B".to_string(), PaymentStatus::Erro),
        ]);
        let (updates, errors) = reconcile_import(&parsed, &current, &REMUNERACAO_CSV);

        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Linha 3:"));
        assert!(errors[0].contains("INV-X"));

        assert_eq!(updates.len(), 2);
        // Só status e data; o valor "R$ 999.999,00" do arquivo é ignorado.
        assert_eq!(
            updates[0],
            PaymentStatusUpdate {
                payment_id: "INV-A".into(),
                status: PaymentStatus::Pago,
                payment_date: Some(d(2025, 4, 5)),
            }
        );
        // Status diferente de PAGO limpa a data.
        assert_eq!(updates[1].status, PaymentStatus::Pendente);
        assert_eq!(updates[1].payment_date, None);

        let report = build_report(parsed.total, updates.len(), errors);
        assert_eq!(report.success_count, 2);
        assert_eq!(report.error_count, 1);
    }

    #[test]
    fn pago_without_date_defaults_to_today() {
        let content = format!("{HEADER}\nINV-A,Ana,Infra,A,\"R$ 10,00\",PAGO,31/03/2025,,\n");
        let parsed = parse_import(&content, &REMUNERACAO_CSV, d(2025, 4, 10)).unwrap();
        assert_eq!(parsed.rows[0].update.payment_date, Some(d(2025, 4, 10)));
    }

    #[test]
    fn malformed_rows_do_not_abort_the_batch() {
        let content = format!(
            "{HEADER}\n\
             INV-A,Ana\n\
             INV-B,Bia,Infra,A,10,CANCELADO,31/03/2025,,\n\
             INV-C,Caio,Infra,A,10,PAGO,31/03/2025,2025-04-01,\n\
             INV-D,Duda,Infra,A,10,ERRO,31/03/2025,,\n"
        );
        let parsed = parse_import(&content, &REMUNERACAO_CSV, d(2025, 4, 10)).unwrap();
        assert_eq!(parsed.total, 4);
        assert_eq!(parsed.errors.len(), 3);
        assert!(parsed.errors[0].contains("Esperado 9 colunas"));
        assert!(parsed.errors[1].contains("PAGO, PENDENTE ou ERRO"));
        assert!(parsed.errors[2].contains("dd/mm/aaaa"));
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].update.payment_id, "INV-D");
    }

    #[test]
    fn missing_columns_reject_the_file() {
        let err = parse_import("ID Pagamento,Status\nINV-A,PAGO\n", &REMUNERACAO_CSV, d(2025, 1, 1)).unwrap_err();
        assert_eq!(err.code(), "IMPORT_ERROR");
        assert!(parse_import(HEADER, &REMUNERACAO_CSV, d(2025, 1, 1)).is_err());
    }

    #[test]
    fn paid_rows_cannot_go_back_to_pending() {
        let content = format!("{HEADER}\nINV-A,Ana,Infra,A,10,PENDENTE,31/03/2025,,\n");
        let parsed = parse_import(&content, &REMUNERACAO_CSV, d(2025, 4, 10)).unwrap();
        let current = HashMap::from([("INV-A".to_string(), PaymentStatus::Pago)]);
        let (updates, errors) = reconcile_import(&parsed, &current, &REMUNERACAO_CSV);
        assert!(updates.is_empty());
        assert!(errors[0].contains("PAGO -> PENDENTE"));
    }

    #[test]
    fn repeated_id_is_checked_against_the_row_before_it() {
        let content = format!(
            "{HEADER}\n\
             INV-A,Ana,Infra,A,10,PAGO,31/03/2025,05/04/2025,\n\
             INV-A,Ana,Infra,A,10,PENDENTE,31/03/2025,,\n\
             INV-B,Bia,Infra,A,10,ERRO,31/03/2025,,\n\
             INV-B,Bia,Infra,A,10,PAGO,31/03/2025,06/04/2025,\n"
        );
        let parsed = parse_import(&content, &REMUNERACAO_CSV, d(2025, 4, 10)).unwrap();
        let current = HashMap::from([
            ("INV-A".to_string(), PaymentStatus::Pendente),
            ("INV-B".to_string(), PaymentStatus::Pendente),
        ]);
        let (updates, errors) = reconcile_import(&parsed, &current, &REMUNERACAO_CSV);

        // INV-A já ficou PAGO na linha 2; a linha 3 não pode voltar para PENDENTE.
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Linha 3:"));
        assert!(errors[0].contains("PAGO -> PENDENTE"));

        let applied: Vec<(&str, PaymentStatus)> =
            updates.iter().map(|u| (u.payment_id.as_str(), u.status)).collect();
        assert_eq!(
            applied,
            vec![
                ("INV-A", PaymentStatus::Pago),
                ("INV-B", PaymentStatus::Erro),
                ("INV-B", PaymentStatus::Pago),
            ]
        );
        assert_eq!(current["INV-A"], PaymentStatus::Pendente);
    }

    fn commission_row(id: Uuid) -> CommissionExportRow {
        CommissionExportRow {
            id,
            investor_name: "Ana Souza".into(),
            invested_amount: dec!(100000),
            recipient_name: "Carlos".into(),
            recipient_role: crate::models::user::Role::Assessor,
            installment_number: 3,
            total_installments: 12,
            monthly_amount: dec!(166.67),
            pix_key_type: Some("email".into()),
            pix: Some("carlos@pix".into()),
            due_date: d(2025, 3, 31),
            status: PaymentStatus::Pendente,
            payment_date: None,
        }
    }

    #[test]
    fn commission_export_lists_recipient_and_installment() {
        let csv = export_commission_csv(&[commission_row(Uuid::nil())]).unwrap();
        let mut lines = csv.lines();

        assert_eq!(lines.next().unwrap(), COMMISSION_CSV.headers.join(","));
        assert_eq!(
            lines.next().unwrap(),
            r#""COM-00000000-0000-0000-0000-000000000000","Ana Souza","R$ 100.000,00","Carlos (Assessor)","3/12","R$ 166,67","email","carlos@pix","31/03/2025","PENDENTE","""#
        );
    }

    #[test]
    fn commission_file_marks_only_known_installments_as_paid() {
        let known = Uuid::new_v4();
        let csv = export_commission_csv(&[commission_row(known), commission_row(Uuid::new_v4())]).unwrap();
        let edited = csv.replace(r#""PENDENTE","""#, r#""PAGO","05/04/2025""#);

        let parsed = parse_import(&edited, &COMMISSION_CSV, d(2025, 4, 10)).unwrap();
        assert_eq!(parsed.total, 2);
        assert!(parsed.errors.is_empty());

        let current = HashMap::from([(commission_payment_id(known), PaymentStatus::Pendente)]);
        let (updates, errors) = reconcile_import(&parsed, &current, &COMMISSION_CSV);

        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].payment_id, commission_payment_id(known));
        assert_eq!(updates[0].status, PaymentStatus::Pago);
        assert_eq!(updates[0].payment_date, Some(d(2025, 4, 5)));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Linha 3: Comissão com ID COM-"));
    }

    #[test]
    fn remuneracao_file_is_not_a_commission_file() {
        let err = parse_import(&format!("{HEADER}\nINV-A,Ana,Infra,A,10,PAGO,31/03/2025,,\n"), &COMMISSION_CSV, d(2025, 1, 1))
            .unwrap_err();
        assert_eq!(err.code(), "IMPORT_ERROR");
    }

    #[test]
    fn report_keeps_only_the_first_errors() {
        let errors: Vec<String> = (0..25).map(|i| format!("Linha {}: erro", i + 2)).collect();
        let report = build_report(30, 5, errors);
        assert_eq!(report.error_count, 25);
        assert_eq!(report.errors.len(), MAX_REPORTED_ERRORS);
    }
}
