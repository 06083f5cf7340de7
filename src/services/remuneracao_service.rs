// src/services/remuneracao_service.rs

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{
        investment_repo::SyncSource, CommissionRepository, InvestmentRepository, RemuneracaoRepository,
        UserRepository,
    },
    models::{
        audit::{AuditAction, NewAuditEntry},
        auth::AuthContext,
        commission::{ExportFile, ImportReport, PaymentSummary},
        remuneracao::{Remuneracao, RemuneracaoFilters, SyncReport},
    },
    services::{
        access::{require_global, AccessGate, Action},
        load_tree,
        reconciliation::{
            build_report, export_csv, parse_import, plan_sync, reconcile_import, SyncCandidate, REMUNERACAO_CSV,
        },
        schedule::RemuneracaoLabels,
        AuditService,
    },
};

const RESOURCE: &str = "REMUNERACAO";

#[derive(Clone)]
pub struct RemuneracaoService {
    remuneracao_repo: RemuneracaoRepository,
    commission_repo: CommissionRepository,
    investment_repo: InvestmentRepository,
    user_repo: UserRepository,
    audit: AuditService,
    pool: PgPool,
}

impl RemuneracaoService {
    pub fn new(
        remuneracao_repo: RemuneracaoRepository,
        commission_repo: CommissionRepository,
        investment_repo: InvestmentRepository,
        user_repo: UserRepository,
        audit: AuditService,
        pool: PgPool,
    ) -> Self {
        Self { remuneracao_repo, commission_repo, investment_repo, user_repo, audit, pool }
    }

    // --- SINCRONIZAÇÃO ---

    /// Gera as parcelas que faltam para todos os investimentos ativos.
    /// Idempotente: a segunda execução seguida não cria nada.
    pub async fn run_sync(&self) -> Result<SyncReport, AppError> {
        let mut tx = self.pool.begin().await?;

        let sources = self.investment_repo.list_sync_sources(&mut *tx).await?;
        let existing_keys: HashSet<_> = self
            .commission_repo
            .existing_keys(&mut *tx)
            .await?
            .into_iter()
            .collect();
        let existing_ids: HashSet<String> = self
            .remuneracao_repo
            .existing_payment_ids(&mut *tx)
            .await?
            .into_iter()
            .collect();

        let candidates: Vec<SyncCandidate> = sources.into_iter().map(to_candidate).collect();
        let plan = plan_sync(&candidates, &existing_keys, &existing_ids);

        let mut report = SyncReport {
            investments_processed: candidates.len(),
            ..SyncReport::default()
        };
        if plan.is_empty() {
            return Ok(report);
        }

        report.commissions_created = self.commission_repo.insert_many(&mut *tx, &plan.commissions).await?;
        report.records_created = self.remuneracao_repo.insert_many(&mut *tx, &plan.remuneracoes).await?;
        tx.commit().await?;

        tracing::info!(
            "🔄 Sincronização: {} investimentos, {} remunerações e {} comissões criadas",
            report.investments_processed,
            report.records_created,
            report.commissions_created
        );
        Ok(report)
    }

    pub async fn sync(&self, ctx: &AuthContext) -> Result<SyncReport, AppError> {
        let report = self.run_sync().await?;

        self.audit
            .record(
                NewAuditEntry::new(
                    ctx.user_id,
                    AuditAction::Sync,
                    RESOURCE,
                    format!(
                        "Sincronização: {} remunerações e {} comissões criadas",
                        report.records_created, report.commissions_created
                    ),
                )
                .new_values(serde_json::to_value(&report).unwrap_or_default()),
            )
            .await;

        Ok(report)
    }

    /// Sincronização antes das leituras. Falhas não impedem a listagem.
    async fn silent_sync(&self) {
        if let Err(err) = self.run_sync().await {
            tracing::warn!("⚠️ Sincronização silenciosa falhou: {}", err);
        }
    }

    // --- LEITURA ---

    async fn visible_users(&self, ctx: &AuthContext) -> Result<Option<Vec<uuid::Uuid>>, AppError> {
        let tree = load_tree(&self.user_repo, &self.pool).await?;
        Ok(AccessGate::new(&tree).visible_users(ctx).user_ids())
    }

    pub async fn list(&self, ctx: &AuthContext, filters: &RemuneracaoFilters) -> Result<Vec<Remuneracao>, AppError> {
        self.silent_sync().await;
        let visible = self.visible_users(ctx).await?;
        self.remuneracao_repo.list(visible, filters).await
    }

    pub async fn summary(&self, ctx: &AuthContext, filters: &RemuneracaoFilters) -> Result<PaymentSummary, AppError> {
        self.silent_sync().await;
        let visible = self.visible_users(ctx).await?;
        self.remuneracao_repo.summary(visible, filters).await
    }

    // --- CSV ---

    pub async fn export(&self, ctx: &AuthContext, filters: &RemuneracaoFilters) -> Result<ExportFile, AppError> {
        let rows = self.list(ctx, filters).await?;
        if rows.is_empty() {
            return Err(AppError::rule("Nenhuma remuneração encontrada para exportar."));
        }

        let csv_content = export_csv(&rows)?;
        let total_amount: Decimal = rows.iter().map(|r| r.valor_remuneracao).sum();
        let file = ExportFile {
            csv_content,
            file_name: export_file_name(Utc::now().date_naive()),
            total_records: rows.len(),
            total_amount,
        };

        tracing::info!("📤 {} remunerações exportadas ({})", file.total_records, file.file_name);
        self.audit
            .record(
                NewAuditEntry::new(
                    ctx.user_id,
                    AuditAction::Export,
                    RESOURCE,
                    format!("Exportação de {} remunerações", file.total_records),
                )
                .resource(&file.file_name, file.file_name.clone()),
            )
            .await;

        Ok(file)
    }

    /// Aplica status e data de pagamento vindos de um CSV. Linhas boas são
    /// gravadas; as ruins voltam no relatório.
    pub async fn import(&self, ctx: &AuthContext, content: &str) -> Result<ImportReport, AppError> {
        require_global(ctx, Action::ImportPayments)?;

        let parsed = parse_import(content, &REMUNERACAO_CSV, Utc::now().date_naive())?;
        let ids: Vec<String> = parsed.rows.iter().map(|r| r.update.payment_id.clone()).collect();

        let mut tx = self.pool.begin().await?;
        let current: HashMap<_, _> = self
            .remuneracao_repo
            .statuses_by_payment_id(&mut *tx, &ids)
            .await?
            .into_iter()
            .collect();

        let (updates, rejected) = reconcile_import(&parsed, &current, &REMUNERACAO_CSV);
        let mut errors = parsed.errors.clone();
        errors.extend(rejected);

        let mut success_count = 0;
        for update in &updates {
            if self.remuneracao_repo.apply_status_update(&mut *tx, update).await? {
                success_count += 1;
            }
        }
        tx.commit().await?;

        let report = build_report(parsed.total, success_count, errors);
        tracing::info!(
            "📥 Importação: {} linhas, {} atualizadas, {} com erro",
            report.total_processed,
            report.success_count,
            report.error_count
        );
        self.audit
            .record(
                NewAuditEntry::new(
                    ctx.user_id,
                    AuditAction::Import,
                    RESOURCE,
                    format!(
                        "Importação CSV: {} atualizadas, {} com erro",
                        report.success_count, report.error_count
                    ),
                )
                .new_values(serde_json::to_value(&report).unwrap_or_default()),
            )
            .await;

        Ok(report)
    }
}

fn to_candidate(source: SyncSource) -> SyncCandidate {
    SyncCandidate {
        duration_months: source.duration_months.max(0) as u32,
        labels: RemuneracaoLabels {
            investor_name: source.investor_name,
            investor_pix: source.investor_pix,
            debenture_name: source.debenture_name,
            series_code: source.series_code,
        },
        investment: source.investment,
    }
}

pub(crate) fn export_file_name(today: NaiveDate) -> String {
    format!("remuneracoes_{}.csv", today.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::schedule::tests::investment;
    use rust_decimal_macros::dec;

    #[test]
    fn export_file_is_named_after_the_day() {
        let today = NaiveDate::from_ymd_opt(2025, 7, 3).unwrap();
        assert_eq!(export_file_name(today), "remuneracoes_2025-07-03.csv");
    }

    #[test]
    fn sync_source_keeps_labels_and_clamps_duration() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let source = SyncSource {
            investment: investment(dec!(10000), date),
            duration_months: -1,
            investor_name: "Ana".into(),
            investor_pix: Some("ana@pix".into()),
            debenture_name: "Infra I".into(),
            series_code: "A".into(),
        };

        let candidate = to_candidate(source);
        assert_eq!(candidate.duration_months, 0);
        assert_eq!(candidate.labels.debenture_name, "Infra I");
        assert_eq!(candidate.labels.investor_pix.as_deref(), Some("ana@pix"));
    }
}
