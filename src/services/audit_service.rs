// src/services/audit_service.rs

use chrono::{Duration, Utc};
use csv::WriterBuilder;
use sqlx::PgPool;

use crate::{
    common::{db_utils::page_window, error::AppError},
    db::AuditRepository,
    models::{
        audit::{AuditAction, AuditFilters, AuditLog, AuditStats, NewAuditEntry},
        auth::AuthContext,
    },
};

pub const AUDIT_CSV_HEADERS: [&str; 7] =
    ["Data", "Usuario", "Role", "Acao", "Recurso", "Nome_Recurso", "Descricao"];

const DEFAULT_STATS_DAYS: i32 = 30;
const MAX_EXPORT_ROWS: i64 = 10_000;

#[derive(Clone)]
pub struct AuditService {
    audit_repo: AuditRepository,
    pool: PgPool,
}

impl AuditService {
    pub fn new(audit_repo: AuditRepository, pool: PgPool) -> Self {
        Self { audit_repo, pool }
    }

    /// Registra uma ação. Falha de auditoria nunca derruba a operação principal.
    pub async fn record(&self, entry: NewAuditEntry) {
        if let Err(err) = self.audit_repo.insert(&self.pool, &entry).await {
            tracing::warn!(
                "⚠️ Falha ao gravar auditoria {} {}: {}",
                entry.action_type.as_str(),
                entry.resource_type,
                err
            );
        }
    }

    // Global vê a trilha de todos; os demais, apenas as próprias ações.
    fn scope(ctx: &AuthContext) -> Option<uuid::Uuid> {
        (!ctx.is_global()).then_some(ctx.user_id)
    }

    pub async fn list(&self, ctx: &AuthContext, filters: &AuditFilters) -> Result<Vec<AuditLog>, AppError> {
        let (limit, _) = page_window(None, filters.limit);
        let offset = filters.offset.unwrap_or(0).max(0);
        self.audit_repo.list(Self::scope(ctx), filters, limit, offset).await
    }

    pub async fn stats(&self, ctx: &AuthContext, days: Option<i32>) -> Result<AuditStats, AppError> {
        let days = days.unwrap_or(DEFAULT_STATS_DAYS).clamp(1, 365);
        let since = Utc::now() - Duration::days(i64::from(days));
        self.audit_repo.stats(Self::scope(ctx), since).await
    }

    pub async fn export(&self, ctx: &AuthContext, filters: &AuditFilters) -> Result<String, AppError> {
        let logs = self
            .audit_repo
            .list(Self::scope(ctx), filters, MAX_EXPORT_ROWS, 0)
            .await?;

        tracing::info!("📤 Exportando {} registros de auditoria", logs.len());
        let csv = audit_csv(&logs)?;
        self.record(NewAuditEntry::new(
            ctx.user_id,
            AuditAction::Export,
            "AUDIT_LOG",
            format!("Exportação de {} registros de auditoria", logs.len()),
        ))
        .await;
        Ok(csv)
    }
}

pub fn audit_csv(logs: &[AuditLog]) -> Result<String, AppError> {
    let mut writer = WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(AUDIT_CSV_HEADERS)?;

    for log in logs {
        writer.write_record([
            log.created_at.format("%d/%m/%Y %H:%M:%S").to_string(),
            log.user_email.clone().unwrap_or_default(),
            log.user_role.map(|r| r.to_string()).unwrap_or_default(),
            log.action_type.as_str().to_string(),
            log.resource_type.clone(),
            log.resource_name.clone().unwrap_or_default(),
            log.description.clone().unwrap_or_default(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Falha ao finalizar CSV: {}", e))?;
    Ok(String::from_utf8(bytes).map_err(|e| anyhow::anyhow!("CSV não é UTF-8: {}", e))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;
    use chrono::TimeZone;
    use uuid::Uuid;

    #[test]
    fn audit_csv_has_fixed_header_and_escapes_commas() {
        let log = AuditLog {
            id: Uuid::new_v4(),
            user_id: Some(Uuid::new_v4()),
            user_email: Some("ana@exemplo.com".into()),
            user_role: Some(Role::Escritorio),
            action_type: AuditAction::Create,
            resource_type: "INVESTMENT".into(),
            resource_id: None,
            resource_name: Some("Série A".into()),
            old_values: None,
            new_values: None,
            description: Some("Investimento criado, 36 parcelas".into()),
            created_at: Utc.with_ymd_and_hms(2025, 3, 5, 14, 30, 0).unwrap(),
        };

        let csv = audit_csv(&[log]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Data,Usuario,Role,Acao,Recurso,Nome_Recurso,Descricao");
        assert_eq!(
            lines[1],
            "05/03/2025 14:30:00,ana@exemplo.com,Escritório,CREATE,INVESTMENT,Série A,\"Investimento criado, 36 parcelas\""
        );
    }

    #[test]
    fn only_global_sees_everyone() {
        let global = AuthContext::new(Uuid::new_v4(), Role::Global);
        let master = AuthContext::new(Uuid::new_v4(), Role::Master);
        assert_eq!(AuditService::scope(&global), None);
        assert_eq!(AuditService::scope(&master), Some(master.user_id));
    }
}
