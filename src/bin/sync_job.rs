// src/bin/sync_job.rs
//
// Operações de remuneração pela API, para uso em cron ou manualmente:
//   sync-job                     sincroniza parcelas faltantes
//   sync-job export <arquivo>    grava o CSV de remunerações
//   sync-job import <arquivo>    aplica status de um CSV (exige token Global)
//   sync-job export-comissoes <arquivo>
//   sync-job import-comissoes <arquivo>
// O token em API_KEY precisa ser de um usuário ativo.

use anyhow::{bail, Context};
use tracing_subscriber::EnvFilter;

use debentures::{
    client::{ApiClient, ApiClientConfig},
    models::commission::ImportReport,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = ApiClientConfig::from_env()?;
    let client = ApiClient::new(config)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        [] | ["sync"] => {
            let report = client.sync_remuneracoes().await?;
            tracing::info!(
                "✅ Sincronização concluída: {} investimentos, {} remunerações e {} comissões criadas",
                report.investments_processed,
                report.records_created,
                report.commissions_created
            );
        }
        ["export", path] => {
            let file = client.export_remuneracoes().await?;
            tokio::fs::write(path, file.csv_content.as_bytes())
                .await
                .with_context(|| format!("Falha ao gravar {}", path))?;
            tracing::info!("📤 {} remunerações gravadas em {}", file.total_records, path);
        }
        ["import", path] => {
            let csv = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Falha ao ler {}", path))?;
            log_import(&client.import_remuneracoes(csv).await?);
        }
        ["export-comissoes", path] => {
            let file = client.export_commissions().await?;
            tokio::fs::write(path, file.csv_content.as_bytes())
                .await
                .with_context(|| format!("Falha ao gravar {}", path))?;
            tracing::info!("📤 {} comissões gravadas em {}", file.total_records, path);
        }
        ["import-comissoes", path] => {
            let csv = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Falha ao ler {}", path))?;
            log_import(&client.import_commissions(csv).await?);
        }
        other => bail!(
            "Uso: sync-job [sync | export <arquivo> | import <arquivo> | export-comissoes <arquivo> | import-comissoes <arquivo>] (recebido: {:?})",
            other
        ),
    }

    Ok(())
}

fn log_import(report: &ImportReport) {
    tracing::info!(
        "📥 Importação: {} linhas, {} atualizadas, {} com erro",
        report.total_processed,
        report.success_count,
        report.error_count
    );
    for error in &report.errors {
        tracing::warn!("⚠️ {}", error);
    }
}
