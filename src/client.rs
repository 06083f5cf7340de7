// src/client.rs
//
// Cliente HTTP da própria API, usado por jobs e integrações. Toda chamada
// passa pelo retry com backoff exponencial.

use std::{env, time::Duration};

use anyhow::Context;
use reqwest::{Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;

use crate::{
    common::retry::{retry_with_backoff, status_is_retryable, RetryPolicy, Retryable},
    models::{
        commission::{ExportFile, ImportReport},
        remuneracao::SyncReport,
    },
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// Erros que não mudam com nova tentativa.
const NON_RETRYABLE_CODES: [&str; 6] = [
    "VALIDATION_FAILED",
    "AUTH_MISSING",
    "AUTH_INVALID",
    "USER_INACTIVE",
    "ACCESS_DENIED",
    "CONFLICT",
];

#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    pub base_url: String,
    /// Enviada como Bearer token.
    pub api_key: String,
    pub retry: RetryPolicy,
}

impl ApiClientConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let base_url = env::var("API_URL").context("API_URL deve ser definida")?;
        let api_key = env::var("API_KEY").context("API_KEY deve ser definida")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            retry: RetryPolicy::default(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Falha na requisição: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("[{code}] {message} (HTTP {status})")]
    Api { status: u16, code: String, message: String },

    #[error("Resposta inválida da API: {0}")]
    InvalidResponse(String),
}

impl Retryable for ClientError {
    fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport(err) => !err.is_builder() && !err.is_decode(),
            ClientError::Api { status, code, .. } => {
                status_is_retryable(*status) && !NON_RETRYABLE_CODES.contains(&code.as_str())
            }
            ClientError::InvalidResponse(_) => false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// Converte uma resposta de erro (`{ "error": { code, message } }`) em
/// `ClientError::Api`. Corpo fora do formato vira um código genérico.
fn api_error(status: StatusCode, body: &str) -> ClientError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => ClientError::Api {
            status: status.as_u16(),
            code: envelope.error.code,
            message: envelope.error.message,
        },
        Err(_) => ClientError::Api {
            status: status.as_u16(),
            code: "UNKNOWN_ERROR".to_string(),
            message: body.chars().take(200).collect(),
        },
    }
}

/// Extrai `data` de uma resposta de sucesso.
fn decode_data<T: DeserializeOwned>(body: &str) -> Result<T, ClientError> {
    serde_json::from_str::<DataEnvelope<T>>(body)
        .map(|envelope| envelope.data)
        .map_err(|e| ClientError::InvalidResponse(e.to_string()))
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    config: ApiClientConfig,
}

impl ApiClient {
    pub fn new(config: ApiClientConfig) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { http, config })
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<(&'static str, String)>,
    ) -> Result<T, ClientError> {
        let mut request = self
            .http
            .request(method, self.config.url(path))
            .bearer_auth(&self.config.api_key);

        if let Some((content_type, payload)) = body {
            request = request.header(reqwest::header::CONTENT_TYPE, content_type).body(payload);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(api_error(status, &text));
        }

        decode_data(&text)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<(&'static str, String)>,
    ) -> Result<T, ClientError> {
        let label = format!("{} {}", method, path);
        retry_with_backoff(&self.config.retry, &label, |attempt| {
            tracing::debug!("📡 {} (tentativa {}/{})", label, attempt + 1, self.config.retry.max_attempts);
            self.send_once(method.clone(), path, body.clone())
        })
        .await
    }

    pub async fn sync_remuneracoes(&self) -> Result<SyncReport, ClientError> {
        self.call(Method::POST, "/api/remuneracoes/sync", None).await
    }

    pub async fn export_remuneracoes(&self) -> Result<ExportFile, ClientError> {
        self.call(Method::GET, "/api/remuneracoes/export", None).await
    }

    pub async fn import_remuneracoes(&self, csv: String) -> Result<ImportReport, ClientError> {
        self.call(Method::POST, "/api/remuneracoes/import", Some(("text/csv", csv)))
            .await
    }

    pub async fn export_commissions(&self) -> Result<ExportFile, ClientError> {
        self.call(Method::GET, "/api/commissions/export", None).await
    }

    pub async fn import_commissions(&self, csv: String) -> Result<ImportReport, ClientError> {
        self.call(Method::POST, "/api/commissions/import", Some(("text/csv", csv)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> ApiClientConfig {
        ApiClientConfig {
            base_url: base_url.to_string(),
            api_key: "chave".to_string(),
            retry: RetryPolicy::default(),
        }
    }

    #[test]
    fn joins_paths_without_double_slashes() {
        let cfg = config("http://localhost:3000");
        assert_eq!(cfg.url("/api/health"), "http://localhost:3000/api/health");
        assert_eq!(cfg.url("api/health"), "http://localhost:3000/api/health");
    }

    #[test]
    fn reads_error_envelope_codes() {
        let body = r#"{"error":{"code":"ACCESS_DENIED","message":"Acesso Negado.","timestamp":"x"}}"#;
        match api_error(StatusCode::FORBIDDEN, body) {
            ClientError::Api { status, code, .. } => {
                assert_eq!(status, 403);
                assert_eq!(code, "ACCESS_DENIED");
            }
            other => panic!("esperava erro de API, veio {:?}", other),
        }
    }

    #[test]
    fn decodes_data_envelopes_of_job_reports() {
        let body = r#"{"data":{"investmentsProcessed":2,"recordsCreated":24,"commissionsCreated":72}}"#;
        let report: SyncReport = decode_data(body).unwrap();
        assert_eq!(
            report,
            SyncReport {
                investments_processed: 2,
                records_created: 24,
                commissions_created: 72,
            }
        );

        let body = r#"{"data":{"totalProcessed":3,"successCount":2,"errorCount":1,"errors":["Linha 3: x"]}}"#;
        let report: ImportReport = decode_data(body).unwrap();
        assert_eq!(report.error_count, 1);

        assert!(matches!(
            decode_data::<SyncReport>(r#"{"investmentsProcessed":2}"#),
            Err(ClientError::InvalidResponse(_))
        ));
    }

    #[test]
    fn only_transient_failures_are_retried() {
        let api = |status: u16, code: &str| ClientError::Api {
            status,
            code: code.to_string(),
            message: String::new(),
        };

        assert!(api(500, "INTERNAL_ERROR").is_retryable());
        assert!(api(503, "UNKNOWN_ERROR").is_retryable());
        assert!(api(429, "UNKNOWN_ERROR").is_retryable());
        assert!(api(408, "UNKNOWN_ERROR").is_retryable());
        assert!(!api(400, "VALIDATION_FAILED").is_retryable());
        assert!(!api(404, "NOT_FOUND").is_retryable());
        assert!(!api(500, "AUTH_MISSING").is_retryable());
        assert!(!ClientError::InvalidResponse("json".into()).is_retryable());
    }
}
