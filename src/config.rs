// src/config.rs

use crate::{
    db::{
        AuditRepository, CommissionRepository, DebentureRepository, InvestmentRepository,
        RemuneracaoRepository, UserRepository,
    },
    services::{
        AuditService, AuthService, CommissionService, DebentureService, InvestmentService,
        RemuneracaoService, UserService,
    },
};
use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_JWT_TTL_HOURS: i64 = 168;

/// Variáveis de ambiente lidas na inicialização.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub jwt_ttl_hours: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let jwt_ttl_hours = match env::var("JWT_TTL_HOURS") {
            Ok(value) => value
                .parse()
                .with_context(|| format!("JWT_TTL_HOURS inválido: '{}'", value))?,
            Err(_) => DEFAULT_JWT_TTL_HOURS,
        };

        Ok(Self { database_url, jwt_secret, bind_addr, jwt_ttl_hours })
    }

    pub async fn connect(&self) -> anyhow::Result<PgPool> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&self.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
        Ok(pool)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub debenture_service: DebentureService,
    pub investment_service: InvestmentService,
    pub commission_service: CommissionService,
    pub remuneracao_service: RemuneracaoService,
    pub audit_service: AuditService,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let db_pool = config.connect().await?;
        Ok(Self::from_pool(db_pool, config))
    }

    // --- Monta o gráfico de dependências ---
    pub fn from_pool(db_pool: PgPool, config: &Config) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let debenture_repo = DebentureRepository::new(db_pool.clone());
        let investment_repo = InvestmentRepository::new(db_pool.clone());
        let commission_repo = CommissionRepository::new(db_pool.clone());
        let remuneracao_repo = RemuneracaoRepository::new(db_pool.clone());
        let audit_repo = AuditRepository::new(db_pool.clone());

        let audit_service = AuditService::new(audit_repo, db_pool.clone());
        let auth_service = AuthService::new(
            user_repo.clone(),
            db_pool.clone(),
            config.jwt_secret.clone(),
            config.jwt_ttl_hours,
        );
        let user_service = UserService::new(user_repo.clone(), audit_service.clone(), db_pool.clone());
        let debenture_service = DebentureService::new(
            debenture_repo.clone(),
            investment_repo.clone(),
            audit_service.clone(),
            db_pool.clone(),
        );
        let investment_service = InvestmentService::new(
            investment_repo.clone(),
            debenture_repo,
            commission_repo.clone(),
            remuneracao_repo.clone(),
            user_repo.clone(),
            audit_service.clone(),
            db_pool.clone(),
        );
        let commission_service = CommissionService::new(
            commission_repo.clone(),
            user_repo.clone(),
            audit_service.clone(),
            db_pool.clone(),
        );
        let remuneracao_service = RemuneracaoService::new(
            remuneracao_repo,
            commission_repo,
            investment_repo,
            user_repo,
            audit_service.clone(),
            db_pool.clone(),
        );

        Self {
            db_pool,
            auth_service,
            user_service,
            debenture_service,
            investment_service,
            commission_service,
            remuneracao_service,
            audit_service,
        }
    }
}
