//src/main.rs

use anyhow::Context;
use axum::{
    middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use debentures::{
    config::{AppState, Config},
    docs::ApiDoc,
    handlers,
    middleware::auth::auth_guard,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let config = Config::from_env()?;
    let app_state = AppState::new(&config).await?;

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados.")?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Rotas públicas
    let auth_routes = Router::new().route("/login", post(handlers::auth::login));

    // Tudo abaixo exige Bearer token
    let user_routes = Router::new()
        .route("/", get(handlers::users::list_users).post(handlers::users::create_user))
        .route("/me", get(handlers::auth::get_me))
        .route(
            "/{id}",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .route("/{id}/superior-candidates", get(handlers::users::superior_candidates));

    let debenture_routes = Router::new()
        .route(
            "/",
            get(handlers::debentures::list_debentures).post(handlers::debentures::create_debenture),
        )
        .route(
            "/{id}",
            get(handlers::debentures::get_debenture)
                .put(handlers::debentures::update_debenture)
                .delete(handlers::debentures::delete_debenture),
        )
        .route(
            "/{id}/series",
            get(handlers::debentures::list_series).post(handlers::debentures::create_series),
        );

    let series_routes = Router::new().route(
        "/{id}",
        put(handlers::debentures::update_series).delete(handlers::debentures::delete_series),
    );

    let investment_routes = Router::new()
        .route(
            "/",
            get(handlers::investments::list_investments).post(handlers::investments::create_investment),
        )
        .route("/{id}", delete(handlers::investments::delete_investment))
        .route("/{id}/status", patch(handlers::investments::update_investment_status));

    let commission_routes = Router::new()
        .route("/", get(handlers::commissions::list_commissions))
        .route("/summary", get(handlers::commissions::commission_summary))
        .route("/report", get(handlers::commissions::commission_report))
        .route("/export", get(handlers::commissions::export_commissions))
        .route("/import", post(handlers::commissions::import_commissions))
        .route("/{id}/status", patch(handlers::commissions::update_commission_status));

    let remuneracao_routes = Router::new()
        .route("/", get(handlers::remuneracoes::list_remuneracoes))
        .route("/summary", get(handlers::remuneracoes::remuneracao_summary))
        .route("/sync", post(handlers::remuneracoes::sync_remuneracoes))
        .route("/export", get(handlers::remuneracoes::export_remuneracoes))
        .route("/import", post(handlers::remuneracoes::import_remuneracoes));

    let audit_routes = Router::new()
        .route("/", get(handlers::audit::list_audit_logs))
        .route("/stats", get(handlers::audit::audit_stats))
        .route("/export", get(handlers::audit::export_audit_logs));

    let protected = Router::new()
        .nest("/api/users", user_routes)
        .nest("/api/debentures", debenture_routes)
        .nest("/api/series", series_routes)
        .nest("/api/investments", investment_routes)
        .nest("/api/commissions", commission_routes)
        .nest("/api/remuneracoes", remuneracao_routes)
        .nest("/api/audit-logs", audit_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    let app = Router::new()
        .merge(SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(handlers::health::health))
        .nest("/api/auth", auth_routes)
        .merge(protected)
        .with_state(app_state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {}", config.bind_addr))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await.context("Erro no servidor Axum")?;

    Ok(())
}
