// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Health ---
        handlers::health::health,

        // --- Auth ---
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::create_user,
        handlers::users::update_user,
        handlers::users::delete_user,
        handlers::users::superior_candidates,

        // --- Debêntures e Séries ---
        handlers::debentures::list_debentures,
        handlers::debentures::get_debenture,
        handlers::debentures::create_debenture,
        handlers::debentures::update_debenture,
        handlers::debentures::delete_debenture,
        handlers::debentures::list_series,
        handlers::debentures::create_series,
        handlers::debentures::update_series,
        handlers::debentures::delete_series,

        // --- Investimentos ---
        handlers::investments::list_investments,
        handlers::investments::create_investment,
        handlers::investments::update_investment_status,
        handlers::investments::delete_investment,

        // --- Comissões ---
        handlers::commissions::list_commissions,
        handlers::commissions::commission_summary,
        handlers::commissions::update_commission_status,
        handlers::commissions::commission_report,
        handlers::commissions::export_commissions,
        handlers::commissions::import_commissions,

        // --- Remunerações ---
        handlers::remuneracoes::list_remuneracoes,
        handlers::remuneracoes::remuneracao_summary,
        handlers::remuneracoes::sync_remuneracoes,
        handlers::remuneracoes::export_remuneracoes,
        handlers::remuneracoes::import_remuneracoes,

        // --- Auditoria ---
        handlers::audit::list_audit_logs,
        handlers::audit::audit_stats,
        handlers::audit::export_audit_logs,
    ),
    components(
        schemas(
            handlers::health::HealthStatus,

            // --- Auth ---
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Users ---
            models::user::Role,
            models::user::UserStatus,
            models::user::User,
            models::user::UserSummary,
            models::user::UserProfile,
            models::user::CreateUserPayload,
            models::user::UpdateUserPayload,
            models::user::SuperiorCandidates,

            // --- Debêntures ---
            models::debenture::RecordStatus,
            models::debenture::DebentureLifecycle,
            models::debenture::InterestType,
            models::debenture::Debenture,
            models::debenture::DebentureView,
            models::debenture::Series,
            models::debenture::CreateDebenturePayload,
            models::debenture::UpdateDebenturePayload,
            models::debenture::CreateSeriesPayload,
            models::debenture::UpdateSeriesPayload,

            // --- Investimentos ---
            models::investment::InvestmentStatus,
            models::investment::Investment,
            models::investment::InvestmentListItem,
            models::investment::InvestmentPage,
            models::investment::Pagination,
            models::investment::CreatedInvestment,
            models::investment::CreateInvestmentPayload,
            models::investment::UpdateInvestmentStatusPayload,

            // --- Pagamentos ---
            models::commission::PaymentStatus,
            models::commission::Commission,
            models::commission::PaymentSummary,
            models::commission::UpdatePaymentStatusPayload,
            models::commission::CommissionTotals,
            models::commission::MonthlyCommissionTotals,
            models::commission::RoleCommissionTotals,
            models::commission::CommissionReport,
            models::commission::ImportReport,
            models::commission::ExportFile,
            models::remuneracao::Remuneracao,
            models::remuneracao::SyncReport,

            // --- Auditoria ---
            models::audit::AuditAction,
            models::audit::AuditLog,
            models::audit::AuditStats,
        )
    ),
    tags(
        (name = "Health", description = "Verificação de disponibilidade"),
        (name = "Auth", description = "Autenticação"),
        (name = "Users", description = "Usuários e hierarquia"),
        (name = "Debentures", description = "Catálogo de debêntures e séries"),
        (name = "Investments", description = "Investimentos e geração de cronogramas"),
        (name = "Commissions", description = "Parcelas de comissão por role, relatório e CSV"),
        (name = "Remuneracoes", description = "Remunerações dos investidores, sincronização e CSV"),
        (name = "Audit", description = "Trilha de auditoria")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_route_group_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        for path in [
            "/api/auth/login",
            "/api/users/me",
            "/api/debentures/{id}/series",
            "/api/investments/{id}/status",
            "/api/commissions/summary",
            "/api/commissions/report",
            "/api/commissions/import",
            "/api/remuneracoes/import",
            "/api/audit-logs/export",
        ] {
            assert!(paths.contains_key(path), "rota ausente no OpenAPI: {}", path);
        }

        let schemes = &doc.components.as_ref().unwrap().security_schemes;
        assert!(schemes.contains_key("api_jwt"));
    }
}
