pub mod access;
pub mod audit_service;
pub mod auth;
pub mod commission_report;
pub mod commission_service;
pub mod debenture_service;
pub mod hierarchy;
pub mod investment_service;
pub mod reconciliation;
pub mod remuneracao_service;
pub mod schedule;
pub mod user_service;

pub use audit_service::AuditService;
pub use auth::AuthService;
pub use commission_service::CommissionService;
pub use debenture_service::DebentureService;
pub use investment_service::InvestmentService;
pub use remuneracao_service::RemuneracaoService;
pub use user_service::UserService;

use sqlx::{Executor, Postgres};

use crate::{common::error::AppError, db::UserRepository, services::hierarchy::HierarchyTree};

/// Carrega a árvore de usuários inteira (poucos milhares de linhas, 4 colunas).
pub(crate) async fn load_tree<'e, E>(user_repo: &UserRepository, executor: E) -> Result<HierarchyTree, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let nodes = user_repo.list_nodes(executor).await?;
    Ok(HierarchyTree::from_nodes(nodes))
}
