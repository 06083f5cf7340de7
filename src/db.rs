pub mod user_repo;
pub use user_repo::UserRepository;
pub mod debenture_repo;
pub use debenture_repo::DebentureRepository;
pub mod investment_repo;
pub use investment_repo::InvestmentRepository;
pub mod commission_repo;
pub use commission_repo::CommissionRepository;
pub mod remuneracao_repo;
pub use remuneracao_repo::RemuneracaoRepository;
pub mod audit_repo;
pub use audit_repo::AuditRepository;
