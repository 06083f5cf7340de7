pub mod audit;
pub mod auth;
pub mod commissions;
pub mod debentures;
pub mod health;
pub mod investments;
pub mod remuneracoes;
pub mod users;
