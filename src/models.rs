pub mod audit;
pub mod auth;
pub mod commission;
pub mod debenture;
pub mod investment;
pub mod remuneracao;
pub mod user;
