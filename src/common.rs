pub mod dates;
pub mod db_utils;
pub mod error;
pub mod money;
pub mod response;
pub mod retry;
