pub mod account;
pub mod reactivation;
pub mod token;
