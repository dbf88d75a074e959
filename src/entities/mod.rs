pub mod prelude;

pub mod account_deactivations;
pub mod accounts;
pub mod profiles;
pub mod reactivation_requests;
pub mod verification_tokens;
