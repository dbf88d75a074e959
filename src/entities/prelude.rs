pub use super::account_deactivations::Entity as AccountDeactivations;
pub use super::accounts::Entity as Accounts;
pub use super::profiles::Entity as Profiles;
pub use super::reactivation_requests::Entity as ReactivationRequests;
pub use super::verification_tokens::Entity as VerificationTokens;
