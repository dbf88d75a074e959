mod admin;
mod judges;
mod reactivations;
mod tokens;

pub use admin::cmd_create_admin;
pub use judges::{cmd_approve_judges, cmd_pending_judges};
pub use reactivations::{cmd_reactivations, cmd_review_reactivation};
pub use tokens::cmd_purge_tokens;
