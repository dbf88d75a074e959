pub mod image;
pub use image::{ImageError, ImageService};

pub mod notifier;
pub use notifier::{LogNotifier, MailNotifier, NotificationContext, NotificationKind, Notifier};

pub mod tokens;
pub use tokens::{Redemption, TokenCodec, TokenError};

pub mod account_service;
pub mod account_service_impl;
pub use account_service::{
    AccountError, AccountService, AccountStatus, Dashboard, DeactivationReceipt,
    DeactivationRequest, ProfileUpdate, ProfileView, RegisterOutcome, RegisterRequest,
    SettingsOutcome, SettingsUpdate, VerifyOutcome,
};
pub use account_service_impl::SeaOrmAccountService;

pub mod admin_service;
pub mod admin_service_impl;
pub use admin_service::{
    AccountSummary, AdminError, AdminService, ApprovalReport, BulkOutcome, ReviewReport,
    ReviewRequest,
};
pub use admin_service_impl::SeaOrmAdminService;
