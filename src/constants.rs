/// File extensions accepted for profile images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];

pub mod tokens {

    /// Random bytes per token; rendered as twice as many hex characters.
    pub const TOKEN_BYTES: usize = 32;
}

pub mod limits {

    pub const MAX_BIO_CHARS: usize = 500;

    pub const MAX_FEEDBACK_CHARS: usize = 500;

    pub const MAX_REACTIVATION_MESSAGE_CHARS: usize = 500;

    pub const MAX_NAME_CHARS: usize = 100;

    pub const MAX_USERNAME_CHARS: usize = 150;

    pub const MAX_PHONE_CHARS: usize = 20;

    pub const MAX_ADMIN_NOTES_CHARS: usize = 2000;

    pub const MAX_YEARS_EXPERIENCE: i32 = 50;

    pub const MAX_BULK_IDS: usize = 500;
}
