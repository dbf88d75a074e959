use super::ApiError;
use crate::constants::{limits, tokens};
use crate::domain::{AccountId, ReactivationStatus, Role};

pub fn validate_account_id(id: i32) -> Result<AccountId, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid account ID: {}. ID must be a positive integer",
            id
        )));
    }
    Ok(AccountId::new(id))
}

pub fn validate_request_id(id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid request ID: {}. ID must be a positive integer",
            id
        )));
    }
    Ok(id)
}

pub fn validate_id_list(ids: &[AccountId]) -> Result<&[AccountId], ApiError> {
    if ids.is_empty() {
        return Err(ApiError::validation("Select at least one account"));
    }

    if ids.len() > limits::MAX_BULK_IDS {
        return Err(ApiError::validation(format!(
            "At most {} accounts can be changed at once",
            limits::MAX_BULK_IDS
        )));
    }

    if let Some(bad) = ids.iter().find(|id| id.value() <= 0) {
        return Err(ApiError::validation(format!("Invalid account ID: {}", bad)));
    }

    Ok(ids)
}

/// Rejects malformed tokens before they reach the database. A token is the
/// hex encoding of `TOKEN_BYTES` random bytes.
pub fn validate_token(token: &str) -> Result<&str, ApiError> {
    let token = token.trim();
    if token.len() != tokens::TOKEN_BYTES * 2 || !token.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ApiError::validation(super::error::INVALID_LINK_MESSAGE));
    }
    Ok(token)
}

pub fn parse_role(role: Option<&str>) -> Result<Option<Role>, ApiError> {
    role.map(|r| {
        r.parse::<Role>()
            .map_err(|_| ApiError::validation(format!("Unknown role: {}", r)))
    })
    .transpose()
}

pub fn parse_reactivation_status(
    status: Option<&str>,
) -> Result<Option<ReactivationStatus>, ApiError> {
    match status.map(str::trim) {
        None | Some("" | "all") => Ok(None),
        Some("pending") => Ok(Some(ReactivationStatus::Pending)),
        Some("approved") => Ok(Some(ReactivationStatus::Approved)),
        Some("denied") => Ok(Some(ReactivationStatus::Denied)),
        Some(other) => Err(ApiError::validation(format!(
            "Unknown status: {}. Use pending, approved, denied or all",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_account_id() {
        assert!(validate_account_id(1).is_ok());
        assert!(validate_account_id(0).is_err());
        assert!(validate_account_id(-4).is_err());
    }

    #[test]
    fn test_validate_id_list() {
        assert!(validate_id_list(&[]).is_err());
        assert!(validate_id_list(&[AccountId::new(1), AccountId::new(2)]).is_ok());
        assert!(validate_id_list(&[AccountId::new(1), AccountId::new(0)]).is_err());

        let too_many: Vec<AccountId> = (1..=limits::MAX_BULK_IDS as i32 + 1)
            .map(AccountId::new)
            .collect();
        assert!(validate_id_list(&too_many).is_err());
    }

    #[test]
    fn test_validate_token() {
        let good = "ab".repeat(tokens::TOKEN_BYTES);
        assert!(validate_token(&good).is_ok());
        assert!(validate_token("").is_err());
        assert!(validate_token("abc").is_err());
        assert!(validate_token(&"zz".repeat(tokens::TOKEN_BYTES)).is_err());
    }

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role(None).unwrap(), None);
        assert_eq!(parse_role(Some("judge")).unwrap(), Some(Role::Judge));
        assert!(parse_role(Some("overlord")).is_err());
    }

    #[test]
    fn test_parse_reactivation_status() {
        assert_eq!(parse_reactivation_status(None).unwrap(), None);
        assert_eq!(parse_reactivation_status(Some("all")).unwrap(), None);
        assert_eq!(
            parse_reactivation_status(Some("denied")).unwrap(),
            Some(ReactivationStatus::Denied)
        );
        assert!(parse_reactivation_status(Some("lost")).is_err());
    }
}
