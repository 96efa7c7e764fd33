use chrono::{Datelike, Utc};
use std::borrow::Cow;
use validator::ValidationError;

/// Nom réservé par l'endpoint /users/me
pub const RESERVED_USERNAME: &str = "me";

pub const DESCRIPTION_MAX_CHARS: usize = 255;

fn error(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Owned(message));
    err
}

/// Username: lettres, chiffres et `_ . @ + -`, jamais "me".
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username == RESERVED_USERNAME {
        return Err(error(
            "reserved_username",
            format!("Username <{}> is not allowed.", RESERVED_USERNAME),
        ));
    }
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-');
    if username.is_empty() || !username.chars().all(allowed) {
        return Err(error(
            "invalid_username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.".to_string(),
        ));
    }
    Ok(())
}

/// L'année d'une œuvre ne peut pas dépasser l'année courante.
pub fn validate_year(year: i32) -> Result<(), ValidationError> {
    let now = Utc::now().year();
    if year > now {
        return Err(error(
            "year_in_future",
            format!("{} cannot be greater than {}.", year, now),
        ));
    }
    Ok(())
}

/// Description d'une œuvre: 255 caractères au plus.
pub fn validate_description(description: &str) -> Result<(), ValidationError> {
    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        return Err(error(
            "description_too_long",
            format!("Ensure this field has no more than {} characters.", DESCRIPTION_MAX_CHARS),
        ));
    }
    Ok(())
}

/// Slug: `^[-a-zA-Z0-9_]+$`
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_';
    if slug.is_empty() || !slug.chars().all(allowed) {
        return Err(error(
            "invalid_slug",
            "Enter a valid slug consisting of letters, numbers, underscores or hyphens.".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_me_is_rejected() {
        let err = validate_username("me").unwrap_err();
        assert_eq!(err.code, "reserved_username");
    }

    #[test]
    fn test_username_charset() {
        assert!(validate_username("john.doe+reviews@home-1_x").is_ok());
        assert!(validate_username("Me").is_ok());
        assert!(validate_username("john doe").is_err());
        assert!(validate_username("john/doe").is_err());
        assert!(validate_username("").is_err());
    }

    #[test]
    fn test_year_not_in_future() {
        let now = Utc::now().year();
        assert!(validate_year(now).is_ok());
        assert!(validate_year(1895).is_ok());
        assert!(validate_year(now + 1).is_err());
    }

    #[test]
    fn test_slug() {
        assert!(validate_slug("sci-fi_2").is_ok());
        assert!(validate_slug("sci fi").is_err());
        assert!(validate_slug("фантастика").is_err());
    }
}
