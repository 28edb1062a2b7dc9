//! Input validation helpers applied before any backend call.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ValidationError;
use crate::types::EntityKind;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
});

pub(crate) fn non_empty(entity: EntityKind, field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingRequiredField {
            entity,
            field: field.to_string(),
        });
    }
    Ok(())
}

pub(crate) fn amount(entity: EntityKind, field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::InvalidField {
            entity,
            field: field.to_string(),
            message: format!("must be a non-negative number, got {value}"),
        });
    }
    Ok(())
}

pub(crate) fn in_range(
    entity: EntityKind,
    field: &str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), ValidationError> {
    if !value.is_finite() || value < min || value > max {
        return Err(ValidationError::InvalidField {
            entity,
            field: field.to_string(),
            message: format!("must be between {min} and {max}, got {value}"),
        });
    }
    Ok(())
}

pub(crate) fn email(entity: EntityKind, field: &str, value: &str) -> Result<(), ValidationError> {
    if !EMAIL_PATTERN.is_match(value.trim()) {
        return Err(ValidationError::InvalidField {
            entity,
            field: field.to_string(),
            message: format!("'{value}' is not an email address"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_rejects_negative_and_nan() {
        assert!(amount(EntityKind::Product, "price", 0.0).is_ok());
        assert!(amount(EntityKind::Product, "price", -1.0).is_err());
        assert!(amount(EntityKind::Product, "price", f64::NAN).is_err());
        assert!(amount(EntityKind::Product, "price", f64::INFINITY).is_err());
    }

    #[test]
    fn test_email_shape() {
        assert!(email(EntityKind::User, "email", "lan@example.vn").is_ok());
        assert!(email(EntityKind::User, "email", "not-an-email").is_err());
        assert!(email(EntityKind::User, "email", "a b@example.com").is_err());
    }

    #[test]
    fn test_non_empty() {
        assert!(non_empty(EntityKind::Category, "name", "Toner").is_ok());
        assert!(non_empty(EntityKind::Category, "name", "   ").is_err());
    }
}
