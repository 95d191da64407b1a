//! Field-level input validation.
//!
//! Messages are user-facing and shown inline next to the offending field.

use std::fmt;

use chrono::NaiveDate;

/// Validation error types. Every variant names the field it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required value missing.
    Required {
        field: &'static str,
        message: &'static str,
    },
    /// Fewer characters than required. `subject` is the phrase used in the message.
    TooShort {
        field: &'static str,
        subject: &'static str,
        min: usize,
    },
    /// Value too long.
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
    /// Invalid email format.
    InvalidEmail { field: &'static str },
    /// Not a number.
    InvalidNumber { field: &'static str },
    /// Number must be strictly positive.
    NotPositive { field: &'static str },
    /// Number outside an inclusive range.
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
    },
    /// Not an ISO `YYYY-MM-DD` date.
    InvalidDate { field: &'static str },
    /// Not one of the allowed values.
    InvalidChoice { field: &'static str, value: String },
    /// Confirmation does not match.
    Mismatch { field: &'static str },
}

impl ValidationError {
    /// The form field this error belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Required { field, .. }
            | ValidationError::TooShort { field, .. }
            | ValidationError::TooLong { field, .. }
            | ValidationError::InvalidEmail { field }
            | ValidationError::InvalidNumber { field }
            | ValidationError::NotPositive { field }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::InvalidDate { field }
            | ValidationError::InvalidChoice { field, .. }
            | ValidationError::Mismatch { field } => field,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Required { message, .. } => f.write_str(message),
            ValidationError::TooShort { subject, min, .. } => {
                write!(f, "{} debe tener al menos {} caracteres", subject, min)
            }
            ValidationError::TooLong { max, actual, .. } => {
                write!(f, "Demasiado largo ({} caracteres, máximo {})", actual, max)
            }
            ValidationError::InvalidEmail { .. } => f.write_str("Email inválido"),
            ValidationError::InvalidNumber { .. } => f.write_str("Debe ser un número"),
            ValidationError::NotPositive { .. } => f.write_str("El valor debe ser positivo"),
            ValidationError::OutOfRange { min, max, .. } => {
                write!(f, "Debe estar entre {} y {}", min, max)
            }
            ValidationError::InvalidDate { .. } => f.write_str("Fecha inválida"),
            ValidationError::InvalidChoice { value, .. } => write!(f, "Opción inválida: {}", value),
            ValidationError::Mismatch { .. } => f.write_str("Las contraseñas no coinciden"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// All validation errors of one form, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    /// Record the error of a check, if any.
    pub fn check(&mut self, result: Result<(), ValidationError>) {
        if let Err(e) = result {
            self.push(e);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    /// First error recorded for `field`.
    pub fn get(&self, field: &str) -> Option<&ValidationError> {
        self.0.iter().find(|e| e.field() == field)
    }

    /// Message of the first error for `field`, for inline display.
    pub fn message(&self, field: &str) -> Option<String> {
        self.get(field).map(ToString::to_string)
    }

    /// `Ok(value)` when no error was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", error.field(), error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self(vec![error])
    }
}

/// Maximum allowed length for email addresses.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum allowed length for short text fields (names, titles, subjects).
pub const MAX_TEXT_LENGTH: usize = 255;

/// Maximum allowed length for free-form text (notes, descriptions).
pub const MAX_LONG_TEXT_LENGTH: usize = 10_000;

/// Validate an email address (basic format check).
///
/// This is a basic validation that checks:
/// - Contains exactly one @
/// - Has at least one character before and after @
/// - Has a dot after @, not at either end of the domain and not doubled
/// - Is not too long
pub fn validate_email(field: &'static str, email: &str) -> Result<(), ValidationError> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::InvalidEmail { field });
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_EMAIL_LENGTH,
            actual: email.len(),
        });
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::InvalidEmail { field });
    };

    let invalid = local.is_empty()
        || domain.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || domain.contains("..")
        || email.chars().any(char::is_whitespace);

    if invalid {
        return Err(ValidationError::InvalidEmail { field });
    }

    Ok(())
}

/// Require at least `min` characters (after trimming).
pub fn validate_min_chars(
    field: &'static str,
    subject: &'static str,
    value: &str,
    min: usize,
) -> Result<(), ValidationError> {
    if value.trim().chars().count() < min {
        return Err(ValidationError::TooShort {
            field,
            subject,
            min,
        });
    }
    Ok(())
}

/// Require at most `max` characters.
pub fn validate_max_chars(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual > max {
        return Err(ValidationError::TooLong { field, max, actual });
    }
    Ok(())
}

/// Require a non-blank value.
pub fn validate_required(
    field: &'static str,
    message: &'static str,
    value: &str,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required { field, message });
    }
    Ok(())
}

/// Require a finite, strictly positive number.
pub fn validate_positive(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::InvalidNumber { field });
    }
    if value <= 0.0 {
        return Err(ValidationError::NotPositive { field });
    }
    Ok(())
}

/// Require `min <= value <= max`.
pub fn validate_range(field: &'static str, value: i64, min: i64, max: i64) -> Result<(), ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange { field, min, max });
    }
    Ok(())
}

/// Parse an ISO `YYYY-MM-DD` date.
pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate { field })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email_valid() {
        assert!(validate_email("email", "test@example.com").is_ok());
        assert!(validate_email("email", "user.name@domain.co.uk").is_ok());
        assert!(validate_email("email", "a@b.c").is_ok());
        assert!(validate_email("email", " test@example.com ").is_ok()); // trimmed
    }

    #[test]
    fn test_validate_email_invalid() {
        for email in [
            "",
            "test.example.com",
            "test@example@com",
            "@example.com",
            "test@",
            "test@localhost",
            "test@.example.com",
            "test@example.com.",
            "test@example..com",
            "te st@example.com",
        ] {
            assert!(
                matches!(
                    validate_email("email", email),
                    Err(ValidationError::InvalidEmail { field: "email" })
                ),
                "{email:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_email_too_long() {
        let email = format!("{}@example.com", "a".repeat(250));
        assert!(matches!(
            validate_email("email", &email),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_min_chars_counts_characters_not_bytes() {
        assert!(validate_min_chars("name", "El nombre", "Ñu", 2).is_ok());
        assert!(validate_min_chars("name", "El nombre", " a ", 2).is_err());
    }

    #[test]
    fn test_positive_and_range() {
        assert!(validate_positive("value", 0.01).is_ok());
        assert!(matches!(
            validate_positive("value", 0.0),
            Err(ValidationError::NotPositive { .. })
        ));
        assert!(matches!(
            validate_positive("value", f64::NAN),
            Err(ValidationError::InvalidNumber { .. })
        ));
        assert!(validate_range("probability", 0, 0, 100).is_ok());
        assert!(validate_range("probability", 100, 0, 100).is_ok());
        assert!(validate_range("probability", 101, 0, 100).is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("due_date", "2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(parse_date("due_date", "29/02/2024").is_err());
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::TooShort {
            field: "name",
            subject: "El nombre",
            min: 2,
        };
        assert_eq!(err.to_string(), "El nombre debe tener al menos 2 caracteres");

        let err = ValidationError::InvalidEmail { field: "email" };
        assert_eq!(err.to_string(), "Email inválido");
    }

    #[test]
    fn test_validation_errors_lookup() {
        let mut errors = ValidationErrors::new();
        errors.check(validate_email("email", "nope"));
        errors.check(validate_min_chars("name", "El nombre", "A", 2));
        errors.check(validate_range("probability", 50, 0, 100));

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.message("email").as_deref(), Some("Email inválido"));
        assert!(errors.get("probability").is_none());
        assert!(errors.into_result(()).is_err());
    }
}
