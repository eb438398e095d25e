//! Input validation and normalization.

use std::fmt;

use serde_json::Value;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Empty value where one is required.
    Empty(String),
    /// Value too long.
    TooLong { field: String, max: usize, actual: usize },
    /// Poll vote selection that cannot be normalized to option indices.
    InvalidSelection(String),
    /// Poll payload missing question or options.
    InvalidPoll(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::InvalidSelection(msg) => write!(f, "invalid selection: {}", msg),
            ValidationError::InvalidPoll(msg) => write!(f, "invalid poll: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Maximum allowed length for usernames.
pub const MAX_USERNAME_LENGTH: usize = 150;

/// Maximum allowed length for group names.
pub const MAX_GROUP_NAME_LENGTH: usize = 100;

/// Validate a username.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let username = username.trim();

    if username.is_empty() {
        return Err(ValidationError::Empty("username".to_string()));
    }

    let length = username.chars().count();
    if length > MAX_USERNAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: MAX_USERNAME_LENGTH,
            actual: length,
        });
    }

    Ok(())
}

/// Validate a password at registration time.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::Empty("password".to_string()));
    }
    Ok(())
}

/// Validate a group name.
pub fn validate_group_name(name: &str) -> Result<(), ValidationError> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Empty("group name".to_string()));
    }

    let length = name.chars().count();
    if length > MAX_GROUP_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "group name".to_string(),
            max: MAX_GROUP_NAME_LENGTH,
            actual: length,
        });
    }

    Ok(())
}

/// Normalize a poll vote selection to zero-based option indices.
///
/// Accepts a single integer, a numeric string, or a list of either.
/// Returns the normalized index list. Indices are not checked against
/// any poll's option count.
pub fn normalize_selection(selected: &Value) -> Result<Vec<i64>, ValidationError> {
    match selected {
        Value::Number(n) => Ok(vec![number_to_index(n)?]),
        Value::String(s) => Ok(vec![parse_index(s)?]),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Number(n) => number_to_index(n),
                Value::String(s) => parse_index(s),
                other => Err(ValidationError::InvalidSelection(format!(
                    "unexpected element {}",
                    other
                ))),
            })
            .collect(),
        other => Err(ValidationError::InvalidSelection(format!(
            "expected index or list of indices, got {}",
            other
        ))),
    }
}

fn number_to_index(n: &serde_json::Number) -> Result<i64, ValidationError> {
    n.as_i64()
        .ok_or_else(|| ValidationError::InvalidSelection(format!("{} is not an integer", n)))
}

fn parse_index(s: &str) -> Result<i64, ValidationError> {
    s.trim()
        .parse::<i64>()
        .map_err(|_| ValidationError::InvalidSelection(format!("{:?} is not an integer", s)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("  ").is_err());
        assert!(validate_username(&"x".repeat(151)).is_err());
    }

    // The limit counts characters, not bytes.
    #[test]
    fn test_validate_username_length_is_in_chars() {
        assert!(validate_username(&"é".repeat(150)).is_ok());
        assert!(validate_username(&"é".repeat(151)).is_err());
    }

    #[test]
    fn test_normalize_single_integer() {
        assert_eq!(normalize_selection(&json!(3)).unwrap(), vec![3]);
        assert_eq!(normalize_selection(&json!(0)).unwrap(), vec![0]);
    }

    #[test]
    fn test_normalize_numeric_string() {
        assert_eq!(normalize_selection(&json!("3")).unwrap(), vec![3]);
        assert_eq!(normalize_selection(&json!(" 2 ")).unwrap(), vec![2]);
    }

    #[test]
    fn test_normalize_list() {
        assert_eq!(normalize_selection(&json!([0, "2"])).unwrap(), vec![0, 2]);
        assert_eq!(normalize_selection(&json!([])).unwrap(), Vec::<i64>::new());
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        assert!(normalize_selection(&json!("abc")).is_err());
        assert!(normalize_selection(&json!({"a": 1})).is_err());
        assert!(normalize_selection(&json!([true])).is_err());
        assert!(normalize_selection(&json!(1.5)).is_err());
        assert!(normalize_selection(&json!(null)).is_err());
    }
}
