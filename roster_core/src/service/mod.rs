use sea_orm::{prelude::DateTimeUtc, sea_query::LikeExpr, DbErr, SqlErr};
use serde::{Deserialize, Deserializer};

pub mod access;
pub mod accounts;
pub mod groups;
pub mod projects;
pub mod resources;
pub mod stats;
pub mod students;
pub mod tasks;

pub(crate) fn now() -> DateTimeUtc {
    chrono::Utc::now()
}

/// Deserializes a field where "absent" and "explicitly null" mean different
/// things: absent leaves the outer `Option` as `None` (via `#[serde(default)]`),
/// `null` becomes `Some(None)`.
pub(crate) fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Whether the store rejected a write because of a unique index.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Trims a required text field, returning `None` when nothing is left.
pub(crate) fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Trims an optional text field; blank input is stored as NULL.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    non_empty(value.as_deref())
}

/// `LIKE` pattern matching `term` as a literal substring. Wildcards and
/// backslashes in the term are escaped.
pub(crate) fn substring_pattern(term: &str) -> LikeExpr {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');

    LikeExpr::new(pattern).escape('\\')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "nullable")]
        description: Option<Option<String>>,
    }

    #[test]
    fn test_nullable_distinguishes_absent_and_null() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        let null: Patch = serde_json::from_str(r#"{"description": null}"#).unwrap();
        let set: Patch = serde_json::from_str(r#"{"description": "x"}"#).unwrap();

        assert_eq!(absent.description, None);
        assert_eq!(null.description, Some(None));
        assert_eq!(set.description, Some(Some("x".to_string())));
    }

    #[test]
    fn test_non_empty_trims() {
        assert_eq!(non_empty(Some("  Ada ")), Some("Ada".to_string()));
        assert_eq!(non_empty(Some("   ")), None);
        assert_eq!(non_empty(None), None);
    }
}
