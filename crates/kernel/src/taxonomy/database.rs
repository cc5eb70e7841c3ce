//! Tagging of database driver errors with routing codes.
//!
//! PostgreSQL reports constraint violations with a SQLSTATE, a one-line
//! message and a separate `DETAIL` string. These are re-assembled into the
//! shapes the diagnostic extractors read, prefixed with the matching code.

use std::sync::LazyLock;

use regex::Regex;
use sqlx::postgres::PgDatabaseError;

use super::code::ErrorCode;
use crate::diagnostic::split_key_list;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

#[allow(clippy::expect_used)]
static DUPLICATE_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Key \((.+?)\)=\((.*)\) already exists\.?$").expect("valid regex literal")
});

/// Tag a `sqlx` error for the dispatcher, or `None` if it has no code.
pub fn tag_database_error(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::RowNotFound => {
            Some(ErrorCode::NotFound.tag("The requested record was not found."))
        }
        sqlx::Error::Database(db) => {
            let detail = db
                .try_downcast_ref::<PgDatabaseError>()
                .and_then(PgDatabaseError::detail);
            tag_constraint_violation(
                db.code().as_deref(),
                db.constraint(),
                db.message(),
                detail,
            )
        }
        _ => None,
    }
}

/// Tag a constraint violation from its parts.
///
/// A unique violation on one column of a non-primary-key constraint becomes
/// the bracketed unique shape. Primary keys, composite keys and values that
/// contain brackets keep the two-line `DETAIL` shape.
pub fn tag_constraint_violation(
    sqlstate: Option<&str>,
    constraint: Option<&str>,
    message: &str,
    detail: Option<&str>,
) -> Option<String> {
    let detail = detail?;
    let two_line = format!("{message}\nDETAIL:  {detail}");

    match sqlstate? {
        UNIQUE_VIOLATION => {
            if constraint.is_some_and(is_primary_key_constraint) {
                return Some(ErrorCode::PrimaryKey.tag(&two_line));
            }
            match single_column_key(detail) {
                Some((field, value)) => Some(ErrorCode::UniqueConstraint.tag(&format!(
                    "[{field}] [{value}] Field '{field}' must have unique values. \
                     Provided value '{value}' already exists."
                ))),
                None => Some(ErrorCode::PrimaryKey.tag(&two_line)),
            }
        }
        FOREIGN_KEY_VIOLATION => Some(ErrorCode::ForeignKey.tag(&two_line)),
        _ => None,
    }
}

/// Column and full value of a one-column duplicate key report.
///
/// The value is kept whole, commas included. `None` when the key spans
/// several columns or the value could not sit inside a bracketed token.
fn single_column_key(detail: &str) -> Option<(String, String)> {
    let caps = DUPLICATE_KEY.captures(detail)?;
    let mut columns = split_key_list(&caps[1]).into_iter();
    let field = columns.next().filter(|c| !c.is_empty())?;
    if columns.next().is_some() {
        return None;
    }
    let value = &caps[2];
    if value.contains(['[', ']']) {
        return None;
    }
    Some((field, value.to_string()))
}

fn is_primary_key_constraint(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with("_pkey") || lower.starts_with("pk_")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_is_not_found() {
        let tagged = tag_database_error(&sqlx::Error::RowNotFound).unwrap();
        assert!(tagged.starts_with(ErrorCode::NotFound.as_str()));
    }

    #[test]
    fn pool_errors_are_untagged() {
        assert!(tag_database_error(&sqlx::Error::PoolTimedOut).is_none());
    }

    #[test]
    fn primary_key_by_constraint_name() {
        let tagged = tag_constraint_violation(
            Some("23505"),
            Some("PK_PersonPhone_BusinessEntityID_PhoneNumber"),
            "duplicate key value violates unique constraint",
            Some(r#"Key ("BusinessEntityID", "PhoneNumber")=(1, 000 000 000) already exists."#),
        )
        .unwrap();
        let (code, rest) = ErrorCode::split_message(&tagged).unwrap();
        assert_eq!(code, ErrorCode::PrimaryKey);
        assert_eq!(
            rest.lines().nth(1).unwrap(),
            r#"DETAIL:  Key ("BusinessEntityID", "PhoneNumber")=(1, 000 000 000) already exists."#
        );
    }

    #[test]
    fn single_column_unique_uses_bracket_shape() {
        let tagged = tag_constraint_violation(
            Some("23505"),
            Some("ix_email_address"),
            "duplicate key value violates unique constraint \"ix_email_address\"",
            Some("Key (email_address)=(ken0@adventure-works.com) already exists."),
        )
        .unwrap();
        assert_eq!(
            tagged,
            "E-UNIQUE[email_address] [ken0@adventure-works.com] Field 'email_address' must \
             have unique values. Provided value 'ken0@adventure-works.com' already exists."
        );
    }

    #[test]
    fn unique_value_with_comma_stays_whole() {
        let tagged = tag_constraint_violation(
            Some("23505"),
            Some("ix_last_name"),
            "duplicate key value violates unique constraint \"ix_last_name\"",
            Some("Key (last_name)=(Smith, Jr.) already exists."),
        )
        .unwrap();
        assert_eq!(
            tagged,
            "E-UNIQUE[last_name] [Smith, Jr.] Field 'last_name' must have unique values. \
             Provided value 'Smith, Jr.' already exists."
        );
    }

    #[test]
    fn unique_value_with_brackets_keeps_two_line_shape() {
        let tagged = tag_constraint_violation(
            Some("23505"),
            Some("ix_email_address"),
            "duplicate key value violates unique constraint \"ix_email_address\"",
            Some("Key (email_address)=(a]b) already exists."),
        )
        .unwrap();
        let (code, rest) = ErrorCode::split_message(&tagged).unwrap();
        assert_eq!(code, ErrorCode::PrimaryKey);
        assert!(rest.ends_with("DETAIL:  Key (email_address)=(a]b) already exists."));
    }

    #[test]
    fn quoted_single_column_is_unquoted() {
        assert_eq!(
            single_column_key(r#"Key ("EmailAddress")=(x@y.z) already exists."#),
            Some(("EmailAddress".to_string(), "x@y.z".to_string()))
        );
        assert_eq!(single_column_key("Key (a, b)=(1, 2) already exists."), None);
        assert_eq!(single_column_key("Key (a)=([1]) already exists."), None);
    }

    #[test]
    fn composite_unique_keeps_two_line_shape() {
        let tagged = tag_constraint_violation(
            Some("23505"),
            Some("uq_name"),
            "duplicate key value violates unique constraint \"uq_name\"",
            Some("Key (first_name, last_name)=(Ken, Sanchez) already exists."),
        )
        .unwrap();
        assert!(tagged.starts_with(ErrorCode::PrimaryKey.as_str()));
    }

    #[test]
    fn foreign_key_violation() {
        let tagged = tag_constraint_violation(
            Some("23503"),
            Some("FK_PersonPhone_PhoneNumberType"),
            "insert or update on table \"PersonPhone\" violates foreign key constraint",
            Some("Key (PhoneNumberTypeID)=(6) is not present in table \"PhoneNumberType\"."),
        )
        .unwrap();
        assert!(tagged.starts_with("E-FKEYNF"));
    }

    #[test]
    fn other_sqlstates_and_missing_detail_are_untagged() {
        assert!(
            tag_constraint_violation(Some("42P01"), None, "relation missing", Some("x")).is_none()
        );
        assert!(tag_constraint_violation(Some("23505"), None, "dup", None).is_none());
        assert!(tag_constraint_violation(None, None, "dup", Some("x")).is_none());
    }
}
