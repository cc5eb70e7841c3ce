//! Extractors for the diagnostic text emitted by the PostgreSQL driver and
//! by the API's own constraint and credential checks.
//!
//! The exact wording matched here is a compatibility contract with the
//! backend version in use; the tests pin it with fixed sample strings.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::{DiagnosticExtractor, ErrorDetail, ExtractContext, UnrecognizedShape};

/// Panics if a hard-coded regex literal is invalid (impossible in practice).
#[allow(clippy::expect_used)]
static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\[\]]*)\]").expect("valid regex literal"));

#[allow(clippy::expect_used)]
static DUPLICATE_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^DETAIL:\s+Key \((.+)\)=\((.*)\) already exists\.?\s*$")
        .expect("valid regex literal")
});

#[allow(clippy::expect_used)]
static MISSING_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^DETAIL:\s+Key \((.+)\)=\((.*)\) is not present in table "([^"]+)"\.?\s*$"#)
        .expect("valid regex literal")
});

/// Validator message for a field that was not supplied.
const FIELD_REQUIRED: &str = "field required";

/// `[field] [value] Field 'field' must have unique values. ...`
#[derive(Debug, Default)]
pub struct UniqueConstraintExtractor;

impl DiagnosticExtractor for UniqueConstraintExtractor {
    fn name(&self) -> &'static str {
        "unique_constraint"
    }

    fn extract(&self, raw: &str, _ctx: &ExtractContext) -> Result<ErrorDetail, UnrecognizedShape> {
        // Exactly two tokens; a stray bracket means a token was cut short.
        if raw.matches(['[', ']']).count() != 4 {
            return Err(self.mismatch("expected exactly two bracketed tokens"));
        }
        let mut tokens = bracketed_tokens(raw);
        match (tokens.next(), tokens.next()) {
            (Some(field), Some(value)) if !field.is_empty() => Ok(ErrorDetail::UniqueConstraint {
                field: field.to_string(),
                value: value.to_string(),
            }),
            _ => Err(self.mismatch("expected '[field] [value]' tokens")),
        }
    }
}

/// Two lines; the second is
/// `DETAIL:  Key ("Col1", "Col2")=(v1, v2) already exists.`
#[derive(Debug, Default)]
pub struct PrimaryKeyExtractor;

impl DiagnosticExtractor for PrimaryKeyExtractor {
    fn name(&self) -> &'static str {
        "primary_key"
    }

    fn extract(&self, raw: &str, _ctx: &ExtractContext) -> Result<ErrorDetail, UnrecognizedShape> {
        let line = raw
            .lines()
            .nth(1)
            .ok_or_else(|| self.mismatch("missing DETAIL line"))?;
        let caps = DUPLICATE_KEY
            .captures(line)
            .ok_or_else(|| self.mismatch("DETAIL line is not a duplicate key report"))?;

        let key_columns = split_key_list(&caps[1]);
        let key_values = split_key_list(&caps[2]);
        if key_columns.len() != key_values.len() {
            return Err(self.mismatch("key column and value counts differ"));
        }

        Ok(ErrorDetail::PrimaryKey {
            key_columns,
            key_values,
        })
    }
}

/// Two lines; the second is
/// `DETAIL:  Key (Col)=(v) is not present in table "Entity".`
#[derive(Debug, Default)]
pub struct ForeignKeyExtractor;

impl DiagnosticExtractor for ForeignKeyExtractor {
    fn name(&self) -> &'static str {
        "foreign_key"
    }

    fn extract(&self, raw: &str, _ctx: &ExtractContext) -> Result<ErrorDetail, UnrecognizedShape> {
        let line = raw
            .lines()
            .nth(1)
            .ok_or_else(|| self.mismatch("missing DETAIL line"))?;
        let caps = MISSING_REFERENCE
            .captures(line)
            .ok_or_else(|| self.mismatch("DETAIL line is not a missing reference report"))?;

        Ok(ErrorDetail::ForeignKey {
            entity: caps[3].to_string(),
            key_column: split_key_list(&caps[1]).join(", "),
            key_value: split_key_list(&caps[2]).join(", "),
        })
    }
}

/// A header line followed by alternating field-name and message lines:
///
/// ```text
/// 2 validation errors for PersonCreate
/// first_name
///   field required (type=value_error.missing)
/// email_promotion
///   value is not a valid integer (type=type_error.integer)
/// ```
#[derive(Debug, Default)]
pub struct ValidationExtractor;

impl DiagnosticExtractor for ValidationExtractor {
    fn name(&self) -> &'static str {
        "validation"
    }

    fn extract(&self, raw: &str, ctx: &ExtractContext) -> Result<ErrorDetail, UnrecognizedShape> {
        let mut lines = raw.lines().map(str::trim).filter(|l| !l.is_empty());
        let title = lines
            .next()
            .ok_or_else(|| self.mismatch("missing header line"))?
            .to_string();

        let body: Vec<&str> = lines.collect();
        if body.is_empty() || body.len() % 2 != 0 {
            return Err(self.mismatch("expected field and message line pairs"));
        }

        let field_messages: BTreeMap<String, String> = body
            .chunks_exact(2)
            .filter(|pair| !(ctx.defaults_substituted && pair[1].starts_with(FIELD_REQUIRED)))
            .map(|pair| (pair[0].to_string(), pair[1].to_string()))
            .collect();

        Ok(ErrorDetail::Validation {
            title,
            field_messages,
        })
    }
}

/// `... [username] ...`
#[derive(Debug, Default)]
pub struct ReadonlyAccessExtractor;

impl DiagnosticExtractor for ReadonlyAccessExtractor {
    fn name(&self) -> &'static str {
        "readonly_access"
    }

    fn extract(&self, raw: &str, _ctx: &ExtractContext) -> Result<ErrorDetail, UnrecognizedShape> {
        let username = single_username(raw).ok_or_else(|| self.mismatch("expected '[username]'"))?;
        Ok(ErrorDetail::ReadonlyAccess { username })
    }
}

/// `... [username] ...`
#[derive(Debug, Default)]
pub struct WrongPasswordExtractor;

impl DiagnosticExtractor for WrongPasswordExtractor {
    fn name(&self) -> &'static str {
        "wrong_password"
    }

    fn extract(&self, raw: &str, _ctx: &ExtractContext) -> Result<ErrorDetail, UnrecognizedShape> {
        let username = single_username(raw).ok_or_else(|| self.mismatch("expected '[username]'"))?;
        Ok(ErrorDetail::WrongPassword { username })
    }
}

trait Mismatch {
    fn mismatch(&self, reason: &'static str) -> UnrecognizedShape;
}

impl<E: DiagnosticExtractor> Mismatch for E {
    fn mismatch(&self, reason: &'static str) -> UnrecognizedShape {
        UnrecognizedShape {
            extractor: self.name(),
            reason,
        }
    }
}

fn bracketed_tokens(raw: &str) -> impl Iterator<Item = &str> {
    BRACKETED
        .captures_iter(raw)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
}

fn single_username(raw: &str) -> Option<String> {
    bracketed_tokens(raw)
        .next()
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// Split a comma-separated key list, honouring double quotes and removing them.
pub(crate) fn split_key_list(list: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for c in list.chars() {
        match c {
            '"' => quoted = !quoted,
            ',' if !quoted => items.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(c),
        }
    }
    items.push(current.trim().to_string());
    items
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const UNIQUE: &str = "[email_address] [ken0@adventure-works.com] Field 'email_address' \
        must have unique values. Provided value 'ken0@adventure-works.com' already exists.";
    const PRIMARY_KEY: &str = "duplicate key value violates unique constraint \"PK_PersonPhone\"\n\
        DETAIL:  Key (\"BusinessEntityID\", \"PhoneNumber\")=(1, \"000 000 000\") already exists.";
    const FOREIGN_KEY: &str = "insert or update on table \"PersonPhone\" violates foreign key \
        constraint \"FK_PersonPhone_PhoneNumberType\"\n\
        DETAIL:  Key (PhoneNumberTypeID)=(6) is not present in table \"PhoneNumberType\".";
    const VALIDATION: &str = "2 validation errors for PersonCreate\n\
        first_name\n  field required (type=value_error.missing)\n\
        email_promotion\n  value is not a valid integer (type=type_error.integer)";

    fn ctx() -> ExtractContext {
        ExtractContext::default()
    }

    #[test]
    fn unique_constraint() {
        let detail = UniqueConstraintExtractor.extract(UNIQUE, &ctx()).unwrap();
        assert_eq!(
            detail,
            ErrorDetail::UniqueConstraint {
                field: "email_address".to_string(),
                value: "ken0@adventure-works.com".to_string(),
            }
        );
    }

    #[test]
    fn unique_constraint_needs_two_tokens() {
        let err = UniqueConstraintExtractor
            .extract("[email] only one token", &ctx())
            .unwrap_err();
        assert_eq!(err.extractor, "unique_constraint");
    }

    #[test]
    fn unique_constraint_rejects_stray_brackets() {
        for raw in [
            "[email_address] [a]b] Field 'email_address' must have unique values.",
            "[email_address] [a[b] Field 'email_address' must have unique values.",
            "[email_address] [a] [b] Field 'email_address' must have unique values.",
        ] {
            assert!(UniqueConstraintExtractor.extract(raw, &ctx()).is_err(), "{raw}");
        }
    }

    #[test]
    fn unique_constraint_value_with_comma() {
        let raw = "[last_name] [Smith, Jr.] Field 'last_name' must have unique values. \
            Provided value 'Smith, Jr.' already exists.";
        let detail = UniqueConstraintExtractor.extract(raw, &ctx()).unwrap();
        assert_eq!(
            detail,
            ErrorDetail::UniqueConstraint {
                field: "last_name".to_string(),
                value: "Smith, Jr.".to_string(),
            }
        );
    }

    #[test]
    fn primary_key() {
        let detail = PrimaryKeyExtractor.extract(PRIMARY_KEY, &ctx()).unwrap();
        assert_eq!(
            detail,
            ErrorDetail::PrimaryKey {
                key_columns: vec!["BusinessEntityID".to_string(), "PhoneNumber".to_string()],
                key_values: vec!["1".to_string(), "000 000 000".to_string()],
            }
        );
    }

    #[test]
    fn primary_key_single_line_is_unrecognized() {
        assert!(
            PrimaryKeyExtractor
                .extract("duplicate key value violates unique constraint", &ctx())
                .is_err()
        );
    }

    #[test]
    fn primary_key_rejects_foreign_key_text() {
        assert!(PrimaryKeyExtractor.extract(FOREIGN_KEY, &ctx()).is_err());
    }

    #[test]
    fn foreign_key() {
        let detail = ForeignKeyExtractor.extract(FOREIGN_KEY, &ctx()).unwrap();
        assert_eq!(
            detail,
            ErrorDetail::ForeignKey {
                entity: "PhoneNumberType".to_string(),
                key_column: "PhoneNumberTypeID".to_string(),
                key_value: "6".to_string(),
            }
        );
    }

    #[test]
    fn foreign_key_rejects_primary_key_text() {
        assert!(ForeignKeyExtractor.extract(PRIMARY_KEY, &ctx()).is_err());
    }

    #[test]
    fn validation_pairs() {
        let detail = ValidationExtractor.extract(VALIDATION, &ctx()).unwrap();
        let ErrorDetail::Validation {
            title,
            field_messages,
        } = detail
        else {
            panic!("expected validation detail");
        };
        assert_eq!(title, "2 validation errors for PersonCreate");
        assert_eq!(field_messages.len(), 2);
        assert_eq!(
            field_messages["first_name"],
            "field required (type=value_error.missing)"
        );
    }

    #[test]
    fn validation_drops_required_when_defaults_substituted() {
        let ctx = ExtractContext {
            defaults_substituted: true,
        };
        let detail = ValidationExtractor.extract(VALIDATION, &ctx).unwrap();
        let ErrorDetail::Validation { field_messages, .. } = detail else {
            panic!("expected validation detail");
        };
        assert_eq!(field_messages.len(), 1);
        assert!(field_messages.contains_key("email_promotion"));
    }

    #[test]
    fn validation_odd_line_count_is_unrecognized() {
        let raw = "1 validation error for Person\nfirst_name";
        assert!(ValidationExtractor.extract(raw, &ctx()).is_err());
    }

    #[test]
    fn readonly_and_wrong_password() {
        assert_eq!(
            ReadonlyAccessExtractor
                .extract("User [guest] has read-only access", &ctx())
                .unwrap(),
            ErrorDetail::ReadonlyAccess {
                username: "guest".to_string()
            }
        );
        assert_eq!(
            WrongPasswordExtractor
                .extract("Wrong password for user [ken0]", &ctx())
                .unwrap(),
            ErrorDetail::WrongPassword {
                username: "ken0".to_string()
            }
        );
    }

    #[test]
    fn username_required() {
        assert!(
            WrongPasswordExtractor
                .extract("Wrong password", &ctx())
                .is_err()
        );
        assert!(ReadonlyAccessExtractor.extract("User [] denied", &ctx()).is_err());
    }

    #[test]
    fn key_list_honours_quotes() {
        assert_eq!(
            split_key_list(r#"1, "Smith, Jr.""#),
            vec!["1".to_string(), "Smith, Jr.".to_string()]
        );
    }
}
