//! Quarry test utilities.
//!
//! Fixtures shared by integration tests: a small entity catalog, sample
//! rows, and the diagnostic texts the classifier is expected to understand.

use serde_json::{Value as JsonValue, json};

/// A two-entity catalog with exact and phrase filters over several column
/// types, and one column type that cannot be ordered.
pub const WIDGET_CATALOG_YAML: &str = r#"
entities:
  - name: widget
    schema: inventory
    table: Widget
    filters:
      - name: color
        column: Color
        data_type: text
      - name: widget_ids
        column: WidgetID
        data_type: integer
      - name: name_phrase
        column: Name
        data_type: text
        match_kind: phrase
      - name: weight
        column: Weight
        data_type: numeric
      - name: in_stock
        column: InStock
        data_type: boolean
      - name: released
        column: ReleasedOn
        data_type: date
    ordering:
      - name: widget_id
        column: WidgetID
        data_type: integer
      - name: name
        column: Name
        data_type: text
      - name: spec_sheet
        column: SpecSheet
        data_type: xml
  - name: bin
    table: Bin
    filters:
      - name: aisle
        column: Aisle
        data_type: text
    ordering:
      - name: aisle
        column: Aisle
        data_type: text
"#;

/// Rows shaped like `row_to_json` output for the built-in `person` entity.
pub fn person_rows(count: usize) -> Vec<JsonValue> {
    (1..=count)
        .map(|id| {
            json!({
                "BusinessEntityID": id,
                "PersonType": "SC",
                "FirstName": format!("Test{id}"),
                "LastName": "Smith",
            })
        })
        .collect()
}

/// Diagnostic texts as the backend and the API's own checks emit them,
/// without routing codes.
pub mod diagnostics {
    pub const UNIQUE: &str = "[email_address] [ken0@adventure-works.com] Field 'email_address' \
        must have unique values. Provided value 'ken0@adventure-works.com' already exists.";

    pub const PRIMARY_KEY: &str = "duplicate key value violates unique constraint \"PK_PersonPhone\"\n\
        DETAIL:  Key (\"BusinessEntityID\", \"PhoneNumber\")=(1, \"000 000 000\") already exists.";

    pub const FOREIGN_KEY: &str = "insert or update on table \"PersonPhone\" violates foreign key \
        constraint \"FK_PersonPhone_PhoneNumberType\"\n\
        DETAIL:  Key (PhoneNumberTypeID)=(6) is not present in table \"PhoneNumberType\".";

    pub const VALIDATION: &str = "2 validation errors for PersonCreate\n\
        first_name\n  field required (type=value_error.missing)\n\
        email_promotion\n  value is not a valid integer (type=type_error.integer)";

    pub const READONLY: &str = "User [guest] has read-only access";

    pub const WRONG_PASSWORD: &str = "Wrong password for user [ken0]";
}
