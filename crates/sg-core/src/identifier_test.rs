use super::*;

#[test]
fn test_accepts_simple_identifiers() {
    assert!(is_simple_identifier("my_schema"));
    assert!(is_simple_identifier("tbl2"));
    assert!(is_simple_identifier("T"));
    assert!(is_simple_identifier("migration_status"));
}

#[test]
fn test_rejects_injection_attempt() {
    assert!(!is_simple_identifier("tbl; DROP TABLE x"));
}

#[test]
fn test_rejects_leading_digit_and_underscore() {
    assert!(!is_simple_identifier("1table"));
    assert!(!is_simple_identifier("_table"));
}

#[test]
fn test_rejects_empty_and_qualified() {
    assert!(!is_simple_identifier(""));
    assert!(!is_simple_identifier("sch.tbl"));
    assert!(!is_simple_identifier("`quoted`"));
}

#[test]
fn test_rejects_non_ascii_letters() {
    assert!(!is_simple_identifier("tablé"));
    assert!(!is_simple_identifier("ｔable"));
}

#[test]
fn test_error_names_role_and_value() {
    let err = validate_identifier("bad-name", IdentifierRole::SchemaOverride).unwrap_err();
    match &err {
        CoreError::InvalidIdentifier { role, value } => {
            assert_eq!(*role, IdentifierRole::SchemaOverride);
            assert_eq!(value, "bad-name");
        }
        other => panic!("expected InvalidIdentifier, got {:?}", other),
    }
    let msg = err.to_string();
    assert!(msg.contains("[C001]"));
    assert!(msg.contains("schema_override"));
    assert!(msg.contains("'bad-name'"));
}

#[test]
fn test_identifier_parse() {
    let ident = Identifier::parse("accounts", IdentifierRole::Table).unwrap();
    assert_eq!(ident.as_str(), "accounts");
    assert_eq!(ident, "accounts");
    assert_eq!(format!("{}", ident), "accounts");
    assert!(Identifier::parse("acc ounts", IdentifierRole::Table).is_err());
}

#[test]
fn test_split_qualified() {
    let (schema, table) = split_qualified("sch.tbl").unwrap();
    assert_eq!(schema.unwrap(), "sch");
    assert_eq!(table, "tbl");

    let (schema, table) = split_qualified("tbl2").unwrap();
    assert!(schema.is_none());
    assert_eq!(table, "tbl2");
}

#[test]
fn test_split_qualified_rejects() {
    let err = split_qualified("sch.tab.extra").unwrap_err();
    assert!(matches!(err, CoreError::InvalidTableName { .. }));
    assert_eq!(
        err.to_string(),
        "[C005] Table name 'sch.tab.extra' is not valid: expected 'table' or 'schema.table'"
    );
    assert!(matches!(
        split_qualified("sch.1tab"),
        Err(CoreError::InvalidIdentifier {
            role: IdentifierRole::Table,
            ..
        })
    ));
}
