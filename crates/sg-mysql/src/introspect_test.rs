use super::*;
use crate::error::ErrorKind;
use crate::test_utils::MemoryDatabase;
use sg_core::IdentifierRole;

fn introspector(db: &MemoryDatabase, default_schema: Option<&str>) -> Introspector {
    Introspector::new(
        Arc::new(db.clone()),
        default_schema.map(|s| Identifier::parse(s, IdentifierRole::SchemaOverride).unwrap()),
    )
}

#[tokio::test]
async fn test_table_exists_binds_schema_and_table() {
    let db = MemoryDatabase::new();
    db.stub_query("information_schema.tables", vec![vec![SqlValue::Int(1)]]);

    assert!(introspector(&db, None).table_exists("app.users").await.unwrap());

    let (sql, params) = db.queries().remove(0);
    assert!(sql.contains("COALESCE(?, DATABASE())"));
    assert_eq!(params, vec![SqlValue::from("app"), SqlValue::from("users")]);
}

#[tokio::test]
async fn test_unqualified_table_uses_default_schema() {
    let db = MemoryDatabase::new();
    introspector(&db, Some("tenant")).table_exists("users").await.unwrap();
    introspector(&db, None).table_exists("users").await.unwrap();

    let queries = db.queries();
    assert_eq!(queries[0].1[0], SqlValue::from("tenant"));
    assert_eq!(queries[1].1[0], SqlValue::Null);
}

#[tokio::test]
async fn test_missing_rows_mean_absent() {
    let db = MemoryDatabase::new();
    let i = introspector(&db, None);
    assert!(!i.table_exists("users").await.unwrap());
    assert!(!i.has_primary_key("users").await.unwrap());
    assert!(!i.table_has_index("users", "idx_email").await.unwrap());
    assert!(!i.does_column_exist("users", "email").await.unwrap());
    assert!(!i.column_is_in_primary_key("users", "id").await.unwrap());
    assert_eq!(i.column_default("users", "email").await.unwrap(), None);
    assert_eq!(i.get_table_constraint("users", "fk_org").await.unwrap(), None);
}

#[tokio::test]
async fn test_index_and_constraint_lookups() {
    let db = MemoryDatabase::new();
    db.stub_query("information_schema.statistics", vec![vec![SqlValue::Int(2)]]);
    db.stub_query(
        "SELECT constraint_type",
        vec![vec![SqlValue::from("FOREIGN KEY")]],
    );
    db.stub_query("SELECT column_default", vec![vec![SqlValue::Null]]);
    let i = introspector(&db, None);

    assert!(i.table_has_index("users", "idx_email").await.unwrap());
    assert_eq!(
        i.get_table_constraint("users", "fk_org").await.unwrap().as_deref(),
        Some("FOREIGN KEY")
    );
    assert_eq!(i.column_default("users", "email").await.unwrap(), None);

    let statistics = &db.queries()[0];
    assert_eq!(statistics.1[2], SqlValue::from("idx_email"));
}

#[tokio::test]
async fn test_rejects_unsafe_table_names() {
    let db = MemoryDatabase::new();
    let i = introspector(&db, None);

    let err = i.table_exists("users; DROP TABLE x").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    let err = i.table_exists("a.b.c").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(db.queries().is_empty());
}

#[tokio::test]
async fn test_query_failure_is_introspection_error() {
    let db = MemoryDatabase::new();
    db.fail_statements_containing("information_schema", "access denied");

    let err = introspector(&db, None)
        .has_primary_key("users")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Introspection);
    assert!(err.to_string().contains("users"));
}

#[tokio::test]
async fn test_database_name() {
    let db = MemoryDatabase::new();
    db.stub_query("SELECT DATABASE()", vec![vec![SqlValue::from("app")]]);
    assert_eq!(
        introspector(&db, None).database_name().await.unwrap().as_deref(),
        Some("app")
    );
}
