//! Schema introspection through `information_schema`
//!
//! Unguarded DDL is only accepted when a migration declares a skip-if
//! condition. These helpers are what such conditions are usually built
//! from, e.g. skipping `CREATE INDEX` once the index exists.

use crate::error::{MigrateError, MigrateResult};
use sg_core::{split_qualified, Identifier};
use sg_db::value::{get_i64, get_opt_string};
use sg_db::{Database, Row, SqlValue};
use std::sync::Arc;

/// Answers questions about the current schema
#[derive(Clone)]
pub struct Introspector {
    db: Arc<dyn Database>,
    default_schema: Option<Identifier>,
}

/// A table argument resolved to query parameters
struct TableRef {
    target: String,
    schema: SqlValue,
    table: SqlValue,
}

impl Introspector {
    /// Unqualified tables resolve against `default_schema`, else `DATABASE()`
    pub fn new(db: Arc<dyn Database>, default_schema: Option<Identifier>) -> Self {
        Self { db, default_schema }
    }

    fn resolve(&self, table: &str) -> MigrateResult<TableRef> {
        let (schema, name) = split_qualified(table)?;
        let schema = schema.or_else(|| self.default_schema.clone());
        Ok(TableRef {
            target: table.to_string(),
            schema: SqlValue::from(schema.map(|s| s.to_string())),
            table: SqlValue::from(name.to_string()),
        })
    }

    async fn rows(&self, target: &str, sql: &str, params: &[SqlValue]) -> MigrateResult<Vec<Row>> {
        self.db
            .query(sql, params)
            .await
            .map_err(|source| MigrateError::Introspection {
                target: target.to_string(),
                source,
            })
    }

    async fn count(&self, target: &str, sql: &str, params: &[SqlValue]) -> MigrateResult<i64> {
        let rows = self.rows(target, sql, params).await?;
        match rows.first() {
            Some(row) => get_i64(row, 0).map_err(|source| MigrateError::Introspection {
                target: target.to_string(),
                source,
            }),
            None => Ok(0),
        }
    }

    async fn opt_string(
        &self,
        target: &str,
        sql: &str,
        params: &[SqlValue],
    ) -> MigrateResult<Option<String>> {
        let rows = self.rows(target, sql, params).await?;
        match rows.first() {
            Some(row) => get_opt_string(row, 0).map_err(|source| MigrateError::Introspection {
                target: target.to_string(),
                source,
            }),
            None => Ok(None),
        }
    }

    /// Name of the connection's current database, if one is selected
    pub async fn database_name(&self) -> MigrateResult<Option<String>> {
        self.opt_string("DATABASE()", "SELECT DATABASE()", &[]).await
    }

    pub async fn table_exists(&self, table: &str) -> MigrateResult<bool> {
        let t = self.resolve(table)?;
        let sql = "SELECT COUNT(*) FROM information_schema.tables \
                   WHERE table_schema = COALESCE(?, DATABASE()) AND table_name = ?";
        Ok(self.count(&t.target, sql, &[t.schema, t.table]).await? > 0)
    }

    pub async fn has_primary_key(&self, table: &str) -> MigrateResult<bool> {
        let t = self.resolve(table)?;
        let sql = "SELECT COUNT(*) FROM information_schema.table_constraints \
                   WHERE table_schema = COALESCE(?, DATABASE()) AND table_name = ? \
                   AND constraint_type = 'PRIMARY KEY'";
        Ok(self.count(&t.target, sql, &[t.schema, t.table]).await? > 0)
    }

    pub async fn table_has_index(&self, table: &str, index: &str) -> MigrateResult<bool> {
        let t = self.resolve(table)?;
        let sql = "SELECT COUNT(*) FROM information_schema.statistics \
                   WHERE table_schema = COALESCE(?, DATABASE()) AND table_name = ? \
                   AND index_name = ?";
        let params = [t.schema, t.table, SqlValue::from(index)];
        Ok(self.count(&t.target, sql, &params).await? > 0)
    }

    pub async fn does_column_exist(&self, table: &str, column: &str) -> MigrateResult<bool> {
        let t = self.resolve(table)?;
        let sql = "SELECT COUNT(*) FROM information_schema.columns \
                   WHERE table_schema = COALESCE(?, DATABASE()) AND table_name = ? \
                   AND column_name = ?";
        let params = [t.schema, t.table, SqlValue::from(column)];
        Ok(self.count(&t.target, sql, &params).await? > 0)
    }

    /// Default expression of a column; `None` for a missing column or no default
    pub async fn column_default(&self, table: &str, column: &str) -> MigrateResult<Option<String>> {
        let t = self.resolve(table)?;
        let sql = "SELECT column_default FROM information_schema.columns \
                   WHERE table_schema = COALESCE(?, DATABASE()) AND table_name = ? \
                   AND column_name = ?";
        let params = [t.schema, t.table, SqlValue::from(column)];
        self.opt_string(&t.target, sql, &params).await
    }

    /// Type of a named constraint (`PRIMARY KEY`, `UNIQUE`, `FOREIGN KEY`, `CHECK`)
    pub async fn get_table_constraint(
        &self,
        table: &str,
        constraint: &str,
    ) -> MigrateResult<Option<String>> {
        let t = self.resolve(table)?;
        let sql = "SELECT constraint_type FROM information_schema.table_constraints \
                   WHERE table_schema = COALESCE(?, DATABASE()) AND table_name = ? \
                   AND constraint_name = ?";
        let params = [t.schema, t.table, SqlValue::from(constraint)];
        self.opt_string(&t.target, sql, &params).await
    }

    pub async fn column_is_in_primary_key(&self, table: &str, column: &str) -> MigrateResult<bool> {
        let t = self.resolve(table)?;
        let sql = "SELECT COUNT(*) FROM information_schema.key_column_usage \
                   WHERE table_schema = COALESCE(?, DATABASE()) AND table_name = ? \
                   AND constraint_name = 'PRIMARY' AND column_name = ?";
        let params = [t.schema, t.table, SqlValue::from(column)];
        Ok(self.count(&t.target, sql, &params).await? > 0)
    }
}

#[cfg(test)]
#[path = "introspect_test.rs"]
mod tests;
