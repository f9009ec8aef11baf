//! Migration script safety classification.
//!
//! A script is split into statements on `;` after lexing, so comments
//! (`--`, `#`, `/* */`) and string literals never influence the result.
//! Each statement is judged by its leading verb:
//!
//! - DDL: `CREATE`, `ALTER`, `DROP`, `RENAME`, `TRUNCATE`
//! - implicit commit: `GRANT`, `REVOKE`, `LOCK`, `UNLOCK`; these end the
//!   migration transaction like DDL does, so they count as DDL
//! - data: `INSERT`, `UPDATE`, `DELETE`, `REPLACE`, `LOAD`, `CALL`, `MERGE`,
//!   and `WITH ...` statements containing one of the write verbs
//!
//! A `CREATE` or `DROP` is guarded only when `IF [NOT] EXISTS` directly
//! follows the object-type keywords (`DROP TABLE IF EXISTS`), or when it is
//! `CREATE OR REPLACE`. `ALTER`, `RENAME` and `TRUNCATE` are never guarded:
//! `ALTER TABLE IF EXISTS` only covers the table, not the change applied to
//! it. `GRANT`, `LOCK` and `UNLOCK` can be repeated and count as guarded;
//! `REVOKE` fails when the privilege is already gone and does not.

use serde::Serialize;
use sqlparser::dialect::MySqlDialect;
use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::{Token, Tokenizer};
use std::fmt;

/// Safety class of a migration script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptClass {
    /// No DDL, or only guarded DDL
    Safe,
    /// DDL and data manipulation in one script; never safe to run
    MixedDataAndDdl,
    /// DDL without an idempotency guard; unsafe to retry blindly
    NonIdempotentDdl,
}

impl ScriptClass {
    /// Whether the execution policy lets a script of this class run.
    ///
    /// A skip-if condition is accepted as the author taking responsibility
    /// for retrying unguarded DDL.
    pub fn permits(self, has_skip_if: bool) -> bool {
        match self {
            ScriptClass::Safe => true,
            ScriptClass::MixedDataAndDdl => false,
            ScriptClass::NonIdempotentDdl => has_skip_if,
        }
    }

    /// Human-readable reason a script of this class is rejected
    pub fn rejection_reason(self) -> &'static str {
        match self {
            ScriptClass::Safe => "script is safe",
            ScriptClass::MixedDataAndDdl => {
                "Migration combines DDL (Data Definition Language [schema changes]) and data manipulation"
            }
            ScriptClass::NonIdempotentDdl => {
                "Unconditional migration has non-idempotent DDL (Data Definition Language [schema changes])"
            }
        }
    }
}

impl fmt::Display for ScriptClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScriptClass::Safe => "safe",
            ScriptClass::MixedDataAndDdl => "mixed data and DDL",
            ScriptClass::NonIdempotentDdl => "non-idempotent DDL",
        };
        f.write_str(s)
    }
}

/// Per-statement counts behind a classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ScriptAnalysis {
    pub ddl_statements: usize,
    pub unguarded_ddl_statements: usize,
    pub data_statements: usize,
    /// The script could not be lexed; classified conservatively
    pub lex_failed: bool,
}

impl ScriptAnalysis {
    /// Reduce the counts to a class
    pub fn class(&self) -> ScriptClass {
        if self.lex_failed {
            return ScriptClass::NonIdempotentDdl;
        }
        if self.ddl_statements > 0 && self.data_statements > 0 {
            ScriptClass::MixedDataAndDdl
        } else if self.unguarded_ddl_statements > 0 {
            ScriptClass::NonIdempotentDdl
        } else {
            ScriptClass::Safe
        }
    }
}

/// Classify a migration script
pub fn classify(sql: &str) -> ScriptClass {
    analyze(sql).class()
}

/// Count DDL, unguarded DDL, and data statements in a script
pub fn analyze(sql: &str) -> ScriptAnalysis {
    let statements = match lex_statements(sql) {
        Ok(statements) => statements,
        Err(message) => {
            log::debug!("Could not lex migration script, treating as unguarded DDL: {message}");
            return ScriptAnalysis {
                lex_failed: true,
                ..ScriptAnalysis::default()
            };
        }
    };

    let mut analysis = ScriptAnalysis::default();
    for statement in &statements {
        match statement_kind(statement) {
            StatementKind::Ddl { guarded } => {
                analysis.ddl_statements += 1;
                if !guarded {
                    analysis.unguarded_ddl_statements += 1;
                }
            }
            StatementKind::Data => analysis.data_statements += 1,
            StatementKind::Other => {}
        }
    }
    analysis
}

/// Significant token, comments and whitespace already dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lexeme {
    Keyword(Keyword),
    Ident,
    Other,
}

enum StatementKind {
    Ddl { guarded: bool },
    Data,
    Other,
}

const DDL_VERBS: &[Keyword] = &[
    Keyword::CREATE,
    Keyword::ALTER,
    Keyword::DROP,
    Keyword::RENAME,
    Keyword::TRUNCATE,
];

/// Statements that commit implicitly, paired with whether a retry is harmless
const IMPLICIT_COMMIT_VERBS: &[(Keyword, bool)] = &[
    (Keyword::GRANT, true),
    (Keyword::REVOKE, false),
    (Keyword::LOCK, true),
    (Keyword::UNLOCK, true),
];

const DATA_VERBS: &[Keyword] = &[
    Keyword::INSERT,
    Keyword::UPDATE,
    Keyword::DELETE,
    Keyword::REPLACE,
    Keyword::LOAD,
    Keyword::CALL,
    Keyword::MERGE,
];

fn lex_statements(sql: &str) -> Result<Vec<Vec<Lexeme>>, String> {
    let dialect = MySqlDialect {};
    let tokens = Tokenizer::new(&dialect, sql)
        .tokenize()
        .map_err(|e| e.to_string())?;

    let mut statements = Vec::new();
    let mut current = Vec::new();
    for token in tokens {
        match token {
            Token::Whitespace(_) | Token::EOF => {}
            Token::SemiColon => {
                if !current.is_empty() {
                    statements.push(std::mem::take(&mut current));
                }
            }
            Token::Word(word) => {
                if word.quote_style.is_none() && word.keyword != Keyword::NoKeyword {
                    current.push(Lexeme::Keyword(word.keyword));
                } else {
                    current.push(Lexeme::Ident);
                }
            }
            _ => current.push(Lexeme::Other),
        }
    }
    if !current.is_empty() {
        statements.push(current);
    }
    Ok(statements)
}

fn statement_kind(statement: &[Lexeme]) -> StatementKind {
    let Some(Lexeme::Keyword(verb)) = statement.first() else {
        return StatementKind::Other;
    };
    if DDL_VERBS.contains(verb) {
        return StatementKind::Ddl {
            guarded: has_guard(*verb, &statement[1..]),
        };
    }
    if let Some((_, repeatable)) = IMPLICIT_COMMIT_VERBS.iter().find(|(k, _)| k == verb) {
        return StatementKind::Ddl {
            guarded: *repeatable,
        };
    }
    if DATA_VERBS.contains(verb) {
        return StatementKind::Data;
    }
    if *verb == Keyword::WITH
        && statement
            .iter()
            .any(|l| matches!(l, Lexeme::Keyword(k) if DATA_VERBS.contains(k)))
    {
        return StatementKind::Data;
    }
    StatementKind::Other
}

fn has_guard(verb: Keyword, rest: &[Lexeme]) -> bool {
    if verb != Keyword::CREATE && verb != Keyword::DROP {
        return false;
    }
    if verb == Keyword::CREATE
        && rest.starts_with(&[Lexeme::Keyword(Keyword::OR), Lexeme::Keyword(Keyword::REPLACE)])
    {
        return true;
    }
    let start = rest
        .iter()
        .position(|l| !matches!(l, Lexeme::Keyword(k) if *k != Keyword::IF))
        .unwrap_or(rest.len());
    let tail = &rest[start..];
    tail.starts_with(&[
        Lexeme::Keyword(Keyword::IF),
        Lexeme::Keyword(Keyword::NOT),
        Lexeme::Keyword(Keyword::EXISTS),
    ]) || tail.starts_with(&[Lexeme::Keyword(Keyword::IF), Lexeme::Keyword(Keyword::EXISTS)])
}

#[cfg(test)]
#[path = "classifier_test.rs"]
mod tests;
