//! sg-sql - SQL lexing layer for Schemagate
//!
//! This crate classifies migration scripts by how safely they can run on a
//! database whose DDL auto-commits. It lexes with sqlparser-rs (MySQL
//! dialect) rather than parsing, which is enough to drop comments and find
//! each statement's leading verb.

pub mod classifier;

pub use classifier::{analyze, classify, ScriptAnalysis, ScriptClass};
