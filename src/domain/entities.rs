// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Domain Entities
//!
//! Entities are the "Nouns" of our application: columns, rows, the per-table
//! export source handed to the writer, and the per-table results reported
//! back to the orchestrator.
//!
//! We use the `serde` crate (Serialize/Deserialize) so column specs and
//! results can be read from snapshots and written into the run report.

use crate::domain::errors::Result;
use crate::domain::mapping::quoting_class_for;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single nullable column value, already formatted as text by the source.
pub type Value = Option<String>;

/// One record: one `Value` per column, in column order.
pub type Row = Vec<Value>;

/// How a column's values are written as SQL literals.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuotingClass {
    /// Written as-is, without quotes (integers, decimals, floats, booleans).
    Numeric,
    /// Wrapped in single quotes and escaped (text, set, enum, dates, binary-as-text).
    Quoted,
}

/// `ColumnSpec` is everything the writer needs to know about one column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnSpec {
    /// The name of the column (e.g., "email").
    pub name: String,
    /// The database type name (e.g., "VARCHAR(255)").
    pub type_name: String,
    pub quoting: QuotingClass,
}

impl ColumnSpec {
    /// Builds a column spec, deriving the quoting class from the type name.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self {
            name: name.into(),
            quoting: quoting_class_for(&type_name),
            type_name,
        }
    }
}

/// Kind of a relation reported by the source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Table,
    View,
}

/// A table or view listed by the source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableInfo {
    pub name: String,
    pub kind: TableKind,
}

/// Which single-shot metadata script is being written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaKind {
    /// `CREATE DATABASE` script.
    Database,
    /// `CREATE TABLE` script, also used for the base table of a view.
    Table,
    /// `CREATE VIEW` script.
    View,
}

impl fmt::Display for MetaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaKind::Database => write!(f, "database"),
            MetaKind::Table => write!(f, "table"),
            MetaKind::View => write!(f, "view"),
        }
    }
}

/// The data of one table, ready to be streamed by the chunked data writer.
///
/// `rows` is single-pass: the writer pulls it exactly once until it returns
/// `None` (end of data) or an `Err` (fetch failure or cancellation).
pub struct TableExportSource {
    pub database: String,
    pub table: String,
    pub columns: Vec<ColumnSpec>,
    /// Verbatim lines written at the top of every data artifact.
    pub header_lines: Vec<String>,
    pub rows: Box<dyn Iterator<Item = Result<Row>> + Send>,
}

impl TableExportSource {
    pub fn new<I>(
        database: impl Into<String>,
        table: impl Into<String>,
        columns: Vec<ColumnSpec>,
        header_lines: Vec<String>,
        rows: I,
    ) -> Self
    where
        I: Iterator<Item = Result<Row>> + Send + 'static,
    {
        Self {
            database: database.into(),
            table: table.into(),
            columns,
            header_lines,
            rows: Box::new(rows),
        }
    }

    /// Human-readable identity used in logs and error messages.
    pub fn identity(&self) -> String {
        format!("`{}`.`{}`", self.database, self.table)
    }
}

impl fmt::Debug for TableExportSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableExportSource")
            .field("database", &self.database)
            .field("table", &self.table)
            .field("columns", &self.columns)
            .field("header_lines", &self.header_lines)
            .finish_non_exhaustive()
    }
}

/// Counters produced by one run of the chunked data writer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableWriteStats {
    pub rows: u64,
    pub bytes: u64,
    pub statements: u64,
    /// Names of the artifacts handed to the sink, in index order.
    pub artifacts: Vec<String>,
}

/// `TaskResult` is the "Report Card" for one exported table or view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub database: String,
    pub table: String,
    /// How many rows were actually exported.
    pub rows: u64,
    /// How many bytes of data artifacts were written.
    pub bytes: u64,
    /// How many data artifacts were written.
    pub artifacts: usize,
    /// How long it took (in seconds).
    pub duration: f64,
    /// Either "SUCCESS" or "FAILED".
    pub status: String,
    /// If it failed, this contains the reason why.
    pub error: Option<String>,
}

impl TaskResult {
    /// Helper to create a successful result.
    pub fn success(database: String, table: String, stats: &TableWriteStats, duration: f64) -> Self {
        Self {
            database,
            table,
            rows: stats.rows,
            bytes: stats.bytes,
            artifacts: stats.artifacts.len(),
            duration,
            status: "SUCCESS".to_string(),
            error: None,
        }
    }

    /// Helper to create a failure result.
    pub fn failure(database: String, table: String, error: String) -> Self {
        Self {
            database,
            table,
            rows: 0,
            bytes: 0,
            artifacts: 0,
            duration: 0.0,
            status: "FAILED".to_string(),
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "SUCCESS"
    }
}
