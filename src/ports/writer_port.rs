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

//! # Writer Port
//!
//! The contract the dump orchestrator uses to turn database objects into
//! artifacts. Both the single-shot metadata scripts and the chunked table
//! data go through it.

use crate::domain::entities::{TableExportSource, TableWriteStats};
use crate::domain::errors::Result;

/// `WriterPort` writes one kind of dump output per call.
pub trait WriterPort: Send + Sync {
    /// Writes the `CREATE DATABASE` script for `db`.
    fn write_database_meta(&self, db: &str, create_sql: &str) -> Result<()>;

    /// Writes the `CREATE TABLE` script for `db.table`.
    fn write_table_meta(&self, db: &str, table: &str, create_sql: &str) -> Result<()>;

    /// Writes the two scripts of a view: its base-table stand-in and its
    /// actual definition.
    fn write_view_meta(
        &self,
        db: &str,
        view: &str,
        create_table_sql: &str,
        create_view_sql: &str,
    ) -> Result<()>;

    /// Streams the rows of one table into size-bounded data artifacts.
    fn write_table_data(&self, source: TableExportSource) -> Result<TableWriteStats>;
}
