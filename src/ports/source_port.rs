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

//! # Source Port
//!
//! This Port defines what it means to "read a database" for a dump. It
//! doesn't care IF the data comes from a live server, a snapshot file, or a
//! mock in a test. Any struct implementing `DumpSourcePort` can drive the
//! orchestrator.

use crate::domain::entities::{TableExportSource, TableInfo};
use crate::domain::errors::Result;

/// `DumpSourcePort` exposes schema and data of the databases to export.
pub trait DumpSourcePort: Send + Sync {
    /// Returns the names of all databases visible to the source.
    fn list_databases(&self) -> Result<Vec<String>>;

    /// Returns all tables and views of one database.
    fn list_tables(&self, db: &str) -> Result<Vec<TableInfo>>;

    /// Returns the `CREATE DATABASE` statement for `db`.
    fn show_create_database(&self, db: &str) -> Result<String>;

    /// Returns the `CREATE TABLE` statement for `db.table`.
    fn show_create_table(&self, db: &str, table: &str) -> Result<String>;

    /// Returns the base-table script and the view-definition script of a view.
    fn show_create_view(&self, db: &str, view: &str) -> Result<(String, String)>;

    /// Returns a single-pass row stream for one table.
    fn table_data(&self, db: &str, table: &str) -> Result<TableExportSource>;

    /// Returns the `SHOW GRANTS` output for the current user.
    fn show_grants(&self) -> Result<Vec<String>>;
}
