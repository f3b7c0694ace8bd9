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

//! Infrastructure adapter reading databases from a snapshot file.
//!
//! A snapshot is a YAML (or JSON) document listing databases, their tables
//! with column types and rows, and their views. It lets the exporter run
//! against captured data without a live server connection.

use crate::domain::entities::{ColumnSpec, Row, TableExportSource, TableInfo, TableKind, Value};
use crate::domain::errors::{ExportError, Result};
use crate::domain::row_renderer::wrap_backticks;
use crate::ports::source_port::DumpSourcePort;
use log::{debug, info};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct Snapshot {
    #[serde(default)]
    grants: Vec<String>,
    databases: Vec<SnapshotDatabase>,
}

#[derive(Debug, Deserialize)]
struct SnapshotDatabase {
    name: String,
    create_sql: Option<String>,
    #[serde(default)]
    tables: Vec<Arc<SnapshotTable>>,
    #[serde(default)]
    views: Vec<SnapshotView>,
}

#[derive(Debug, Deserialize)]
struct SnapshotColumn {
    name: String,
    #[serde(rename = "type")]
    type_name: String,
}

#[derive(Debug, Deserialize)]
struct SnapshotTable {
    name: String,
    create_sql: Option<String>,
    header_lines: Option<Vec<String>>,
    columns: Vec<SnapshotColumn>,
    #[serde(default)]
    rows: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct SnapshotView {
    name: String,
    create_table_sql: String,
    create_view_sql: String,
}

/// Concrete implementation of `DumpSourcePort` backed by a snapshot file.
pub struct SnapshotSourceAdapter {
    snapshot: Snapshot,
    /// Header lines for tables that do not define their own.
    data_header_lines: Vec<String>,
}

impl SnapshotSourceAdapter {
    /// Loads a snapshot; `.json` files are read as JSON, everything else as YAML.
    pub fn from_file(path: impl AsRef<Path>, data_header_lines: Vec<String>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let snapshot: Snapshot = if path.extension().is_some_and(|e| e == "json") {
            serde_json::from_str(&contents)?
        } else {
            serde_yaml::from_str(&contents)?
        };

        info!(
            "Loaded snapshot {} with {} databases",
            path.display(),
            snapshot.databases.len()
        );
        Ok(Self {
            snapshot,
            data_header_lines,
        })
    }

    /// Parses a YAML snapshot held in memory.
    pub fn from_yaml(yaml: &str, data_header_lines: Vec<String>) -> Result<Self> {
        Ok(Self {
            snapshot: serde_yaml::from_str(yaml)?,
            data_header_lines,
        })
    }

    fn database(&self, db: &str) -> Result<&SnapshotDatabase> {
        self.snapshot
            .databases
            .iter()
            .find(|d| d.name == db)
            .ok_or_else(|| ExportError::MetadataError(format!("database `{}` not found", db)))
    }

    fn table(&self, db: &str, table: &str) -> Result<&Arc<SnapshotTable>> {
        self.database(db)?
            .tables
            .iter()
            .find(|t| t.name == table)
            .ok_or_else(|| {
                ExportError::MetadataError(format!("table `{}`.`{}` not found", db, table))
            })
    }
}

impl DumpSourcePort for SnapshotSourceAdapter {
    fn list_databases(&self) -> Result<Vec<String>> {
        Ok(self.snapshot.databases.iter().map(|d| d.name.clone()).collect())
    }

    fn list_tables(&self, db: &str) -> Result<Vec<TableInfo>> {
        let database = self.database(db)?;
        let tables = database.tables.iter().map(|t| TableInfo {
            name: t.name.clone(),
            kind: TableKind::Table,
        });
        let views = database.views.iter().map(|v| TableInfo {
            name: v.name.clone(),
            kind: TableKind::View,
        });
        Ok(tables.chain(views).collect())
    }

    fn show_create_database(&self, db: &str) -> Result<String> {
        let database = self.database(db)?;
        Ok(database
            .create_sql
            .clone()
            .unwrap_or_else(|| format!("CREATE DATABASE IF NOT EXISTS {}", wrap_backticks(db))))
    }

    fn show_create_table(&self, db: &str, table: &str) -> Result<String> {
        let t = self.table(db, table)?;
        Ok(t.create_sql.clone().unwrap_or_else(|| synthesize_create_table(t)))
    }

    fn show_create_view(&self, db: &str, view: &str) -> Result<(String, String)> {
        let v = self
            .database(db)?
            .views
            .iter()
            .find(|v| v.name == view)
            .ok_or_else(|| {
                ExportError::MetadataError(format!("view `{}`.`{}` not found", db, view))
            })?;
        Ok((v.create_table_sql.clone(), v.create_view_sql.clone()))
    }

    fn table_data(&self, db: &str, table: &str) -> Result<TableExportSource> {
        let t = Arc::clone(self.table(db, table)?);
        let columns = t
            .columns
            .iter()
            .map(|c| ColumnSpec::new(c.name.clone(), c.type_name.clone()))
            .collect();
        let header_lines = t
            .header_lines
            .clone()
            .unwrap_or_else(|| self.data_header_lines.clone());

        debug!("Streaming {} rows of `{}`.`{}`", t.rows.len(), db, table);
        let row_count = t.rows.len();
        let rows = (0..row_count).map(move |i| Ok(to_row(&t.rows[i])));
        Ok(TableExportSource::new(db, table, columns, header_lines, rows))
    }

    fn show_grants(&self) -> Result<Vec<String>> {
        Ok(self.snapshot.grants.clone())
    }
}

fn to_row(values: &[serde_json::Value]) -> Row {
    values.iter().map(to_value).collect()
}

fn to_value(v: &serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => None,
        serde_json::Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn synthesize_create_table(t: &SnapshotTable) -> String {
    let cols: Vec<String> = t
        .columns
        .iter()
        .map(|c| format!("  {} {}", wrap_backticks(&c.name), c.type_name))
        .collect();
    format!(
        "CREATE TABLE {} (\n{}\n)",
        wrap_backticks(&t.name),
        cols.join(",\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::QuotingClass;
    use std::io::Write;

    const SNAPSHOT: &str = r#"
grants:
  - "GRANT ALL PRIVILEGES ON *.* TO 'root'@'%'"
databases:
  - name: shop
    tables:
      - name: customers
        columns:
          - { name: id, type: "INT(11)" }
          - { name: email, type: "VARCHAR(255)" }
          - { name: vip, type: "BOOLEAN" }
        rows:
          - [1, "a@example.com", true]
          - [2, null, false]
      - name: notes
        create_sql: "CREATE TABLE `notes` (`body` TEXT)"
        header_lines: ["-- notes"]
        columns:
          - { name: body, type: TEXT }
    views:
      - name: vip_customers
        create_table_sql: "CREATE TABLE `vip_customers`(`id` int);"
        create_view_sql: "CREATE VIEW `vip_customers` AS SELECT id FROM customers;"
"#;

    fn adapter() -> SnapshotSourceAdapter {
        SnapshotSourceAdapter::from_yaml(SNAPSHOT, vec!["-- default".to_string()]).unwrap()
    }

    #[test]
    fn test_lists_tables_and_views() {
        let a = adapter();
        assert_eq!(a.list_databases().unwrap(), vec!["shop"]);
        let tables = a.list_tables("shop").unwrap();
        assert_eq!(tables.len(), 3);
        assert_eq!(tables[2].kind, TableKind::View);
        assert!(a.list_tables("missing").is_err());
    }

    #[test]
    fn test_table_data_converts_values() {
        let a = adapter();
        let source = a.table_data("shop", "customers").unwrap();
        assert_eq!(source.header_lines, vec!["-- default"]);
        assert_eq!(source.columns[0].quoting, QuotingClass::Numeric);
        assert_eq!(source.columns[1].quoting, QuotingClass::Quoted);

        let rows: Vec<Row> = source.rows.map(|r| r.unwrap()).collect();
        assert_eq!(
            rows[0],
            vec![Some("1".to_string()), Some("a@example.com".to_string()), Some("1".to_string())]
        );
        assert_eq!(rows[1], vec![Some("2".to_string()), None, Some("0".to_string())]);
    }

    #[test]
    fn test_create_statements() {
        let a = adapter();
        assert_eq!(
            a.show_create_database("shop").unwrap(),
            "CREATE DATABASE IF NOT EXISTS `shop`"
        );
        assert_eq!(
            a.show_create_table("shop", "customers").unwrap(),
            "CREATE TABLE `customers` (\n  `id` INT(11),\n  `email` VARCHAR(255),\n  `vip` BOOLEAN\n)"
        );
        assert_eq!(
            a.show_create_table("shop", "notes").unwrap(),
            "CREATE TABLE `notes` (`body` TEXT)"
        );
        let (table_sql, view_sql) = a.show_create_view("shop", "vip_customers").unwrap();
        assert!(table_sql.starts_with("CREATE TABLE"));
        assert!(view_sql.starts_with("CREATE VIEW"));
    }

    #[test]
    fn test_table_header_override() {
        let a = adapter();
        let source = a.table_data("shop", "notes").unwrap();
        assert_eq!(source.header_lines, vec!["-- notes"]);
        assert_eq!(source.rows.count(), 0);
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"databases":[{{"name":"d","tables":[{{"name":"t","columns":[{{"name":"a","type":"INT"}}],"rows":[[1],[2]]}}]}}]}}"#
        )
        .unwrap();

        let a = SnapshotSourceAdapter::from_file(file.path(), vec![]).unwrap();
        assert_eq!(a.table_data("d", "t").unwrap().rows.count(), 2);
        assert!(a.show_grants().unwrap().is_empty());
    }
}
