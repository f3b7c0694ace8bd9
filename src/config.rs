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

//! Configuration loading, CLI overrides and validation.
//!
//! Settings come from a YAML or JSON file, are overridden by command-line
//! flags, and are validated once before anything is written. The validated
//! result is turned into the immutable `WriteConfig` shared by all writers.

use crate::application::write_config::{WriteConfig, DEFAULT_META_HEADER};
use crate::domain::errors::{ExportError, Result};
use crate::domain::naming::{OutputFileTemplate, TemplateField, DEFAULT_DATA_TEMPLATE};
use crate::ports::sink_port::SinkPort;
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::sync::Arc;

/// Header lines written at the top of every data artifact by default.
pub const DEFAULT_DATA_HEADERS: &[&str] = &[
    "/*!40101 SET NAMES binary*/;",
    "/*!40014 SET FOREIGN_KEY_CHECKS=0*/;",
];

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub source: SourceConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SourceConfig {
    /// Snapshot file read by the bundled source adapter.
    pub snapshot: Option<String>,
}

/// A byte count given either as a plain integer or as text like `256MiB`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum SizeSetting {
    Bytes(u64),
    Text(String),
}

impl SizeSetting {
    pub fn to_bytes(&self) -> Result<u64> {
        match self {
            SizeSetting::Bytes(b) => Ok(*b),
            SizeSetting::Text(s) => parse_byte_size(s),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ExportConfig {
    pub output_dir: String,
    pub file_size: Option<SizeSetting>,
    pub statement_size: Option<SizeSetting>,
    pub output_filename_template: Option<String>,
    pub threads: Option<usize>,
    pub cpu_percent: Option<u8>,
    pub escape_backslash: Option<bool>,
    pub complete_insert: Option<bool>,
    pub no_schemas: Option<bool>,
    pub no_data: Option<bool>,
    pub no_views: Option<bool>,
    pub databases: Option<Vec<String>>,
    pub tables: Option<Vec<String>>,
    pub exclude_tables: Option<Vec<String>>,
    pub check_privileges: Option<bool>,
    pub data_header_lines: Option<Vec<String>>,
    pub meta_header_lines: Option<Vec<String>>,
}

#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file (YAML or JSON)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Snapshot file to dump
    #[arg(long)]
    pub snapshot: Option<String>,

    #[arg(short, long)]
    pub output: Option<String>,

    /// Maximum size of one data file, e.g. 256MiB (0 = unbounded)
    #[arg(short = 'F', long)]
    pub filesize: Option<String>,

    /// Maximum size of one INSERT statement, e.g. 1MiB (0 = unbounded)
    #[arg(short = 's', long)]
    pub statement_size: Option<String>,

    /// Data file name template, e.g. '{{fn .DB}}.{{fn .Table}}.{{.Index}}'
    #[arg(long)]
    pub output_filename_template: Option<String>,

    #[arg(short, long)]
    pub threads: Option<usize>,

    #[arg(long)]
    pub cpu_percent: Option<u8>,

    /// Only dump these databases (repeatable)
    #[arg(short = 'B', long = "database")]
    pub databases: Vec<String>,

    /// Only dump these tables, `db.table` or `table` (repeatable)
    #[arg(short = 'T', long = "table")]
    pub tables: Vec<String>,

    #[arg(long)]
    pub complete_insert: bool,

    #[arg(long)]
    pub no_schemas: bool,

    #[arg(long)]
    pub no_data: bool,

    #[arg(long)]
    pub no_views: bool,

    #[arg(long)]
    pub check_privileges: bool,
}

impl AppConfig {
    /// Reads a config file; `.json` is parsed as JSON, everything else as YAML.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig = if path.ends_with(".json") {
            serde_json::from_str(&contents)?
        } else {
            serde_yaml::from_str(&contents)?
        };
        Ok(config)
    }

    /// Builds a config from command-line flags alone.
    pub fn default_from_cli(args: &CliArgs) -> Self {
        let mut config = Self::default();
        config.export.output_dir = ".".to_string();
        config.merge_cli(args);
        config
    }

    pub fn merge_cli(&mut self, args: &CliArgs) {
        if let Some(s) = &args.snapshot {
            self.source.snapshot = Some(s.clone());
        }
        if let Some(o) = &args.output {
            self.export.output_dir = o.clone();
        }
        if let Some(f) = &args.filesize {
            self.export.file_size = Some(SizeSetting::Text(f.clone()));
        }
        if let Some(s) = &args.statement_size {
            self.export.statement_size = Some(SizeSetting::Text(s.clone()));
        }
        if let Some(t) = &args.output_filename_template {
            self.export.output_filename_template = Some(t.clone());
        }
        if let Some(t) = args.threads {
            self.export.threads = Some(t);
        }
        if let Some(p) = args.cpu_percent {
            self.export.cpu_percent = Some(p);
        }
        if !args.databases.is_empty() {
            self.export.databases = Some(args.databases.clone());
        }
        if !args.tables.is_empty() {
            self.export.tables = Some(args.tables.clone());
        }
        if args.complete_insert {
            self.export.complete_insert = Some(true);
        }
        if args.no_schemas {
            self.export.no_schemas = Some(true);
        }
        if args.no_data {
            self.export.no_data = Some(true);
        }
        if args.no_views {
            self.export.no_views = Some(true);
        }
        if args.check_privileges {
            self.export.check_privileges = Some(true);
        }
    }

    /// Checks everything that can be checked before the run starts.
    pub fn validate(&self) -> Result<()> {
        if self.export.output_dir.trim().is_empty() {
            return Err(ExportError::ConfigError("export.output_dir is empty".into()));
        }
        if self.source.snapshot.is_none() {
            return Err(ExportError::ConfigError(
                "source.snapshot is required (or pass --snapshot)".into(),
            ));
        }

        let template = self.template()?;
        if self.file_size_limit()?.is_some() && !template.references(TemplateField::Index) {
            return Err(ExportError::ConfigError(format!(
                "output file template '{}' must contain {{{{.Index}}}} when a file size limit is set",
                template.as_str()
            )));
        }
        self.statement_size_limit()?;

        // Tables are written in parallel; their data artifacts stay apart
        // only through the fields the template resolves.
        let scopes = [
            (TemplateField::Table, "{{.Table}}", "table", self.selects_single_table()),
            (TemplateField::Db, "{{.DB}}", "database", self.selects_single_database()),
        ];
        for (field, action, scope, single) in scopes {
            if !single && !template.references(field) {
                return Err(ExportError::ConfigError(format!(
                    "output file template '{}' must contain {} unless a single {} is selected",
                    template.as_str(),
                    action,
                    scope
                )));
            }
        }

        if let Some(p) = self.export.cpu_percent {
            if p == 0 || p > 100 {
                return Err(ExportError::ConfigError(format!(
                    "cpu_percent must be between 1 and 100, got {}",
                    p
                )));
            }
        }
        if self.export.threads == Some(0) {
            return Err(ExportError::ConfigError("threads must be at least 1".into()));
        }
        Ok(())
    }

    /// The parsed data artifact template.
    pub fn template(&self) -> Result<OutputFileTemplate> {
        let text = self
            .export
            .output_filename_template
            .as_deref()
            .unwrap_or(DEFAULT_DATA_TEMPLATE);
        OutputFileTemplate::parse(text)
    }

    pub fn file_size_limit(&self) -> Result<Option<u64>> {
        limit_from(self.export.file_size.as_ref())
    }

    pub fn statement_size_limit(&self) -> Result<Option<u64>> {
        limit_from(self.export.statement_size.as_ref())
    }

    pub fn data_header_lines(&self) -> Vec<String> {
        self.export
            .data_header_lines
            .clone()
            .unwrap_or_else(|| DEFAULT_DATA_HEADERS.iter().map(|s| s.to_string()).collect())
    }

    /// Databases to dump; `None` means all of them.
    pub fn get_databases(&self) -> Option<Vec<String>> {
        self.export.databases.clone().filter(|d| !d.is_empty())
    }

    fn selects_single_table(&self) -> bool {
        matches!(&self.export.tables, Some(tables) if tables.len() == 1)
    }

    fn selects_single_database(&self) -> bool {
        matches!(self.get_databases(), Some(dbs) if dbs.len() == 1)
    }

    /// Whether `db.table` passes the `tables` filter and `exclude_tables`.
    pub fn is_table_selected(&self, db: &str, table: &str) -> bool {
        let qualified = format!("{}.{}", db, table);
        let matches = |entry: &String| entry == table || *entry == qualified;

        if let Some(excluded) = &self.export.exclude_tables {
            if excluded.iter().any(matches) {
                return false;
            }
        }
        match &self.export.tables {
            Some(tables) if !tables.is_empty() => tables.iter().any(matches),
            _ => true,
        }
    }

    /// Builds the immutable writer settings for this run.
    pub fn to_write_config(&self, sink: Arc<dyn SinkPort>) -> Result<WriteConfig> {
        let mut config = WriteConfig::new(&self.export.output_dir, sink)
            .with_template(self.template()?)
            .with_file_size(self.file_size_limit()?.unwrap_or(0))
            .with_statement_size(self.statement_size_limit()?.unwrap_or(0));
        config.escape_backslash = self.export.escape_backslash.unwrap_or(true);
        config.complete_insert = self.export.complete_insert.unwrap_or(false);
        config.meta_header_lines = self
            .export
            .meta_header_lines
            .clone()
            .unwrap_or_else(|| vec![DEFAULT_META_HEADER.to_string()]);
        Ok(config)
    }
}

fn limit_from(setting: Option<&SizeSetting>) -> Result<Option<u64>> {
    match setting {
        Some(s) => Ok(Some(s.to_bytes()?).filter(|b| *b > 0)),
        None => Ok(None),
    }
}

/// Parses sizes such as `1024`, `64KB`, `256MiB`, `1G` into bytes.
///
/// Decimal suffixes (`KB`, `MB`, `GB`, `TB`) are powers of 1000, binary
/// ones (`KiB`, `MiB`, `GiB`, `TiB`, or a bare `K`, `M`, `G`, `T`) are powers
/// of 1024.
pub fn parse_byte_size(text: &str) -> Result<u64> {
    let trimmed = text.trim();
    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);

    let invalid = || ExportError::ConfigError(format!("invalid size '{}'", text));
    let value: f64 = number.parse().map_err(|_| invalid())?;
    let multiplier: u64 = match unit.trim().to_ascii_uppercase().as_str() {
        "" | "B" => 1,
        "KB" => 1_000,
        "MB" => 1_000_000,
        "GB" => 1_000_000_000,
        "TB" => 1_000_000_000_000,
        "K" | "KIB" => 1 << 10,
        "M" | "MIB" => 1 << 20,
        "G" | "GIB" => 1 << 30,
        "T" | "TIB" => 1 << 40,
        _ => return Err(invalid()),
    };
    Ok((value * multiplier as f64) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory_storage::memory_sink::MemorySink;
    use std::io::Write;

    fn base_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.source.snapshot = Some("snap.yaml".into());
        config.export.output_dir = "./out".into();
        config
    }

    #[test]
    fn test_load_yaml_config() {
        let yaml = r#"
source:
  snapshot: "./fixtures/shop.yaml"
export:
  output_dir: "./dump"
  file_size: "256MiB"
  statement_size: 1000000
  output_filename_template: "{{fn .DB}}-{{fn .Table}}-{{.Index}}"
  complete_insert: true
  exclude_tables: ["audit_log"]
"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", yaml).unwrap();
        let path = file.path().to_str().unwrap();

        let config = AppConfig::from_file(path).expect("Failed to parse config");
        config.validate().unwrap();

        assert_eq!(config.source.snapshot.as_deref(), Some("./fixtures/shop.yaml"));
        assert_eq!(config.file_size_limit().unwrap(), Some(256 << 20));
        assert_eq!(config.statement_size_limit().unwrap(), Some(1_000_000));
        assert_eq!(config.export.complete_insert, Some(true));
        assert!(!config.is_table_selected("shop", "audit_log"));
    }

    #[test]
    fn test_load_json_config() {
        let json = r#"{"source": {"snapshot": "s.json"}, "export": {"output_dir": "/tmp/x", "file_size": 0}}"#;
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{}", json).unwrap();

        let config = AppConfig::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.export.output_dir, "/tmp/x");
        assert_eq!(config.file_size_limit().unwrap(), None);
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut config = base_config();
        let args = CliArgs {
            output: Some("/data/dump".into()),
            filesize: Some("64KB".into()),
            tables: vec!["shop.orders".into()],
            no_views: true,
            ..Default::default()
        };
        config.merge_cli(&args);

        assert_eq!(config.export.output_dir, "/data/dump");
        assert_eq!(config.file_size_limit().unwrap(), Some(64_000));
        assert_eq!(config.export.no_views, Some(true));
        assert!(config.is_table_selected("shop", "orders"));
        assert!(!config.is_table_selected("shop", "customers"));
        assert!(!config.is_table_selected("crm", "orders"));
    }

    #[test]
    fn test_template_must_have_index_with_file_size() {
        let mut config = base_config();
        config.export.databases = Some(vec!["shop".into()]);
        config.export.tables = Some(vec!["shop.orders".into()]);
        config.export.output_filename_template = Some("specified-name".into());
        config.validate().unwrap();

        config.export.file_size = Some(SizeSetting::Bytes(1024));
        assert!(matches!(config.validate(), Err(ExportError::ConfigError(_))));
    }

    #[test]
    fn test_template_must_keep_tables_apart() {
        let mut config = base_config();
        config.export.output_filename_template = Some("{{.DB}}".into());
        match config.validate() {
            Err(ExportError::ConfigError(msg)) => assert!(msg.contains("{{.Table}}")),
            other => panic!("expected config error, got {:?}", other),
        }

        config.export.output_filename_template = Some("{{.Table}}.{{.Index}}".into());
        match config.validate() {
            Err(ExportError::ConfigError(msg)) => assert!(msg.contains("{{.DB}}")),
            other => panic!("expected config error, got {:?}", other),
        }

        // One database selected: the table name alone keeps artifacts apart.
        config.export.databases = Some(vec!["shop".into()]);
        config.validate().unwrap();

        // One table selected: no field is needed to tell tables apart.
        config.export.output_filename_template = Some("{{.Index}}".into());
        config.export.tables = Some(vec!["orders".into()]);
        config.validate().unwrap();
    }

    #[test]
    fn test_invalid_template_rejected_at_validation() {
        let mut config = base_config();
        config.export.output_filename_template = Some("{{.Schema}}".into());
        assert!(matches!(config.validate(), Err(ExportError::TemplateError(_))));
    }

    #[test]
    fn test_cpu_percent_and_threads_validation() {
        let mut config = base_config();
        config.export.cpu_percent = Some(0);
        assert!(config.validate().is_err());
        config.export.cpu_percent = Some(80);
        config.export.threads = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_byte_size() {
        assert_eq!(parse_byte_size("1024").unwrap(), 1024);
        assert_eq!(parse_byte_size("64KB").unwrap(), 64_000);
        assert_eq!(parse_byte_size("256MiB").unwrap(), 256 * 1024 * 1024);
        assert_eq!(parse_byte_size("1g").unwrap(), 1 << 30);
        assert_eq!(parse_byte_size(" 1.5 KiB ").unwrap(), 1536);
        assert!(parse_byte_size("ten").is_err());
        assert!(parse_byte_size("5 parsecs").is_err());
    }

    #[test]
    fn test_to_write_config() {
        let mut config = base_config();
        config.export.statement_size = Some(SizeSetting::Text("1MiB".into()));
        config.export.escape_backslash = Some(false);

        let wc = config.to_write_config(Arc::new(MemorySink::new())).unwrap();
        assert_eq!(wc.file_size_limit, None);
        assert_eq!(wc.statement_size_limit, Some(1 << 20));
        assert!(!wc.escape_backslash);
        assert_eq!(wc.meta_header_lines, vec![DEFAULT_META_HEADER.to_string()]);
        assert_eq!(wc.name_template.as_str(), DEFAULT_DATA_TEMPLATE);
    }
}
