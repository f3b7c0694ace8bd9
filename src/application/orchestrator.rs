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

//! The core application logic that orchestrates a whole dump.
//!
//! This module coordinates between the source, the writer and the sink to
//! discover databases and tables, write their metadata scripts, stream table
//! data in parallel, and aggregate results into a report.

use crate::application::privilege_check::{verify_privileges, DUMP_PRIVILEGES};
use crate::config::AppConfig as Config;
use crate::domain::entities::{TableInfo, TableKind, TableWriteStats, TaskResult};
use crate::domain::errors::{ExportError, Result};
use crate::ports::row_stream::{CancelFlag, Cancellable};
use crate::ports::sink_port::SinkPort;
use crate::ports::source_port::DumpSourcePort;
use crate::ports::writer_port::WriterPort;
use log::{error, info, warn};
use rayon::prelude::*;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

/// Name of the run report written through the sink.
pub const REPORT_NAME: &str = "dump-report.json";

/// Orchestrates the end-to-end dump of every selected database.
pub struct Orchestrator {
    source: Arc<dyn DumpSourcePort>,
    writer: Arc<dyn WriterPort>,
    sink: Arc<dyn SinkPort>,
    config: Config,
    cancel: CancelFlag,
}

impl Orchestrator {
    pub fn new(
        source: Arc<dyn DumpSourcePort>,
        writer: Arc<dyn WriterPort>,
        sink: Arc<dyn SinkPort>,
        config: Config,
    ) -> Self {
        Self {
            source,
            writer,
            sink,
            config,
            cancel: CancelFlag::new(),
        }
    }

    /// Flag that aborts the run between rows once raised.
    ///
    /// The orchestrator never raises it itself. The embedding caller owns
    /// cancellation and may raise it from any thread while `run` is in
    /// progress.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Entry point for running the full dump.
    ///
    /// A failing table is recorded in its `TaskResult` and does not stop the
    /// other tables. Failures to list or describe a database abort the run.
    pub fn run(&self) -> Result<Vec<TaskResult>> {
        let start_time = Instant::now();
        info!("Starting dump orchestrator...");

        if self.config.export.check_privileges.unwrap_or(false) {
            self.check_privileges()?;
        }

        let databases = match self.config.get_databases() {
            Some(dbs) => dbs,
            None => self.source.list_databases()?,
        };

        let mut results = Vec::new();
        for db in databases {
            if self.cancel.is_cancelled() {
                warn!("Dump cancelled before database {}", db);
                break;
            }
            results.extend(self.process_database(&db)?);
        }

        self.generate_report(&results, start_time.elapsed().as_secs_f64())?;

        if self.cancel.is_cancelled() {
            return Err(ExportError::Cancelled);
        }

        let success = results.iter().filter(|r| r.is_success()).count();
        info!(
            "Dump finished in {:.2}s. {}/{} objects successful.",
            start_time.elapsed().as_secs_f64(),
            success,
            results.len()
        );
        Ok(results)
    }

    fn check_privileges(&self) -> Result<()> {
        let grants = self.source.show_grants()?;
        let check = verify_privileges(&grants, DUMP_PRIVILEGES);
        if check.is_success() {
            info!("{} passed", check.name);
            return Ok(());
        }

        let mut msg = check.error_msg.unwrap_or_default();
        if let Some(instruction) = check.instruction {
            msg = format!("{}; fix with: {}", msg, instruction);
        }
        error!("{} failed: {}", check.name, msg);
        Err(ExportError::PrivilegeError(msg))
    }

    fn process_database(&self, db: &str) -> Result<Vec<TaskResult>> {
        info!("Processing database {}", db);
        let export = &self.config.export;
        let no_schemas = export.no_schemas.unwrap_or(false);
        let no_views = export.no_views.unwrap_or(false);

        if !no_schemas {
            let create_sql = self.source.show_create_database(db)?;
            self.writer.write_database_meta(db, &create_sql)?;
        }

        let objects: Vec<TableInfo> = self
            .source
            .list_tables(db)?
            .into_iter()
            .filter(|t| {
                if !self.config.is_table_selected(db, &t.name) {
                    info!("Skipping filtered table: {}.{}", db, t.name);
                    return false;
                }
                // A view has nothing but metadata to dump.
                t.kind == TableKind::Table || !(no_views || no_schemas)
            })
            .collect();

        if objects.is_empty() {
            info!("No tables found to export in {}.", db);
            return Ok(vec![]);
        }

        Ok(objects
            .into_par_iter()
            .map(|info| {
                let start = Instant::now();
                match self.process_object(db, &info) {
                    Ok(stats) => TaskResult::success(
                        db.to_string(),
                        info.name,
                        &stats,
                        start.elapsed().as_secs_f64(),
                    ),
                    Err(e) => {
                        error!("Table {}.{} failed: {}", db, info.name, e);
                        TaskResult::failure(db.to_string(), info.name, e.to_string())
                    }
                }
            })
            .collect())
    }

    /// Dumps one table or view.
    fn process_object(&self, db: &str, info: &TableInfo) -> Result<TableWriteStats> {
        let export = &self.config.export;
        let no_schemas = export.no_schemas.unwrap_or(false);

        if info.kind == TableKind::View {
            let (create_table, create_view) = self.source.show_create_view(db, &info.name)?;
            self.writer
                .write_view_meta(db, &info.name, &create_table, &create_view)?;
            return Ok(TableWriteStats::default());
        }

        if !no_schemas {
            let create_sql = self.source.show_create_table(db, &info.name)?;
            self.writer.write_table_meta(db, &info.name, &create_sql)?;
        }
        if export.no_data.unwrap_or(false) {
            return Ok(TableWriteStats::default());
        }

        let mut data = self.source.table_data(db, &info.name)?;
        data.rows = Box::new(Cancellable::new(data.rows, self.cancel.clone()));
        self.writer.write_table_data(data)
    }

    fn generate_report(&self, results: &[TaskResult], duration_secs: f64) -> Result<()> {
        let success = results.iter().filter(|r| r.is_success()).count();
        let failed = results.len() - success;
        let total_rows: u64 = results.iter().map(|r| r.rows).sum();
        let total_bytes: u64 = results.iter().map(|r| r.bytes).sum();
        let total_artifacts: usize = results.iter().map(|r| r.artifacts).sum();

        let report = json!({
            "summary": {
                "finished_at": chrono::Local::now().to_rfc3339(),
                "total_tasks": results.len(),
                "success": success,
                "failed": failed,
                "cancelled": self.cancel.is_cancelled(),
                "total_rows": total_rows,
                "total_bytes": total_bytes,
                "total_artifacts": total_artifacts,
                "total_duration_seconds": duration_secs,
                "total_mb_per_sec": if duration_secs > 0.0 { (total_bytes as f64 / 1024.0 / 1024.0) / duration_secs } else { 0.0 }
            },
            "details": results
        });

        let mut handle = self.sink.open(REPORT_NAME)?;
        handle.write(&serde_json::to_vec_pretty(&report)?)?;
        handle.close()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::sql_writer::SqlWriter;
    use crate::application::write_config::WriteConfig;
    use crate::domain::entities::{ColumnSpec, Row, TableExportSource};
    use crate::infrastructure::memory_storage::memory_sink::MemorySink;
    use std::sync::Arc;

    struct MockSourcePort {
        grants: Vec<String>,
    }

    impl MockSourcePort {
        fn new() -> Self {
            Self {
                grants: vec!["GRANT RELOAD, SELECT ON *.* TO 'dumper'@'%'".to_string()],
            }
        }
    }

    impl DumpSourcePort for MockSourcePort {
        fn list_databases(&self) -> Result<Vec<String>> {
            Ok(vec!["shop".to_string()])
        }
        fn list_tables(&self, _db: &str) -> Result<Vec<TableInfo>> {
            Ok(vec![
                TableInfo { name: "orders".into(), kind: TableKind::Table },
                TableInfo { name: "broken".into(), kind: TableKind::Table },
                TableInfo { name: "recent".into(), kind: TableKind::View },
            ])
        }
        fn show_create_database(&self, db: &str) -> Result<String> {
            Ok(format!("CREATE DATABASE `{}`", db))
        }
        fn show_create_table(&self, _db: &str, table: &str) -> Result<String> {
            Ok(format!("CREATE TABLE `{}` (`id` int)", table))
        }
        fn show_create_view(&self, _db: &str, view: &str) -> Result<(String, String)> {
            Ok((
                format!("CREATE TABLE `{}`(`id` int)", view),
                format!("CREATE VIEW `{}` AS SELECT 1", view),
            ))
        }
        fn table_data(&self, db: &str, table: &str) -> Result<TableExportSource> {
            let rows: Vec<Result<Row>> = if table == "broken" {
                vec![
                    Ok(vec![Some("1".into())]),
                    Err(ExportError::SourceError("connection reset".into())),
                ]
            } else {
                vec![Ok(vec![Some("1".into())]), Ok(vec![Some("2".into())])]
            };
            Ok(TableExportSource::new(
                db,
                table,
                vec![ColumnSpec::new("id", "int")],
                vec![],
                rows.into_iter(),
            ))
        }
        fn show_grants(&self) -> Result<Vec<String>> {
            Ok(self.grants.clone())
        }
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.source.snapshot = Some("unused.yaml".into());
        config.export.output_dir = "/tmp/dump".into();
        config
    }

    fn orchestrator(source: MockSourcePort, config: Config) -> (Orchestrator, MemorySink) {
        let sink = MemorySink::new();
        let write_config = Arc::new(WriteConfig::new("/tmp/dump", Arc::new(sink.clone())));
        let orchestrator = Orchestrator::new(
            Arc::new(source),
            Arc::new(SqlWriter::new(write_config)),
            Arc::new(sink.clone()),
            config,
        );
        (orchestrator, sink)
    }

    #[test]
    fn test_orchestrator_run() {
        let (orchestrator, sink) = orchestrator(MockSourcePort::new(), test_config());

        let mut results = orchestrator.run().unwrap();
        results.sort_by(|a, b| a.table.cmp(&b.table));
        assert_eq!(results.len(), 3);

        assert_eq!(results[0].table, "broken");
        assert_eq!(results[0].status, "FAILED");
        assert!(results[0].error.as_ref().unwrap().contains("connection reset"));

        assert_eq!(results[1].table, "orders");
        assert_eq!(results[1].status, "SUCCESS");
        assert_eq!(results[1].rows, 2);
        assert_eq!(results[1].artifacts, 1);

        assert_eq!(results[2].table, "recent");
        assert!(results[2].is_success());

        assert_eq!(
            sink.names(),
            vec![
                "dump-report.json",
                "shop-schema-create.sql",
                "shop.broken-schema.sql",
                "shop.orders-schema.sql",
                "shop.orders.0.sql",
                "shop.recent-schema-view.sql",
                "shop.recent-schema.sql",
            ]
        );

        let report: serde_json::Value =
            serde_json::from_str(&sink.content_str(REPORT_NAME).unwrap()).unwrap();
        assert_eq!(report["summary"]["total_tasks"], 3);
        assert_eq!(report["summary"]["failed"], 1);
        assert_eq!(report["summary"]["total_rows"], 2);
    }

    #[test]
    fn test_skip_flags_and_filters() {
        let mut config = test_config();
        config.export.no_data = Some(true);
        config.export.no_views = Some(true);
        config.export.exclude_tables = Some(vec!["shop.broken".into()]);
        let (orchestrator, sink) = orchestrator(MockSourcePort::new(), config);

        let results = orchestrator.run().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].table, "orders");
        assert_eq!(results[0].rows, 0);
        assert_eq!(
            sink.names(),
            vec!["dump-report.json", "shop-schema-create.sql", "shop.orders-schema.sql"]
        );
    }

    #[test]
    fn test_no_schemas_writes_only_data() {
        let mut config = test_config();
        config.export.no_schemas = Some(true);
        config.export.tables = Some(vec!["orders".into(), "recent".into()]);
        let (orchestrator, sink) = orchestrator(MockSourcePort::new(), config);

        let results = orchestrator.run().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(sink.names(), vec!["dump-report.json", "shop.orders.0.sql"]);
    }

    #[test]
    fn test_privilege_check_failure_aborts() {
        let mut config = test_config();
        config.export.check_privileges = Some(true);
        let source = MockSourcePort {
            grants: vec!["GRANT SELECT ON *.* TO 'dumper'@'%'".to_string()],
        };
        let (orchestrator, sink) = orchestrator(source, config);

        match orchestrator.run() {
            Err(ExportError::PrivilegeError(msg)) => {
                assert!(msg.contains("lack of RELOAD privilege"));
                assert!(msg.contains("GRANT RELOAD ON *.* TO 'dumper'@'%';"));
            }
            other => panic!("expected privilege error, got {:?}", other),
        }
        assert!(sink.names().is_empty());
    }

    #[test]
    fn test_privilege_check_success() {
        let mut config = test_config();
        config.export.check_privileges = Some(true);
        let (orchestrator, _sink) = orchestrator(MockSourcePort::new(), config);
        assert_eq!(orchestrator.run().unwrap().len(), 3);
    }

    #[test]
    fn test_cancelled_run() {
        let (orchestrator, sink) = orchestrator(MockSourcePort::new(), test_config());
        orchestrator.cancel_flag().cancel();

        assert!(matches!(orchestrator.run(), Err(ExportError::Cancelled)));
        assert_eq!(sink.names(), vec!["dump-report.json"]);
    }

    #[test]
    fn test_cancel_during_table_stream() {
        use std::sync::Mutex;

        /// Raises the run's cancel flag as soon as the first row is pulled.
        struct CancellingSourcePort {
            inner: MockSourcePort,
            flag: Mutex<Option<CancelFlag>>,
        }

        impl DumpSourcePort for CancellingSourcePort {
            fn list_databases(&self) -> Result<Vec<String>> {
                self.inner.list_databases()
            }
            fn list_tables(&self, _db: &str) -> Result<Vec<TableInfo>> {
                Ok(vec![TableInfo { name: "orders".into(), kind: TableKind::Table }])
            }
            fn show_create_database(&self, db: &str) -> Result<String> {
                self.inner.show_create_database(db)
            }
            fn show_create_table(&self, db: &str, table: &str) -> Result<String> {
                self.inner.show_create_table(db, table)
            }
            fn show_create_view(&self, db: &str, view: &str) -> Result<(String, String)> {
                self.inner.show_create_view(db, view)
            }
            fn table_data(&self, db: &str, table: &str) -> Result<TableExportSource> {
                let flag = self.flag.lock().unwrap().clone().unwrap();
                let rows = (1..=3).map(move |i| {
                    flag.cancel();
                    Ok(vec![Some(i.to_string())])
                });
                Ok(TableExportSource::new(db, table, vec![ColumnSpec::new("id", "int")], vec![], rows))
            }
            fn show_grants(&self) -> Result<Vec<String>> {
                self.inner.show_grants()
            }
        }

        let source = Arc::new(CancellingSourcePort {
            inner: MockSourcePort::new(),
            flag: Mutex::new(None),
        });
        let sink = MemorySink::new();
        let write_config = Arc::new(WriteConfig::new("/tmp/dump", Arc::new(sink.clone())));
        let orchestrator = Orchestrator::new(
            source.clone(),
            Arc::new(SqlWriter::new(write_config)),
            Arc::new(sink.clone()),
            test_config(),
        );
        *source.flag.lock().unwrap() = Some(orchestrator.cancel_flag());

        assert!(matches!(orchestrator.run(), Err(ExportError::Cancelled)));
        assert!(!sink.names().contains(&"shop.orders.0.sql".to_string()));

        let report: serde_json::Value =
            serde_json::from_str(&sink.content_str(REPORT_NAME).unwrap()).unwrap();
        assert_eq!(report["summary"]["cancelled"], true);
        assert_eq!(report["summary"]["failed"], 1);
        assert_eq!(report["details"][0]["error"], "Export cancelled");
    }

    #[test]
    fn test_orchestrator_failure() {
        struct FailingSourcePort;
        impl DumpSourcePort for FailingSourcePort {
            fn list_databases(&self) -> Result<Vec<String>> {
                Err(ExportError::MetadataError("DB Down".to_string()))
            }
            fn list_tables(&self, _db: &str) -> Result<Vec<TableInfo>> {
                unreachable!()
            }
            fn show_create_database(&self, _db: &str) -> Result<String> {
                unreachable!()
            }
            fn show_create_table(&self, _db: &str, _table: &str) -> Result<String> {
                unreachable!()
            }
            fn show_create_view(&self, _db: &str, _view: &str) -> Result<(String, String)> {
                unreachable!()
            }
            fn table_data(&self, _db: &str, _table: &str) -> Result<TableExportSource> {
                unreachable!()
            }
            fn show_grants(&self) -> Result<Vec<String>> {
                Ok(vec![])
            }
        }

        let sink = MemorySink::new();
        let write_config = Arc::new(WriteConfig::new(".", Arc::new(sink.clone())));
        let orchestrator = Orchestrator::new(
            Arc::new(FailingSourcePort),
            Arc::new(SqlWriter::new(write_config)),
            Arc::new(sink),
            test_config(),
        );

        let result = orchestrator.run();
        assert!(matches!(result, Err(ExportError::MetadataError(_))));
    }
}
