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

//! # SQL Exporter
//!
//! Command-line entry point: loads configuration, wires the snapshot source,
//! the SQL writer and the local filesystem sink, and runs the dump.

use clap::Parser;
use log::{error, info};
use sql_exporter::application::orchestrator::Orchestrator;
use sql_exporter::application::runtime::RuntimeContext;
use sql_exporter::application::sql_writer::SqlWriter;
use sql_exporter::config::{AppConfig, CliArgs};
use sql_exporter::domain::errors::{ExportError, Result};
use sql_exporter::domain::entities::TaskResult;
use sql_exporter::infrastructure::local_storage::local_sink_adapter::LocalSinkAdapter;
use sql_exporter::infrastructure::snapshot::snapshot_source_adapter::SnapshotSourceAdapter;
use std::process;
use std::sync::Arc;

fn main() {
    // 1. Initialize Logging
    env_logger::init();

    // 2. Parse Arguments
    let args = CliArgs::parse();

    // 3. Load Config
    let mut config = if let Some(config_path) = &args.config {
        match AppConfig::from_file(config_path) {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to load config: {}", e);
                process::exit(1);
            }
        }
    } else {
        AppConfig::default_from_cli(&args)
    };

    // Merge CLI overrides
    config.merge_cli(&args);

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        process::exit(1);
    }

    // 4. Setup Parallelism
    RuntimeContext::init(&config);

    // 5. Run
    match run(config) {
        Ok(results) => {
            let success_count = results.iter().filter(|r| r.is_success()).count();
            info!(
                "Export finished. {}/{} objects successful.",
                success_count,
                results.len()
            );
            if success_count < results.len() {
                process::exit(2);
            }
        }
        Err(e) => {
            error!("Export failed: {}", e);
            process::exit(1);
        }
    }
}

/// Wires the adapters together and runs the orchestrator.
///
/// The command-line run never raises the cancel flag. Killing the process
/// can leave staging temp files behind but never a file under a final
/// artifact name. Callers embedding the library abort a run through
/// `Orchestrator::cancel_flag`.
fn run(config: AppConfig) -> Result<Vec<TaskResult>> {
    let sink = Arc::new(LocalSinkAdapter::new(&config.export.output_dir)?);
    let write_config = Arc::new(config.to_write_config(sink.clone())?);

    let snapshot = config
        .source
        .snapshot
        .clone()
        .ok_or_else(|| ExportError::ConfigError("no snapshot configured".into()))?;
    let source = Arc::new(SnapshotSourceAdapter::from_file(
        &snapshot,
        config.data_header_lines(),
    )?);
    let writer = Arc::new(SqlWriter::new(write_config));

    info!("Starting export of {} into {}", snapshot, config.export.output_dir);
    Orchestrator::new(source, writer, sink, config).run()
}
