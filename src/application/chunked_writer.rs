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

//! # Chunked Data Writer
//!
//! Streams the rows of one table into `INSERT` statements and data artifacts
//! while keeping two nested byte budgets:
//!
//! - a statement never grows past `statement_size_limit` (terminator excluded),
//! - an artifact never grows past `file_size_limit` (everything written counts,
//!   header lines and `;\n` terminators included),
//!
//! unless a single row is already too big on its own. Rows are never split,
//! statements never span artifacts, and every artifact starts with the
//! table's header lines.
//!
//! The accounting is a small state machine:
//!
//! ```text
//!   Idle --first row--> StatementOpen --(row fits)--> StatementOpen
//!                             |
//!                             +--(statement full)--> close statement,
//!                                 rotate artifact if needed, open statement
//! ```
//!
//! A statement is only ever opened together with its first row, so an
//! artifact is never left open without one. At most one statement and one
//! artifact are in flight at any time.

use crate::application::write_config::WriteConfig;
use crate::domain::entities::{ColumnSpec, Row, TableExportSource, TableWriteStats};
use crate::domain::errors::{ExportError, Result};
use crate::domain::row_renderer::{wrap_backticks, RowRenderer};
use crate::ports::sink_port::ArtifactHandle;
use log::{debug, info};
use std::io;
use std::mem;
use std::sync::Arc;

const ROW_SEPARATOR: &str = ",\n";
const STATEMENT_TERMINATOR: &str = ";\n";

/// Separator and terminator have the same length, so a row always costs its
/// tuple plus this many bytes once the statement is finalized.
const ROW_OVERHEAD: u64 = 2;

/// An artifact handed out by the sink and not yet closed.
struct OpenArtifact {
    index: u64,
    name: String,
    handle: Box<dyn ArtifactHandle>,
    /// Bytes already written: header lines plus finalized statements.
    written: u64,
    statements: u64,
}

/// The `INSERT` statement currently being filled.
struct OpenStatement {
    text: String,
    rows: u64,
}

impl OpenStatement {
    fn len(&self) -> u64 {
        self.text.len() as u64
    }
}

enum WriterState {
    /// No artifact open.
    Idle,
    /// Artifact open with a statement holding at least one row.
    StatementOpen(OpenArtifact, OpenStatement),
}

/// Writes the data of exactly one table. Create one per table.
pub struct ChunkedDataWriter {
    config: Arc<WriteConfig>,
    renderer: RowRenderer,
    database: String,
    table: String,
    identity: String,
    header: String,
    insert_prefix: String,
    next_index: u64,
    state: WriterState,
    stats: TableWriteStats,
}

impl ChunkedDataWriter {
    fn new(config: Arc<WriteConfig>, source: &TableExportSource) -> Self {
        let mut header = String::new();
        for line in &source.header_lines {
            header.push_str(line);
            header.push('\n');
        }

        Self {
            renderer: RowRenderer::new(config.escape_backslash),
            insert_prefix: insert_prefix(&source.table, &source.columns, config.complete_insert),
            config,
            database: source.database.clone(),
            table: source.table.clone(),
            identity: source.identity(),
            header,
            next_index: 0,
            state: WriterState::Idle,
            stats: TableWriteStats::default(),
        }
    }

    /// Consumes the row stream of `source` and writes all its data artifacts.
    ///
    /// An empty table produces no artifact. On error nothing further is
    /// written and the artifact in flight is discarded, never closed.
    pub fn write_table(config: Arc<WriteConfig>, source: TableExportSource) -> Result<TableWriteStats> {
        let mut writer = Self::new(config, &source);
        let TableExportSource { columns, rows, .. } = source;

        for (row_index, next) in rows.enumerate() {
            let row_index = row_index as u64;
            let row = match next {
                Ok(row) => row,
                Err(ExportError::Cancelled) => return Err(ExportError::Cancelled),
                Err(e) => {
                    return Err(ExportError::RowFetchError {
                        table: writer.identity.clone(),
                        row: row_index,
                        source: Box::new(e),
                    })
                }
            };
            let tuple = writer.render(&row, &columns, row_index)?;
            writer.place(tuple)?;
        }

        writer.finish()
    }

    fn render(&self, row: &Row, columns: &[ColumnSpec], row_index: u64) -> Result<String> {
        if row.len() != columns.len() {
            return Err(ExportError::ArityMismatch {
                table: self.identity.clone(),
                row: row_index,
                expected: columns.len(),
                actual: row.len(),
            });
        }
        Ok(self.renderer.render_row(row, columns))
    }

    /// Places one rendered tuple, closing statements and rotating artifacts
    /// as the budgets require.
    fn place(&mut self, tuple: String) -> Result<()> {
        let tuple_len = tuple.len() as u64;
        let state = mem::replace(&mut self.state, WriterState::Idle);

        let artifact = match state {
            WriterState::StatementOpen(artifact, mut statement) => {
                let statement_after = statement.len() + ROW_OVERHEAD + tuple_len;
                let fits_statement = self
                    .config
                    .statement_size_limit
                    .map_or(true, |limit| statement_after <= limit);
                let fits_file = self.config.file_size_limit.map_or(true, |limit| {
                    artifact.written + statement_after + ROW_OVERHEAD <= limit
                });

                if fits_statement && fits_file {
                    statement.text.push_str(ROW_SEPARATOR);
                    statement.text.push_str(&tuple);
                    statement.rows += 1;
                    self.stats.rows += 1;
                    self.state = WriterState::StatementOpen(artifact, statement);
                    return Ok(());
                }
                self.close_statement(artifact, statement)?
            }
            WriterState::Idle => self.open_artifact()?,
        };

        // A new statement opens here; decide which artifact it belongs to.
        let needed = self.insert_prefix.len() as u64 + tuple_len + ROW_OVERHEAD;
        let artifact = match self.config.file_size_limit {
            Some(limit) if artifact.statements > 0 && artifact.written + needed > limit => {
                self.close_artifact(artifact)?;
                self.open_artifact()?
            }
            _ => artifact,
        };

        let mut text = String::with_capacity(self.insert_prefix.len() + tuple.len());
        text.push_str(&self.insert_prefix);
        text.push_str(&tuple);
        self.stats.rows += 1;
        self.state = WriterState::StatementOpen(artifact, OpenStatement { text, rows: 1 });
        Ok(())
    }

    fn open_artifact(&mut self) -> Result<OpenArtifact> {
        let index = self.next_index;
        let name = self
            .config
            .name_template
            .data_artifact_name(&self.database, &self.table, index);

        let mut handle = self
            .config
            .sink
            .open(&name)
            .map_err(|e| self.sink_error(&name, e))?;
        handle
            .write(self.header.as_bytes())
            .map_err(|e| self.sink_error(&name, e))?;

        self.next_index += 1;
        debug!("Opened data artifact {} for {}", name, self.identity);
        Ok(OpenArtifact {
            index,
            name,
            handle,
            written: self.header.len() as u64,
            statements: 0,
        })
    }

    fn close_statement(
        &mut self,
        mut artifact: OpenArtifact,
        mut statement: OpenStatement,
    ) -> Result<OpenArtifact> {
        statement.text.push_str(STATEMENT_TERMINATOR);
        artifact
            .handle
            .write(statement.text.as_bytes())
            .map_err(|e| self.sink_error(&artifact.name, e))?;
        artifact.written += statement.len();
        artifact.statements += 1;
        self.stats.statements += 1;
        debug!(
            "Finalized statement with {} rows ({} bytes) in {}",
            statement.rows,
            statement.len(),
            artifact.name
        );
        Ok(artifact)
    }

    fn close_artifact(&mut self, artifact: OpenArtifact) -> Result<()> {
        let OpenArtifact {
            index,
            name,
            handle,
            written,
            statements,
        } = artifact;
        handle.close().map_err(|e| self.sink_error(&name, e))?;

        debug!(
            "Closed data artifact #{} {} ({} statements, {} bytes)",
            index, name, statements, written
        );
        self.stats.bytes += written;
        self.stats.artifacts.push(name);
        Ok(())
    }

    fn finish(mut self) -> Result<TableWriteStats> {
        match mem::replace(&mut self.state, WriterState::Idle) {
            WriterState::StatementOpen(artifact, statement) => {
                let artifact = self.close_statement(artifact, statement)?;
                self.close_artifact(artifact)?;
            }
            WriterState::Idle => {}
        }

        info!(
            "Dumped {}: {} rows, {} statements, {} artifacts, {} bytes",
            self.identity,
            self.stats.rows,
            self.stats.statements,
            self.stats.artifacts.len(),
            self.stats.bytes
        );
        Ok(self.stats)
    }

    fn sink_error(&self, artifact: &str, source: io::Error) -> ExportError {
        ExportError::SinkError {
            table: self.identity.clone(),
            artifact: artifact.to_string(),
            source,
        }
    }
}

/// Builds ``INSERT INTO `t` VALUES\n``, optionally with the column list.
fn insert_prefix(table: &str, columns: &[ColumnSpec], complete_insert: bool) -> String {
    if complete_insert && !columns.is_empty() {
        let names: Vec<String> = columns.iter().map(|c| wrap_backticks(&c.name)).collect();
        format!(
            "INSERT INTO {} ({}) VALUES\n",
            wrap_backticks(table),
            names.join(",")
        )
    } else {
        format!("INSERT INTO {} VALUES\n", wrap_backticks(table))
    }
}
