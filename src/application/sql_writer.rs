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

//! `WriterPort` implementation producing SQL dump artifacts.

use crate::application::chunked_writer::ChunkedDataWriter;
use crate::application::metadata_writer::MetadataWriter;
use crate::application::write_config::WriteConfig;
use crate::domain::entities::{MetaKind, TableExportSource, TableWriteStats};
use crate::domain::errors::Result;
use crate::ports::writer_port::WriterPort;
use std::sync::Arc;

/// Writes metadata scripts and chunked `INSERT` data through the configured sink.
pub struct SqlWriter {
    config: Arc<WriteConfig>,
    meta: MetadataWriter,
}

impl SqlWriter {
    pub fn new(config: Arc<WriteConfig>) -> Self {
        Self {
            meta: MetadataWriter::new(config.clone()),
            config,
        }
    }

    pub fn config(&self) -> &WriteConfig {
        &self.config
    }
}

impl WriterPort for SqlWriter {
    fn write_database_meta(&self, db: &str, create_sql: &str) -> Result<()> {
        self.meta
            .write_with_default_header(MetaKind::Database, db, "", create_sql)?;
        Ok(())
    }

    fn write_table_meta(&self, db: &str, table: &str, create_sql: &str) -> Result<()> {
        self.meta
            .write_with_default_header(MetaKind::Table, db, table, create_sql)?;
        Ok(())
    }

    fn write_view_meta(
        &self,
        db: &str,
        view: &str,
        create_table_sql: &str,
        create_view_sql: &str,
    ) -> Result<()> {
        self.meta
            .write_with_default_header(MetaKind::Table, db, view, create_table_sql)?;
        self.meta
            .write_with_default_header(MetaKind::View, db, view, create_view_sql)?;
        Ok(())
    }

    fn write_table_data(&self, source: TableExportSource) -> Result<TableWriteStats> {
        ChunkedDataWriter::write_table(self.config.clone(), source)
    }
}
