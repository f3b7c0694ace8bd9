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

//! Immutable settings shared by every writer of one export run.

use crate::domain::naming::OutputFileTemplate;
use crate::ports::sink_port::SinkPort;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Header line written at the top of every metadata script by default.
pub const DEFAULT_META_HEADER: &str = "/*!40101 SET NAMES binary*/;";

/// `WriteConfig` is built once per run and shared read-only by all writers.
#[derive(Clone)]
pub struct WriteConfig {
    pub output_dir: PathBuf,
    /// Maximum bytes per data artifact; `None` means unbounded.
    pub file_size_limit: Option<u64>,
    /// Maximum bytes per `INSERT` statement (terminator excluded); `None` means unbounded.
    pub statement_size_limit: Option<u64>,
    pub name_template: OutputFileTemplate,
    pub sink: Arc<dyn SinkPort>,
    pub escape_backslash: bool,
    /// List column names in every `INSERT` statement.
    pub complete_insert: bool,
    pub meta_header_lines: Vec<String>,
}

impl WriteConfig {
    /// Creates a config with unbounded sizes and the default naming template.
    pub fn new(output_dir: impl Into<PathBuf>, sink: Arc<dyn SinkPort>) -> Self {
        Self {
            output_dir: output_dir.into(),
            file_size_limit: None,
            statement_size_limit: None,
            name_template: OutputFileTemplate::default(),
            sink,
            escape_backslash: true,
            complete_insert: false,
            meta_header_lines: vec![DEFAULT_META_HEADER.to_string()],
        }
    }

    /// Sets the file size limit; `0` means unbounded.
    pub fn with_file_size(mut self, limit: u64) -> Self {
        self.file_size_limit = non_zero(limit);
        self
    }

    /// Sets the statement size limit; `0` means unbounded.
    pub fn with_statement_size(mut self, limit: u64) -> Self {
        self.statement_size_limit = non_zero(limit);
        self
    }

    pub fn with_template(mut self, template: OutputFileTemplate) -> Self {
        self.name_template = template;
        self
    }
}

fn non_zero(limit: u64) -> Option<u64> {
    (limit > 0).then_some(limit)
}

impl fmt::Debug for WriteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteConfig")
            .field("output_dir", &self.output_dir)
            .field("file_size_limit", &self.file_size_limit)
            .field("statement_size_limit", &self.statement_size_limit)
            .field("name_template", &self.name_template)
            .field("escape_backslash", &self.escape_backslash)
            .field("complete_insert", &self.complete_insert)
            .field("meta_header_lines", &self.meta_header_lines)
            .finish_non_exhaustive()
    }
}
