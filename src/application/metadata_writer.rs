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

//! Single-shot metadata scripts (database, table and view definitions).

use crate::application::write_config::WriteConfig;
use crate::domain::entities::MetaKind;
use crate::domain::errors::{ExportError, Result};
use crate::domain::naming::meta_artifact_name;
use log::debug;
use std::sync::Arc;

/// Writes one complete artifact per call; no chunking.
pub struct MetadataWriter {
    config: Arc<WriteConfig>,
}

impl MetadataWriter {
    pub fn new(config: Arc<WriteConfig>) -> Self {
        Self { config }
    }

    /// Writes `header_lines` followed by `body` as one artifact.
    ///
    /// Every header line is newline-terminated and the body is terminated
    /// with `;\n` unless it already ends that way. Returns the artifact name.
    pub fn write_one(
        &self,
        kind: MetaKind,
        db: &str,
        table: &str,
        header_lines: &[String],
        body: &str,
    ) -> Result<String> {
        let name = meta_artifact_name(kind, db, table);
        let content = render_meta(header_lines, body);
        let identity = match kind {
            MetaKind::Database => format!("`{}`", db),
            _ => format!("`{}`.`{}`", db, table),
        };
        let tag = |source| ExportError::SinkError {
            table: identity.clone(),
            artifact: name.clone(),
            source,
        };

        let mut handle = self.config.sink.open(&name).map_err(tag)?;
        handle.write(content.as_bytes()).map_err(tag)?;
        handle.close().map_err(tag)?;

        debug!("Wrote {} metadata {} ({} bytes)", kind, name, content.len());
        Ok(name)
    }

    /// Writes a script using the configured metadata header lines.
    pub fn write_with_default_header(
        &self,
        kind: MetaKind,
        db: &str,
        table: &str,
        body: &str,
    ) -> Result<String> {
        self.write_one(kind, db, table, &self.config.meta_header_lines, body)
    }
}

fn render_meta(header_lines: &[String], body: &str) -> String {
    let mut content = String::with_capacity(body.len() + 64);
    for line in header_lines {
        content.push_str(line);
        content.push('\n');
    }
    content.push_str(body);
    if !body.ends_with(";\n") {
        content.push_str(";\n");
    }
    content
}
