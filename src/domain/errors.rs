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

//! Core error definitions for the SQL exporter.
//!
//! This module provides a centralized `ExportError` enum and a `Result` type
//! used throughout the application to handle configuration, source, sink and
//! rendering errors.

use thiserror::Error;

/// Error types encountered during the export process.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid output file template: {0}")]
    TemplateError(String),

    #[error("Metadata discovery failed: {0}")]
    MetadataError(String),

    #[error("Row fetch failed for {table} at row {row}: {source}")]
    RowFetchError {
        table: String,
        row: u64,
        #[source]
        source: Box<ExportError>,
    },

    #[error("Row {row} of {table} has {actual} values but the table has {expected} columns")]
    ArityMismatch {
        table: String,
        row: u64,
        expected: usize,
        actual: usize,
    },

    #[error("Writing artifact {artifact} for {table} failed: {source}")]
    SinkError {
        table: String,
        artifact: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Privilege check failed: {0}")]
    PrivilegeError(String),

    #[error("Export cancelled")]
    Cancelled,

    #[error("Source error: {0}")]
    SourceError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<serde_json::Error> for ExportError {
    fn from(e: serde_json::Error) -> Self {
        ExportError::SerializationError(e.to_string())
    }
}

impl From<serde_yaml::Error> for ExportError {
    fn from(e: serde_yaml::Error) -> Self {
        ExportError::SerializationError(e.to_string())
    }
}

/// A specialized Result type for the SQL exporter.
pub type Result<T> = std::result::Result<T, ExportError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io;

    #[test]
    fn test_sink_error_keeps_io_kind() {
        let err = ExportError::SinkError {
            table: "`test`.`t`".to_string(),
            artifact: "test.t.0.sql".to_string(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only volume"),
        };
        let msg = err.to_string();
        assert!(msg.contains("test.t.0.sql"));
        assert!(msg.contains("`test`.`t`"));

        let source = err.source().unwrap();
        let io_err = source.downcast_ref::<io::Error>().unwrap();
        assert_eq!(io_err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_row_fetch_error_chains_upstream() {
        let err = ExportError::RowFetchError {
            table: "`db`.`t`".to_string(),
            row: 7,
            source: Box::new(ExportError::SourceError("connection reset".to_string())),
        };
        assert!(err.to_string().contains("at row 7"));
        assert!(err.source().unwrap().to_string().contains("connection reset"));
    }
}
