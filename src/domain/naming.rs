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

//! Artifact naming.
//!
//! Data artifact names come from a user-supplied template such as
//! `{{.Index}}-{{.Table}}-{{fn .DB}}`. The template language knows three
//! fields (`DB`, `Table`, `Index`) and one function, `fn`, which makes a value
//! safe to use inside a file name. Templates are parsed once when the
//! configuration is validated; resolving a parsed template cannot fail.

use crate::domain::entities::MetaKind;
use crate::domain::errors::{ExportError, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::fmt;
use std::str::FromStr;

/// Template used when the user does not supply one.
pub const DEFAULT_DATA_TEMPLATE: &str = "{{fn .DB}}.{{fn .Table}}.{{.Index}}";

/// Extension appended to every resolved artifact name.
pub const SQL_EXTENSION: &str = ".sql";

static FILENAME_UNSAFE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\x00-\x1f%"*./:<>?\\|]|-(?i:schema)"#).unwrap());

/// Percent-encodes characters that are unsafe in file names.
///
/// `-schema` (any case) is encoded as well so a data artifact name can never
/// be mistaken for one of the metadata suffixes.
pub fn escape_filename(input: &str) -> String {
    FILENAME_UNSAFE_RE
        .replace_all(input, |caps: &Captures| {
            let m = &caps[0];
            format!("%{:02X}{}", m.as_bytes()[0], &m[1..])
        })
        .into_owned()
}

/// Fields a template may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateField {
    Db,
    Table,
    Index,
}

impl FromStr for TemplateField {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            ".DB" => Ok(TemplateField::Db),
            ".Table" => Ok(TemplateField::Table),
            ".Index" => Ok(TemplateField::Index),
            other => Err(ExportError::TemplateError(format!(
                "unknown field '{}', expected one of .DB, .Table, .Index",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Field { field: TemplateField, escape: bool },
}

/// A parsed artifact naming template.
#[derive(Clone, PartialEq)]
pub struct OutputFileTemplate {
    text: String,
    segments: Vec<Segment>,
}

impl OutputFileTemplate {
    /// Parses a template, rejecting unknown fields and functions.
    pub fn parse(text: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut rest = text;

        while let Some(start) = rest.find("{{") {
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }
            let after_open = &rest[start + 2..];
            let end = after_open.find("}}").ok_or_else(|| {
                ExportError::TemplateError(format!("unterminated action in '{}'", text))
            })?;
            segments.push(Self::parse_action(after_open[..end].trim())?);
            rest = &after_open[end + 2..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }
        if segments.is_empty() {
            return Err(ExportError::TemplateError("template is empty".to_string()));
        }

        Ok(Self {
            text: text.to_string(),
            segments,
        })
    }

    fn parse_action(action: &str) -> Result<Segment> {
        let tokens: Vec<&str> = action.split_whitespace().collect();
        match tokens.as_slice() {
            [] => Err(ExportError::TemplateError("empty action '{{}}'".to_string())),
            [field] => Ok(Segment::Field {
                field: field.parse()?,
                escape: false,
            }),
            ["fn", field] => Ok(Segment::Field {
                field: field.parse()?,
                escape: true,
            }),
            [func, ..] if !func.starts_with('.') && *func != "fn" => Err(
                ExportError::TemplateError(format!("function '{}' not defined", func)),
            ),
            _ => Err(ExportError::TemplateError(format!(
                "malformed action '{{{{{}}}}}'",
                action
            ))),
        }
    }

    /// Resolves the template for one artifact, without extension.
    pub fn resolve(&self, db: &str, table: &str, index: u64) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(s) => out.push_str(s),
                Segment::Field { field, escape } => {
                    let value = match field {
                        TemplateField::Db => db.to_string(),
                        TemplateField::Table => table.to_string(),
                        TemplateField::Index => index.to_string(),
                    };
                    if *escape {
                        out.push_str(&escape_filename(&value));
                    } else {
                        out.push_str(&value);
                    }
                }
            }
        }
        out
    }

    /// Resolves the full data artifact name, including the `.sql` extension.
    pub fn data_artifact_name(&self, db: &str, table: &str, index: u64) -> String {
        format!("{}{}", self.resolve(db, table, index), SQL_EXTENSION)
    }

    /// Whether the template references `field` anywhere.
    pub fn references(&self, field: TemplateField) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Field { field: f, .. } if *f == field))
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl Default for OutputFileTemplate {
    fn default() -> Self {
        Self {
            text: DEFAULT_DATA_TEMPLATE.to_string(),
            segments: vec![
                Segment::Field {
                    field: TemplateField::Db,
                    escape: true,
                },
                Segment::Literal(".".to_string()),
                Segment::Field {
                    field: TemplateField::Table,
                    escape: true,
                },
                Segment::Literal(".".to_string()),
                Segment::Field {
                    field: TemplateField::Index,
                    escape: false,
                },
            ],
        }
    }
}

impl FromStr for OutputFileTemplate {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Debug for OutputFileTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OutputFileTemplate({:?})", self.text)
    }
}

/// Name of a single-shot metadata artifact.
///
/// `table` is ignored for `MetaKind::Database`.
pub fn meta_artifact_name(kind: MetaKind, db: &str, table: &str) -> String {
    match kind {
        MetaKind::Database => format!("{}-schema-create{}", escape_filename(db), SQL_EXTENSION),
        MetaKind::Table => format!(
            "{}.{}-schema{}",
            escape_filename(db),
            escape_filename(table),
            SQL_EXTENSION
        ),
        MetaKind::View => format!(
            "{}.{}-schema-view{}",
            escape_filename(db),
            escape_filename(table),
            SQL_EXTENSION
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_filename() {
        assert_eq!(escape_filename("te%/st"), "te%25%2Fst");
        assert_eq!(escape_filename("plain_name"), "plain_name");
        assert_eq!(escape_filename("a.b:c*d"), "a%2Eb%3Ac%2Ad");
        assert_eq!(escape_filename("tab\tle"), "tab%09le");
        assert_eq!(escape_filename("orders-Schema"), "orders%2DSchema");
    }

    #[test]
    fn test_default_template() {
        let t = OutputFileTemplate::default();
        assert_eq!(t.data_artifact_name("test", "employee", 0), "test.employee.0.sql");
        assert_eq!(t, OutputFileTemplate::parse(DEFAULT_DATA_TEMPLATE).unwrap());
    }

    #[test]
    fn test_custom_template_with_fn() {
        let t = OutputFileTemplate::parse("{{.Index}}-{{.Table}}-{{fn .DB}}").unwrap();
        assert_eq!(t.resolve("te%/st", "employee", 1), "1-employee-te%25%2Fst");
        assert!(t.references(TemplateField::Index));
    }

    #[test]
    fn test_literal_template() {
        let t = OutputFileTemplate::parse("specified-name").unwrap();
        assert_eq!(t.data_artifact_name("db", "t", 3), "specified-name.sql");
        assert!(!t.references(TemplateField::Index));
    }

    #[test]
    fn test_whitespace_inside_action() {
        let t = OutputFileTemplate::parse("{{ .DB }}_{{ fn  .Table }}").unwrap();
        assert_eq!(t.resolve("d", "a/b", 0), "d_a%2Fb");
    }

    #[test]
    fn test_invalid_templates() {
        for bad in ["", "{{.Schema}}", "{{.DB", "{{}}", "{{upper .DB}}", "{{fn .DB .Table}}"] {
            let err = OutputFileTemplate::parse(bad).unwrap_err();
            assert!(matches!(err, ExportError::TemplateError(_)), "{}", bad);
        }
    }

    #[test]
    fn test_meta_artifact_names() {
        assert_eq!(meta_artifact_name(MetaKind::Database, "test", ""), "test-schema-create.sql");
        assert_eq!(meta_artifact_name(MetaKind::Table, "test", "t"), "test.t-schema.sql");
        assert_eq!(meta_artifact_name(MetaKind::View, "test", "v"), "test.v-schema-view.sql");
        assert_eq!(meta_artifact_name(MetaKind::Table, "a.b", "c"), "a%2Eb.c-schema.sql");
    }
}
