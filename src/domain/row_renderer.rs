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

//! Rendering of row values into SQL literal text.
//!
//! Everything here is pure: a value plus its column's quoting class maps to
//! exactly one literal, and a row maps to one `(v1,v2,...)` tuple.

use crate::domain::entities::{ColumnSpec, QuotingClass, Value};

/// Renders rows as SQL value tuples.
#[derive(Debug, Clone, Copy)]
pub struct RowRenderer {
    /// MySQL-style backslash escaping; when off, only quotes are doubled.
    pub escape_backslash: bool,
}

impl Default for RowRenderer {
    fn default() -> Self {
        Self {
            escape_backslash: true,
        }
    }
}

impl RowRenderer {
    pub fn new(escape_backslash: bool) -> Self {
        Self { escape_backslash }
    }

    /// Renders a single value as a SQL literal.
    pub fn render(&self, value: &Value, column: &ColumnSpec) -> String {
        let mut out = String::new();
        self.render_into(&mut out, value, column.quoting);
        out
    }

    /// Renders a full row as `(v1,v2,...,vn)`.
    ///
    /// The caller guarantees `row.len() == columns.len()`.
    pub fn render_row(&self, row: &[Value], columns: &[ColumnSpec]) -> String {
        debug_assert_eq!(row.len(), columns.len());
        let mut out = String::with_capacity(2 + row.len() * 8);
        out.push('(');
        for (i, (value, column)) in row.iter().zip(columns).enumerate() {
            if i > 0 {
                out.push(',');
            }
            self.render_into(&mut out, value, column.quoting);
        }
        out.push(')');
        out
    }

    fn render_into(&self, out: &mut String, value: &Value, quoting: QuotingClass) {
        match (value, quoting) {
            (None, _) => out.push_str("NULL"),
            (Some(v), QuotingClass::Numeric) => out.push_str(v),
            (Some(v), QuotingClass::Quoted) => {
                out.push('\'');
                escape_string_into(out, v, self.escape_backslash);
                out.push('\'');
            }
        }
    }
}

/// Appends `s` to `out` escaped for use inside a single-quoted SQL string.
pub fn escape_string_into(out: &mut String, s: &str, escape_backslash: bool) {
    if !escape_backslash {
        for c in s.chars() {
            if c == '\'' {
                out.push_str("''");
            } else {
                out.push(c);
            }
        }
        return;
    }

    for c in s.chars() {
        match c {
            '\0' => out.push_str("\\0"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{1a}' => out.push_str("\\Z"),
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
}

/// Wraps an identifier in backticks, doubling any embedded backtick.
pub fn wrap_backticks(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}
