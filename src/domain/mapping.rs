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

//! # Type Mapping Logic
//!
//! This module decides how values of a database column are written into an
//! `INSERT` statement. Numeric families are written bare; everything else
//! (strings, sets, enums, temporal and binary-as-text values) is quoted.

use crate::domain::entities::QuotingClass;

/// Column types whose values are already valid SQL numeric literals.
const NUMERIC_TYPES: &[&str] = &[
    "INT",
    "INTEGER",
    "TINYINT",
    "SMALLINT",
    "MEDIUMINT",
    "BIGINT",
    "INT1",
    "INT2",
    "INT3",
    "INT4",
    "INT8",
    "DECIMAL",
    "DEC",
    "NUMERIC",
    "FIXED",
    "FLOAT",
    "DOUBLE",
    "DOUBLE PRECISION",
    "REAL",
    "BOOL",
    "BOOLEAN",
];

/// Returns the quoting class for a raw type name such as `INT(11) UNSIGNED`.
pub fn quoting_class_for(type_name: &str) -> QuotingClass {
    let base = base_type_name(type_name);
    if NUMERIC_TYPES.contains(&base.as_str()) {
        QuotingClass::Numeric
    } else {
        QuotingClass::Quoted
    }
}

/// Strips the length/precision suffix and sign modifiers from a type name.
fn base_type_name(type_name: &str) -> String {
    let upper = type_name.trim().to_uppercase();
    let without_len = match upper.find('(') {
        Some(pos) => {
            let tail = upper[pos..]
                .find(')')
                .map(|end| &upper[pos + end + 1..])
                .unwrap_or("");
            format!("{}{}", &upper[..pos], tail)
        }
        None => upper,
    };

    without_len
        .split_whitespace()
        .filter(|w| !matches!(*w, "UNSIGNED" | "SIGNED" | "ZEROFILL"))
        .collect::<Vec<_>>()
        .join(" ")
}
