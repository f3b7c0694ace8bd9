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

//! Pre-flight check of the privileges a dump needs on the source server.
//!
//! The check works on the raw `SHOW GRANTS` lines: the first grant is
//! normalized and must name a user, then each required privilege must
//! appear in at least one grant.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Privileges needed to take a consistent logical dump.
pub const DUMP_PRIVILEGES: &[&str] = &["RELOAD", "SELECT"];

/// Privileges some managed servers report that ordinary parsers reject.
const AURORA_PRIVILEGES: &[&str] = &[
    "LOAD FROM S3",
    "SELECT INTO S3",
    "INVOKE LAMBDA",
    "INVOKE SAGEMAKER",
    "INVOKE COMPREHEND",
];

/// Captures the grantee. Quoted names may contain their quote doubled
/// (`'o''brien'`); only one of the four groups matches.
static GRANT_USER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?is)^\s*GRANT\s+.+?\s+ON\s+.+?\s+TO\s+(?:'((?:[^']|'')*)'|"((?:[^"]|"")*)"|`((?:[^`]|``)*)`|([^'"`@\s]+))"#,
    )
    .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CheckState {
    Success,
    Failure,
}

/// Outcome of a privilege check.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub state: CheckState,
    pub error_msg: Option<String>,
    /// Statement an administrator can run to fix the failure.
    pub instruction: Option<String>,
}

impl CheckResult {
    fn new() -> Self {
        Self {
            name: "source db dump privilege checker".to_string(),
            state: CheckState::Failure,
            error_msg: None,
            instruction: None,
        }
    }

    fn fail(mut self, msg: String) -> Self {
        self.error_msg = Some(msg);
        self
    }

    fn succeed(mut self) -> Self {
        self.state = CheckState::Success;
        self
    }

    pub fn is_success(&self) -> bool {
        self.state == CheckState::Success
    }
}

/// Makes the first grant parseable: fills in password placeholders and
/// removes privileges that are specific to managed services.
pub fn normalize_grant(grant: &str) -> String {
    let mut g = grant.replacen(
        "IDENTIFIED BY PASSWORD <secret>",
        "IDENTIFIED BY PASSWORD 'secret'",
        1,
    );
    g = g.replacen(
        "IDENTIFIED BY PASSWORD WITH",
        "IDENTIFIED BY PASSWORD 'secret' WITH",
        1,
    );
    if g.ends_with("IDENTIFIED BY PASSWORD") {
        g.push_str(" 'secret'");
    }

    for p in AURORA_PRIVILEGES {
        g = g.replacen(p, "", 1);
        g = g.replace(", ,", ",");
    }
    g = g.replace("GRANT ,", "GRANT ");
    g.replace(",  ON", " ON")
}

/// Extracts the user name from a normalized `GRANT ... TO 'user'@'host'`.
fn grant_user(grant: &str) -> Option<String> {
    let caps = GRANT_USER_RE.captures(grant)?;
    let (user, quote) = [(1, "'"), (2, "\""), (3, "`"), (4, "")]
        .into_iter()
        .find_map(|(group, quote)| caps.get(group).map(|m| (m.as_str(), quote)))?;
    let user = if quote.is_empty() {
        user.to_string()
    } else {
        user.replace(&quote.repeat(2), quote)
    };
    Some(user).filter(|user| !user.is_empty())
}

/// Verifies that `grants` cover every privilege in `expected`.
pub fn verify_privileges(grants: &[String], expected: &[&str]) -> CheckResult {
    let result = CheckResult::new();
    let Some(first) = grants.first() else {
        return result.fail(
            "there is no such grant defined for current user on host '%'".to_string(),
        );
    };

    let normalized = normalize_grant(first);
    if !normalized.trim_start().to_uppercase().starts_with("GRANT") {
        return result.fail(format!("{} is not grant statement", first));
    }
    let Some(user) = grant_user(&normalized) else {
        return result.fail(format!("grant has not user {}", normalized));
    };

    if grants.iter().any(|g| g.contains("ALL PRIVILEGES")) {
        return result.succeed();
    }

    let lacking: Vec<&str> = expected
        .iter()
        .copied()
        .filter(|p| !grants.iter().any(|g| g.contains(p)))
        .collect();
    if lacking.is_empty() {
        return result.succeed();
    }

    let privileges = lacking.join(",");
    let mut result = result.fail(format!("lack of {} privilege", privileges));
    result.instruction = Some(format!(
        "GRANT {} ON *.* TO '{}'@'%';",
        privileges,
        user.replace('\'', "''")
    ));
    result
}
