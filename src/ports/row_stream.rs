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

//! Row stream helpers.
//!
//! A row stream is any `Iterator<Item = Result<Row>>`: `None` is end of data,
//! `Err` is a fetch failure. Cancellation is signalled in-band as
//! `ExportError::Cancelled` so writers honour it between rows.

use crate::domain::entities::Row;
use crate::domain::errors::{ExportError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag that aborts every stream wrapped with it.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Wraps a row stream so it yields `Cancelled` once the flag is raised.
pub struct Cancellable<I> {
    inner: I,
    flag: CancelFlag,
    done: bool,
}

impl<I> Cancellable<I> {
    pub fn new(inner: I, flag: CancelFlag) -> Self {
        Self {
            inner,
            flag,
            done: false,
        }
    }
}

impl<I> Iterator for Cancellable<I>
where
    I: Iterator<Item = Result<Row>>,
{
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.flag.is_cancelled() {
            self.done = true;
            return Some(Err(ExportError::Cancelled));
        }
        self.inner.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellable_passes_rows_through() {
        let rows = vec![Ok(vec![Some("1".to_string())]), Ok(vec![None])];
        let stream = Cancellable::new(rows.into_iter(), CancelFlag::new());
        assert_eq!(stream.map(|r| r.unwrap()).count(), 2);
    }

    #[test]
    fn test_cancellable_stops_after_flag() {
        let flag = CancelFlag::new();
        let rows = (0..10).map(|i| Ok(vec![Some(i.to_string())]));
        let mut stream = Cancellable::new(rows, flag.clone());

        assert!(stream.next().unwrap().is_ok());
        flag.cancel();
        assert!(matches!(stream.next(), Some(Err(ExportError::Cancelled))));
        assert!(stream.next().is_none());
    }
}
