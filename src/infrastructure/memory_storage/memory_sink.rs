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

//! In-memory sink, used for dry runs and tests.

use crate::ports::sink_port::{ArtifactHandle, SinkPort};
use std::collections::BTreeMap;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

type Store = Arc<Mutex<BTreeMap<String, Vec<u8>>>>;

/// Keeps closed artifacts in a map keyed by name.
///
/// An artifact becomes visible only once its handle is closed.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    store: Store,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Names of all closed artifacts, sorted.
    pub fn names(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    pub fn content(&self, name: &str) -> Option<Vec<u8>> {
        self.lock().get(name).cloned()
    }

    pub fn content_str(&self, name: &str) -> Option<String> {
        self.content(name)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Total bytes across all closed artifacts.
    pub fn total_bytes(&self) -> u64 {
        self.lock().values().map(|v| v.len() as u64).sum()
    }
}

impl SinkPort for MemorySink {
    fn open(&self, name: &str) -> io::Result<Box<dyn ArtifactHandle>> {
        Ok(Box::new(MemoryHandle {
            store: self.store.clone(),
            name: name.to_string(),
            buf: Vec::new(),
        }))
    }
}

struct MemoryHandle {
    store: Store,
    name: String,
    buf: Vec<u8>,
}

impl ArtifactHandle for MemoryHandle {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    fn close(self: Box<Self>) -> io::Result<()> {
        let MemoryHandle { store, name, buf } = *self;
        let mut map = store.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if map.contains_key(&name) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("artifact '{}' already written", name),
            ));
        }
        map.insert(name, buf);
        Ok(())
    }
}
