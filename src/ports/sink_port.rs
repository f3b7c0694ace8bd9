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

//! # Sink Port
//!
//! This Port defines the contract for "where the bytes go". The writers only
//! ever open a named artifact, write bytes into it and close it. Whether that
//! ends up on a local disk or in an object store is an adapter's concern.

use std::io;

/// `SinkPort` opens artifacts for writing.
///
/// Implementations must be safe to use from several table writers at once;
/// each writer only ever touches its own artifact names.
pub trait SinkPort: Send + Sync {
    /// Opens a new artifact called `name` for writing.
    fn open(&self, name: &str) -> io::Result<Box<dyn ArtifactHandle>>;
}

/// An open artifact.
///
/// Bytes are only registered as a complete artifact once `close` returns
/// `Ok`. Dropping a handle without closing it discards what was written.
pub trait ArtifactHandle: Send {
    /// Appends bytes to the artifact.
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Finalizes the artifact.
    fn close(self: Box<Self>) -> io::Result<()>;
}
