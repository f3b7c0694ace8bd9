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

//! Infrastructure adapter writing artifacts to the local filesystem.

use crate::ports::sink_port::{ArtifactHandle, SinkPort};
use log::debug;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;

/// Concrete implementation of `SinkPort` for local filesystem storage.
///
/// Each artifact is written to a temporary file inside the output directory
/// and atomically renamed to its final name on `close`. A handle dropped
/// before `close` removes its temporary file, so an aborted table never
/// leaves a complete-looking artifact behind. An existing file is never
/// replaced: closing onto a taken name fails with `AlreadyExists`.
#[derive(Debug, Clone)]
pub struct LocalSinkAdapter {
    root: PathBuf,
}

impl LocalSinkAdapter {
    /// Creates the adapter, creating `root` if it does not exist yet.
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Joins `name` under the root, refusing names that would escape it.
    fn resolve(&self, name: &str) -> io::Result<PathBuf> {
        let relative = Path::new(name);
        let escapes = name.is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)));
        if escapes {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("artifact name '{}' is not a relative file name", name),
            ));
        }
        Ok(self.root.join(relative))
    }
}

impl SinkPort for LocalSinkAdapter {
    fn open(&self, name: &str) -> io::Result<Box<dyn ArtifactHandle>> {
        let final_path = self.resolve(name)?;
        let parent = final_path.parent().unwrap_or(self.root.as_path());
        fs::create_dir_all(parent)?;

        let temp_file = NamedTempFile::new_in(parent)?;
        debug!("Opened {} (staging {})", final_path.display(), temp_file.path().display());
        Ok(Box::new(LocalArtifactHandle {
            writer: BufWriter::with_capacity(128 * 1024, temp_file),
            final_path,
        }))
    }
}

/// An artifact staged in a temporary file next to its final path.
struct LocalArtifactHandle {
    writer: BufWriter<NamedTempFile>,
    final_path: PathBuf,
}

impl ArtifactHandle for LocalArtifactHandle {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.writer.write_all(bytes)
    }

    fn close(self: Box<Self>) -> io::Result<()> {
        let LocalArtifactHandle { writer, final_path } = *self;
        let temp_file = writer.into_inner().map_err(|e| e.into_error())?;
        temp_file.as_file().sync_all()?;
        temp_file.persist_noclobber(&final_path).map_err(|e| e.error)?;
        Ok(())
    }
}
