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

//! # Runtime Context
//!
//! Sets up the worker pool the dump runs on. Tables are exported with
//! `rayon`'s `into_par_iter()`, so the size of the global pool bounds how many
//! tables are written at once.

use crate::config::AppConfig;
use log::info;

/// Share of the available cores used when neither `threads` nor
/// `cpu_percent` is configured.
pub const DEFAULT_CPU_PERCENT: u8 = 50;

/// `RuntimeContext` holds the resources that exist for the entire run.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeContext {
    /// The number of tables that can be exported at once.
    pub num_threads: usize,
}

impl RuntimeContext {
    /// Initializes the global thread pool.
    ///
    /// An explicit `threads` setting wins; otherwise the pool is sized from
    /// the CPU count scaled by `cpu_percent`.
    pub fn init(config: &AppConfig) -> Self {
        let cpu_percent = config.export.cpu_percent.unwrap_or(DEFAULT_CPU_PERCENT);
        let num_threads = worker_count(config.export.threads, cpu_percent, num_cpus::get());

        info!(
            "Initializing worker pool with {} threads (Target CPU: {}%)",
            num_threads, cpu_percent
        );

        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .unwrap_or_else(|e| {
                info!("Global thread pool already initialized: {}", e);
            });

        Self { num_threads }
    }
}

/// Number of workers for the given settings; never less than one.
pub fn worker_count(threads: Option<usize>, cpu_percent: u8, total_cpus: usize) -> usize {
    let n = threads
        .unwrap_or_else(|| (total_cpus as f64 * (cpu_percent as f64 / 100.0)).ceil() as usize);
    n.max(1)
}
