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

//! # SQL Exporter
//!
//! A multi-threaded logical dump tool that writes databases as SQL scripts:
//! one creation script per database, table and view, and table data as
//! `INSERT` statements split into size-bounded files.
//!
//! This crate follows the **Hexagonal Architecture** (Ports and Adapters)
//! to keep the dump logic separate from where rows come from and where
//! artifacts go.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ports;
