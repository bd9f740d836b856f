// SPDX-License-Identifier: MIT
//! Layered configuration loading for the orchestration service: defaults,
//! overlaid by discovered TOML files, overlaid by an explicit `--config` path.

mod loader;
mod schema;

pub use loader::load;
pub use schema::*;
