//! # CLI Module
//!
//! Command-line interface of the `grip-gen` binary.
//!
//! ## Commands
//!
//! ### `build-schema`
//!
//! Compile a configuration document into a project:
//!
//! ```bash
//! grip-gen build-schema --config grip.yaml --project-name shop [--force]
//! ```
//!
//! Writes `<project_home>/shop.graphql`, the handler and resolver modules,
//! `src/main.rs` and `Cargo.toml`. Existing files are only replaced with
//! `--force`.
//!
//! ### `load-schema`
//!
//! Regenerate bootstrap sources against an existing schema file:
//!
//! ```bash
//! grip-gen load-schema --config grip.yaml --schema shop.graphql [--force]
//! ```
//!
//! ### `lint`
//!
//! ```bash
//! grip-gen lint --config grip.yaml [--fail-on-error] [--errors-only]
//! ```
//!
//! ### `inspect`
//!
//! Print the schema a configuration compiles to:
//!
//! ```bash
//! grip-gen inspect --config grip.yaml
//! ```
//!
//! ## Global Options
//!
//! - `--log-level <LEVEL>` - overrides `GRIP_LOG_LEVEL`
//! - `--log-format <json|pretty>` - overrides `GRIP_LOG_FORMAT`
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use grip::cli::{Cli, run_cli};
//! use clap::Parser;
//!
//! run_cli(&Cli::parse())?;
//! ```

mod commands;

pub use commands::*;
