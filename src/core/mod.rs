// src/core/mod.rs

/// Immutable scan settings and the fixed resolver roster.
pub mod config;

/// Host records, TLS version labels, and the three-way probe outcome.
pub mod models;

/// The probes and the per-host record assembler.
pub mod scanner;

/// Reading hostname lists and reading/writing the JSON record file.
pub mod store;
