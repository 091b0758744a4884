//! hostprobe: unauthenticated reconnaissance of a list of hostnames.
//!
//! `core` runs the probes and assembles one record per host; `report` turns
//! the record file into plain-text tables.
pub mod core;
pub mod logging;
pub mod report;
