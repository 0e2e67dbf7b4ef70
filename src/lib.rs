//! Aggregation and filtering for school dashboard snapshots.
//!
//! Views hand the engine in [`aggregate`] the collections they fetched and
//! render what comes back. [`summary`] composes the statistics each dashboard
//! view shows; [`snapshot`] and [`report`] serve the command-line tool.

pub mod aggregate;
pub mod config;
pub mod dates;
pub mod logging;
pub mod models;
pub mod report;
pub mod snapshot;
pub mod summary;
