//! Platter application services.
//!
//! Cart and checkout services over storage collaborator traits, an in-memory store, JSON
//! views and a YAML scenario runner.

pub mod config;
pub mod context;
pub mod domain;
pub mod observability;
pub mod scenario;
pub mod stores;
pub mod views;

#[cfg(test)]
mod test;
