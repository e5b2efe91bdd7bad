//! Copy a knowledge-base collection into another one, translating every
//! document and keeping its place in the hierarchy.
//!
//! A run is resumable: the [`ledger::Ledger`] records every source document
//! that has a translated counterpart, so later runs only pick up new or
//! modified documents and never recreate folders.

pub mod budget;
pub mod config;
pub mod document;
pub mod folder;
pub mod hierarchy;
pub mod ledger;
pub mod metrics;
pub mod migrate;
pub mod translate;
pub mod ui;

#[cfg(test)]
mod testing;
