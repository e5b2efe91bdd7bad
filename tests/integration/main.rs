//! Integration tests driving the `kb-migrate` binary.

mod cli;
mod ledger;
