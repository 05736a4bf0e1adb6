//! End-to-end tests for shardsync-sync
//!
//! Runs the orchestrator against a wiremock update server through the real
//! HTTP authority, with archives built in the tests and temporary game
//! directories.

mod common;

mod test_deletion;
mod test_install;
mod test_reconcile;
