//! Integration tests for shardsync-client
//!
//! Uses wiremock to simulate the update server and verifies end-to-end
//! behavior of reconciliation, artifact downloads, and the deletion list.

mod common;

mod test_delete_list;
mod test_download;
mod test_reconcile;
