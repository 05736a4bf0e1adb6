//! shardsync Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `Manifest`, `SyncRequest`, `SyncPlan`, `DeletionList`, `SyncRun`
//! - **Install rules** - protected subtrees and the merge target
//! - **Port definitions** - Traits for adapters: `IUpdateAuthority`, `ISyncObserver`
//! - **Configuration** - YAML configuration with validation and a builder
//!
//! # Architecture
//!
//! The domain module contains pure business logic with no I/O.
//! Ports define trait interfaces that adapter crates implement: the HTTP
//! client implements `IUpdateAuthority`, front-ends implement
//! `ISyncObserver` to receive progress and status lines.

pub mod config;
pub mod domain;
pub mod ports;
