//! innkeep — hotel reservation staging and availability engine.
//!
//! Rooms live in memory behind per-room locks, durably backed by an
//! append-only WAL. The guest-facing flow (validate, stage per session,
//! recompute totals, confirm) sits in [`service`]; the no-double-booking
//! guarantee is enforced in [`engine`].

pub mod audit;
pub mod booking;
pub mod config;
pub mod engine;
mod limits;
pub mod model;
pub mod observability;
pub mod service;
pub mod stage;
pub mod sweeper;
pub mod wal;
