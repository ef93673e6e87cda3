//! Domain models for billsync.
//!
//! These are the core types shared across all crates. Wire shapes sent to
//! the provider live in [`payment`] and [`customer`]; rows mirrored into the
//! tenant data store live in [`charge`] and [`credential`].

pub mod charge;
pub mod credential;
pub mod customer;
pub mod payment;
pub mod provider;
pub mod webhook;
