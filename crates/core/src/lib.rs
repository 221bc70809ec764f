//! Domain types and pure logic shared by every Hyde crate.
//!
//! Nothing in here talks to the network or the database. The retry
//! executor is the one async piece; it only sleeps.

pub mod error;
pub mod generation;
pub mod playlist;
pub mod retry;
pub mod session;
pub mod status;
pub mod transient;
pub mod types;
