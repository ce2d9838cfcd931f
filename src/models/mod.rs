//! Data models for the scouting backend.
//!
//! These models match the frontend TypeScript interfaces so persisted JSON stays interchangeable.

mod datastore;
mod entry;
mod roster;
mod schedule;
mod user;

pub use datastore::*;
pub use entry::*;
pub use roster::*;
pub use schedule::*;
pub use user::*;
