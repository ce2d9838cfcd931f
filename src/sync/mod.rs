//! Synchronization of local scouting entries to the remote sheet endpoint.
//!
//! The coordinator pushes every unsynced entry as one batch and exposes an
//! idle/syncing/success/error status that settles back to idle after a delay.

mod coordinator;
mod sheets;
mod status;

pub use coordinator::*;
pub use sheets::*;
pub use status::*;
