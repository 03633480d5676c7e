//! Background Schedulers
//!
//! ## Follower Puller
//! While this node is a connected follower, pulls the leader's export every
//! `sync_interval_secs` (re-read from the role record each cycle). Ticks
//! share the engine's pull guard with manual `POST /api/sync/pull`, so a
//! tick that overlaps a running import is skipped. Transient failures back
//! off exponentially (base and cap from `AppConfig`).
//!
//! ## Stale Sweep
//! While leader, marks online nodes offline once they have been silent for
//! `stale_after_intervals` of their own sync intervals.

mod backoff;
mod puller;
mod stale_sweep;

pub use backoff::Backoff;
pub use puller::start_follower_puller;
pub use stale_sweep::start_stale_sweep;
