//! projectdesk
//!
//! Project assignment for two-person student teams. Students form teams,
//! teams wait on teacher-authored project queues, and a teacher-triggered
//! assignment pass binds one full queued team to each open project by
//! uniform random draw.
//!
//! The crate is split between the rule engine in [`board`] (domain model,
//! repository abstraction, service, HTTP router) and the infrastructure
//! modules ([`config`], [`error`], [`telemetry`]) shared with the API
//! binary.

pub mod board;
pub mod config;
pub mod error;
pub mod telemetry;
