//! Team membership, project queueing, and the assignment lottery.
//!
//! The rules live in [`service::BoardService`]; persistence is abstracted
//! behind [`repository::BoardRepository`] so request handlers, the demo,
//! and tests can all drive the same engine against different stores.

pub mod domain;
mod lottery;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Account, AccountId, AccountRole, AccountView, NewStudent, NewTeacher, PasswordHash, Project,
    ProjectId, ProjectStatus, ProjectView, StudentProfile, StudentStatus, Team, TeamId,
    TeamMemberView, TeamView,
};
pub use repository::{BoardRepository, RepositoryError};
pub use router::board_router;
pub use service::{BoardService, BoardServiceError};
