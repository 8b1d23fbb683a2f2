use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Identifier wrapper for accounts (students and teachers alike).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct AccountId(pub u64);

/// Identifier wrapper for teams.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TeamId(pub u64);

/// Identifier wrapper for projects.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ProjectId(pub u64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Salted SHA-256 password credential. Never exposed through views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordHash {
    salt: String,
    digest: String,
}

impl PasswordHash {
    pub fn new(password: &str) -> Self {
        let salt: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(16)
            .map(char::from)
            .collect();
        let digest = Self::digest_with(&salt, password);
        Self { salt, digest }
    }

    pub fn verify(&self, password: &str) -> bool {
        Self::digest_with(&self.salt, password) == self.digest
    }

    fn digest_with(salt: &str, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(password.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// Shared identity payload for every signed-up user, with the role carried
/// as a sum type so permission checks are plain pattern matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    pub credential: PasswordHash,
    pub role: AccountRole,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn is_teacher(&self) -> bool {
        matches!(self.role, AccountRole::Teacher)
    }

    pub fn student_profile(&self) -> Option<&StudentProfile> {
        match &self.role {
            AccountRole::Student(profile) => Some(profile),
            AccountRole::Teacher => None,
        }
    }

    pub fn student_profile_mut(&mut self) -> Option<&mut StudentProfile> {
        match &mut self.role {
            AccountRole::Student(profile) => Some(profile),
            AccountRole::Teacher => None,
        }
    }

    pub fn view(&self) -> AccountView {
        let profile = self.student_profile();
        AccountView {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: match self.role {
                AccountRole::Teacher => "teacher",
                AccountRole::Student(_) => "student",
            },
            student_no: profile.map(|p| p.student_no),
            team: profile.and_then(|p| p.team),
            status: profile.map(|p| p.status.label()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    Teacher,
    Student(StudentProfile),
}

/// Student-only fields. `team` is a denormalized back-pointer that the
/// service keeps in lock-step with the owning team's slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub student_no: u32,
    pub team: Option<TeamId>,
    pub status: StudentStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentStatus {
    Unassigned,
    Assigned,
}

impl StudentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            StudentStatus::Unassigned => "unassigned",
            StudentStatus::Assigned => "assigned",
        }
    }
}

/// A two-person team. The first slot is always filled preferentially, so a
/// one-person team always has its member in `first_teammate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub first_teammate: Option<AccountId>,
    pub second_teammate: Option<AccountId>,
}

impl Team {
    pub fn is_full(&self) -> bool {
        self.first_teammate.is_some() && self.second_teammate.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.first_teammate.is_none() && self.second_teammate.is_none()
    }

    pub fn members(&self) -> Vec<AccountId> {
        self.first_teammate
            .into_iter()
            .chain(self.second_teammate)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Open,
    Closed,
}

impl ProjectStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ProjectStatus::Open => "open",
            ProjectStatus::Closed => "closed",
        }
    }
}

/// A teacher-authored project. `queued_teams` is a set: insertion order
/// carries no meaning, the lottery draws uniformly from the full teams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub author: AccountId,
    pub assigned_team: Option<TeamId>,
    pub queued_teams: BTreeSet<TeamId>,
    pub created_at: DateTime<Utc>,
}

impl Project {
    pub fn view(&self) -> ProjectView {
        ProjectView {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            status: self.status.label(),
            author: self.author,
            assigned_team: self.assigned_team,
            queued_teams: self.queued_teams.iter().copied().collect(),
        }
    }
}

/// Registration payload for a new student account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStudent {
    pub username: String,
    pub email: String,
    pub password: String,
    pub student_no: u32,
}

/// Registration payload for a new teacher account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTeacher {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Sanitized account representation for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct AccountView {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    pub role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_no: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<TeamId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
}

/// One resolved team slot in a [`TeamView`].
#[derive(Debug, Clone, Serialize)]
pub struct TeamMemberView {
    pub id: AccountId,
    pub username: String,
    pub student_no: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamView {
    pub id: TeamId,
    pub name: String,
    pub members: Vec<TeamMemberView>,
    pub full: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectView {
    pub id: ProjectId,
    pub name: String,
    pub description: String,
    pub status: &'static str,
    pub author: AccountId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_team: Option<TeamId>,
    pub queued_teams: Vec<TeamId>,
}
