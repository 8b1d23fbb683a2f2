use super::domain::{Account, AccountId, Project, ProjectId, Team, TeamId};

/// Storage abstraction so the rule engine can be exercised in isolation.
///
/// Name lookups (`fetch_team_by_name`, `fetch_project_by_name`) and the
/// existence queries (`username_taken`, `email_taken`) compare
/// case-insensitively; uniqueness in this system is case-insensitive
/// throughout. Implementations back every method with the same store so a
/// single logical operation observes one consistent state.
pub trait BoardRepository: Send + Sync {
    // Accounts
    fn insert_account(&self, account: Account) -> Result<Account, RepositoryError>;
    fn update_account(&self, account: Account) -> Result<(), RepositoryError>;
    fn fetch_account(&self, id: &AccountId) -> Result<Option<Account>, RepositoryError>;
    fn delete_account(&self, id: &AccountId) -> Result<(), RepositoryError>;
    fn username_taken(&self, username: &str) -> Result<bool, RepositoryError>;
    fn email_taken(&self, email: &str) -> Result<bool, RepositoryError>;
    fn student_no_taken(&self, student_no: u32) -> Result<bool, RepositoryError>;

    // Teams
    fn insert_team(&self, team: Team) -> Result<Team, RepositoryError>;
    fn update_team(&self, team: Team) -> Result<(), RepositoryError>;
    fn fetch_team(&self, id: &TeamId) -> Result<Option<Team>, RepositoryError>;
    fn fetch_team_by_name(&self, name: &str) -> Result<Option<Team>, RepositoryError>;
    fn delete_team(&self, id: &TeamId) -> Result<(), RepositoryError>;
    fn list_teams(&self) -> Result<Vec<Team>, RepositoryError>;

    // Projects
    fn insert_project(&self, project: Project) -> Result<Project, RepositoryError>;
    fn update_project(&self, project: Project) -> Result<(), RepositoryError>;
    fn fetch_project(&self, id: &ProjectId) -> Result<Option<Project>, RepositoryError>;
    fn fetch_project_by_name(&self, name: &str) -> Result<Option<Project>, RepositoryError>;
    fn delete_project(&self, id: &ProjectId) -> Result<(), RepositoryError>;
    fn list_projects(&self) -> Result<Vec<Project>, RepositoryError>;
    fn open_projects(&self) -> Result<Vec<Project>, RepositoryError>;
    fn projects_by_author(&self, author: &AccountId) -> Result<Vec<Project>, RepositoryError>;
    fn team_queued_anywhere(&self, team: &TeamId) -> Result<bool, RepositoryError>;
    fn purge_team_from_queues(&self, team: &TeamId) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
