use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;

use super::domain::{
    Account, AccountId, AccountRole, AccountView, NewStudent, NewTeacher, PasswordHash, Project,
    ProjectId, ProjectStatus, ProjectView, StudentProfile, StudentStatus, Team, TeamId,
    TeamMemberView, TeamView,
};
use super::lottery;
use super::repository::{BoardRepository, RepositoryError};

static ACCOUNT_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static TEAM_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static PROJECT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_account_id() -> AccountId {
    AccountId(ACCOUNT_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

fn next_team_id() -> TeamId {
    TeamId(TEAM_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

fn next_project_id() -> ProjectId {
    ProjectId(PROJECT_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

/// The membership and queue rule engine.
///
/// Every operation is check-then-act: all guard conditions are evaluated
/// before any write, so a failed call leaves the store untouched. Writes
/// that span entities (a team's slots and its members' back-pointers)
/// happen within the same call, keeping the two sides in lock-step.
pub struct BoardService<R> {
    repository: Arc<R>,
}

impl<R> BoardService<R>
where
    R: BoardRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    // ---- account lifecycle ----

    pub fn create_student(&self, registration: NewStudent) -> Result<Account, BoardServiceError> {
        if self.repository.username_taken(&registration.username)? {
            return Err(BoardServiceError::UsernameAlreadyExists);
        }
        if self.repository.email_taken(&registration.email)? {
            return Err(BoardServiceError::EmailAlreadyExists);
        }
        if self.repository.student_no_taken(registration.student_no)? {
            return Err(BoardServiceError::StudentNumberAlreadyExists);
        }

        let account = Account {
            id: next_account_id(),
            username: registration.username,
            email: registration.email,
            credential: PasswordHash::new(&registration.password),
            role: AccountRole::Student(StudentProfile {
                student_no: registration.student_no,
                team: None,
                status: StudentStatus::Unassigned,
            }),
            created_at: Utc::now(),
        };
        Ok(self.repository.insert_account(account)?)
    }

    pub fn create_teacher(&self, registration: NewTeacher) -> Result<Account, BoardServiceError> {
        if self.repository.username_taken(&registration.username)? {
            return Err(BoardServiceError::UsernameAlreadyExists);
        }
        if self.repository.email_taken(&registration.email)? {
            return Err(BoardServiceError::EmailAlreadyExists);
        }

        let account = Account {
            id: next_account_id(),
            username: registration.username,
            email: registration.email,
            credential: PasswordHash::new(&registration.password),
            role: AccountRole::Teacher,
            created_at: Utc::now(),
        };
        Ok(self.repository.insert_account(account)?)
    }

    pub fn change_password(
        &self,
        actor: &AccountId,
        current: &str,
        new: &str,
    ) -> Result<(), BoardServiceError> {
        let mut account = self.account(actor)?;
        if !account.credential.verify(current) {
            return Err(BoardServiceError::InvalidPassword);
        }

        account.credential = PasswordHash::new(new);
        Ok(self.repository.update_account(account)?)
    }

    pub fn change_email(
        &self,
        actor: &AccountId,
        new_email: &str,
    ) -> Result<Account, BoardServiceError> {
        let mut account = self.account(actor)?;
        // The check runs against every account, the caller's own current
        // address included.
        if self.repository.email_taken(new_email)? {
            return Err(BoardServiceError::EmailAlreadyExists);
        }

        account.email = new_email.to_string();
        self.repository.update_account(account.clone())?;
        Ok(account)
    }

    /// Students must leave their team first; a teacher takes their
    /// unassigned projects with them, while assigned projects stay behind
    /// as permanent records.
    pub fn delete_account(&self, actor: &AccountId) -> Result<(), BoardServiceError> {
        let account = self.account(actor)?;
        if let Some(profile) = account.student_profile() {
            if profile.team.is_some() {
                return Err(BoardServiceError::UserAlreadyInTeam);
            }
        }

        if account.is_teacher() {
            for project in self.repository.projects_by_author(actor)? {
                if project.assigned_team.is_none() {
                    self.repository.delete_project(&project.id)?;
                }
            }
        }

        Ok(self.repository.delete_account(actor)?)
    }

    // ---- team membership ----

    pub fn create_team(&self, actor: &AccountId, name: &str) -> Result<Team, BoardServiceError> {
        let mut account = self.account(actor)?;
        let profile = account
            .student_profile_mut()
            .ok_or(BoardServiceError::MustBeStudent)?;
        if profile.team.is_some() {
            return Err(BoardServiceError::UserAlreadyInTeam);
        }
        if self.repository.fetch_team_by_name(name)?.is_some() {
            return Err(BoardServiceError::TeamNameAlreadyExists);
        }

        let team = Team {
            id: next_team_id(),
            name: name.to_string(),
            first_teammate: Some(*actor),
            second_teammate: None,
        };
        let team = self.repository.insert_team(team)?;

        profile.team = Some(team.id);
        self.repository.update_account(account)?;
        Ok(team)
    }

    pub fn join_team(&self, actor: &AccountId, team: &TeamId) -> Result<Team, BoardServiceError> {
        let mut account = self.account(actor)?;
        let profile = account
            .student_profile_mut()
            .ok_or(BoardServiceError::MustBeStudent)?;
        if profile.team.is_some() {
            return Err(BoardServiceError::UserAlreadyInTeam);
        }

        let mut team = self
            .repository
            .fetch_team(team)?
            .ok_or(BoardServiceError::InvalidTeam)?;
        if team.is_full() {
            return Err(BoardServiceError::TeamIsFull);
        }

        // First slot preferred over second.
        if team.first_teammate.is_none() {
            team.first_teammate = Some(*actor);
        } else {
            team.second_teammate = Some(*actor);
        }
        self.repository.update_team(team.clone())?;

        profile.team = Some(team.id);
        self.repository.update_account(account)?;
        Ok(team)
    }

    pub fn leave_team(&self, actor: &AccountId) -> Result<(), BoardServiceError> {
        let mut account = self.account(actor)?;
        let profile = account
            .student_profile_mut()
            .ok_or(BoardServiceError::MustBeStudent)?;
        let team_id = profile.team.ok_or(BoardServiceError::UserNotInTeam)?;
        if profile.status == StudentStatus::Assigned {
            return Err(BoardServiceError::UserAssignedToProject);
        }

        let mut team = self
            .repository
            .fetch_team(&team_id)?
            .ok_or(BoardServiceError::InvalidTeam)?;

        if team.first_teammate.as_ref() == Some(actor) {
            // Slot compaction: the remaining member, if any, moves up so the
            // first slot stays the canonical non-null one.
            team.first_teammate = team.second_teammate.take();
        } else if team.second_teammate.as_ref() == Some(actor) {
            team.second_teammate = None;
        }

        if team.is_empty() {
            self.repository.purge_team_from_queues(&team.id)?;
            self.repository.delete_team(&team.id)?;
        } else {
            self.repository.update_team(team)?;
        }

        profile.team = None;
        Ok(self.repository.update_account(account)?)
    }

    // ---- project queue ----

    pub fn queue_join(
        &self,
        actor: &AccountId,
        project: &ProjectId,
    ) -> Result<Project, BoardServiceError> {
        let account = self.account(actor)?;
        let profile = account
            .student_profile()
            .ok_or(BoardServiceError::MustBeStudent)?;
        let team_id = profile.team.ok_or(BoardServiceError::UserNotInTeam)?;

        let mut project = self
            .repository
            .fetch_project(project)?
            .ok_or(BoardServiceError::InvalidProject)?;
        // One queue per team, system-wide.
        if self.repository.team_queued_anywhere(&team_id)? {
            return Err(BoardServiceError::TeamAlreadyInProjectQueue);
        }
        if project.assigned_team.is_some() {
            return Err(BoardServiceError::ProjectHasAssignedTeam);
        }

        project.queued_teams.insert(team_id);
        self.repository.update_project(project.clone())?;
        Ok(project)
    }

    pub fn queue_leave(
        &self,
        actor: &AccountId,
        project: &ProjectId,
    ) -> Result<Project, BoardServiceError> {
        let account = self.account(actor)?;
        let profile = account
            .student_profile()
            .ok_or(BoardServiceError::MustBeStudent)?;
        let team_id = profile.team.ok_or(BoardServiceError::UserNotInTeam)?;

        let mut project = self
            .repository
            .fetch_project(project)?
            .ok_or(BoardServiceError::InvalidProject)?;
        if !project.queued_teams.contains(&team_id) {
            return Err(BoardServiceError::TeamNotInProjectQueue);
        }
        if project.assigned_team.is_some() {
            return Err(BoardServiceError::ProjectHasAssignedTeam);
        }

        project.queued_teams.remove(&team_id);
        self.repository.update_project(project.clone())?;
        Ok(project)
    }

    // ---- project lifecycle ----

    pub fn create_project(
        &self,
        actor: &AccountId,
        name: &str,
        description: &str,
    ) -> Result<Project, BoardServiceError> {
        let account = self.account(actor)?;
        if !account.is_teacher() {
            return Err(BoardServiceError::MustBeTeacher);
        }
        if self.repository.fetch_project_by_name(name)?.is_some() {
            return Err(BoardServiceError::ProjectNameAlreadyExists);
        }

        let project = Project {
            id: next_project_id(),
            name: name.to_string(),
            description: description.to_string(),
            status: ProjectStatus::Open,
            author: *actor,
            assigned_team: None,
            queued_teams: BTreeSet::new(),
            created_at: Utc::now(),
        };
        Ok(self.repository.insert_project(project)?)
    }

    pub fn edit_project(
        &self,
        actor: &AccountId,
        project: &ProjectId,
        name: &str,
        description: &str,
    ) -> Result<Project, BoardServiceError> {
        let mut project = self
            .repository
            .fetch_project(project)?
            .ok_or(BoardServiceError::InvalidProject)?;
        if project.author != *actor {
            return Err(BoardServiceError::MustBeAuthor);
        }
        if let Some(existing) = self.repository.fetch_project_by_name(name)? {
            if existing.id != project.id {
                return Err(BoardServiceError::ProjectNameAlreadyExists);
            }
        }

        project.name = name.to_string();
        project.description = description.to_string();
        self.repository.update_project(project.clone())?;
        Ok(project)
    }

    pub fn delete_project(
        &self,
        actor: &AccountId,
        project: &ProjectId,
    ) -> Result<(), BoardServiceError> {
        let account = self.account(actor)?;
        if !account.is_teacher() {
            return Err(BoardServiceError::MustBeTeacher);
        }

        let project = self
            .repository
            .fetch_project(project)?
            .ok_or(BoardServiceError::InvalidProject)?;
        if project.assigned_team.is_some() {
            return Err(BoardServiceError::ProjectHasAssignedTeam);
        }

        Ok(self.repository.delete_project(&project.id)?)
    }

    // ---- assignment pass ----

    /// Run the lottery over every open, unassigned project and return how
    /// many received a team.
    ///
    /// Each project is its own unit of work: a pass interrupted midway
    /// leaves already-processed projects correctly closed and the rest
    /// untouched, and re-running skips anything already assigned.
    pub fn run_assignment(&self, actor: &AccountId) -> Result<usize, BoardServiceError> {
        self.run_assignment_with_rng(actor, &mut rand::thread_rng())
    }

    pub(crate) fn run_assignment_with_rng<G: rand::Rng>(
        &self,
        actor: &AccountId,
        rng: &mut G,
    ) -> Result<usize, BoardServiceError> {
        let account = self.account(actor)?;
        if !account.is_teacher() {
            return Err(BoardServiceError::MustBeTeacher);
        }

        let mut assigned = 0;
        for mut project in self.repository.open_projects()? {
            if project.assigned_team.is_some() {
                continue;
            }

            let mut queued = Vec::with_capacity(project.queued_teams.len());
            for team_id in &project.queued_teams {
                let team = self
                    .repository
                    .fetch_team(team_id)?
                    .ok_or(BoardServiceError::InvalidTeam)?;
                queued.push(team);
            }

            let eligible = lottery::eligible_teams(&queued);
            let Some(winner) = lottery::draw_winner(rng, &eligible) else {
                continue;
            };

            let winning_team = queued
                .iter()
                .find(|team| team.id == winner)
                .cloned()
                .ok_or(BoardServiceError::InvalidTeam)?;
            for member in winning_team.members() {
                let mut member_account = self.account(&member)?;
                if let Some(profile) = member_account.student_profile_mut() {
                    profile.status = StudentStatus::Assigned;
                }
                self.repository.update_account(member_account)?;
            }

            project.assigned_team = Some(winner);
            project.queued_teams.clear();
            project.status = ProjectStatus::Closed;
            self.repository.update_project(project)?;
            assigned += 1;
        }

        Ok(assigned)
    }

    // ---- read side ----

    pub fn account_view(&self, id: &AccountId) -> Result<AccountView, BoardServiceError> {
        Ok(self.account(id)?.view())
    }

    pub fn team_view(&self, id: &TeamId) -> Result<TeamView, BoardServiceError> {
        let team = self
            .repository
            .fetch_team(id)?
            .ok_or(BoardServiceError::InvalidTeam)?;
        self.resolve_team_view(&team)
    }

    pub fn list_team_views(&self) -> Result<Vec<TeamView>, BoardServiceError> {
        let mut views = Vec::new();
        for team in self.repository.list_teams()? {
            views.push(self.resolve_team_view(&team)?);
        }
        Ok(views)
    }

    pub fn project_view(&self, id: &ProjectId) -> Result<ProjectView, BoardServiceError> {
        let project = self
            .repository
            .fetch_project(id)?
            .ok_or(BoardServiceError::InvalidProject)?;
        Ok(project.view())
    }

    pub fn list_project_views(&self) -> Result<Vec<ProjectView>, BoardServiceError> {
        Ok(self
            .repository
            .list_projects()?
            .iter()
            .map(Project::view)
            .collect())
    }

    fn resolve_team_view(&self, team: &Team) -> Result<TeamView, BoardServiceError> {
        let mut members = Vec::new();
        for member in team.members() {
            let account = self.account(&member)?;
            let student_no = account
                .student_profile()
                .map(|profile| profile.student_no)
                .unwrap_or_default();
            members.push(TeamMemberView {
                id: account.id,
                username: account.username,
                student_no,
            });
        }
        Ok(TeamView {
            id: team.id,
            name: team.name.clone(),
            members,
            full: team.is_full(),
        })
    }

    fn account(&self, id: &AccountId) -> Result<Account, BoardServiceError> {
        Ok(self
            .repository
            .fetch_account(id)?
            .ok_or(RepositoryError::NotFound)?)
    }
}

/// The closed set of failures a rule-engine operation can signal. All of
/// them are expected, caller-recoverable conditions; the calling layer owns
/// the translation to user-visible messages and HTTP statuses.
#[derive(Debug, thiserror::Error)]
pub enum BoardServiceError {
    #[error("only students may do this")]
    MustBeStudent,
    #[error("only teachers may do this")]
    MustBeTeacher,
    #[error("only the project author may edit it")]
    MustBeAuthor,
    #[error("user already belongs to a team")]
    UserAlreadyInTeam,
    #[error("user does not belong to a team")]
    UserNotInTeam,
    #[error("team already has two members")]
    TeamIsFull,
    #[error("team is already waiting on a project queue")]
    TeamAlreadyInProjectQueue,
    #[error("team is not in this project's queue")]
    TeamNotInProjectQueue,
    #[error("project already has an assigned team")]
    ProjectHasAssignedTeam,
    #[error("user's team is assigned to a project")]
    UserAssignedToProject,
    #[error("username is already taken")]
    UsernameAlreadyExists,
    #[error("email is already taken")]
    EmailAlreadyExists,
    #[error("student number is already taken")]
    StudentNumberAlreadyExists,
    #[error("team name is already taken")]
    TeamNameAlreadyExists,
    #[error("project name is already taken")]
    ProjectNameAlreadyExists,
    #[error("project does not exist")]
    InvalidProject,
    #[error("team does not exist")]
    InvalidTeam,
    #[error("current password does not match")]
    InvalidPassword,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
