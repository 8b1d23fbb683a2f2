use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use metrics_exporter_prometheus::PrometheusHandle;
use projectdesk::board::{
    Account, AccountId, BoardRepository, Project, ProjectId, ProjectStatus, RepositoryError, Team,
    TeamId,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local store backing the service until a relational database is
/// wired in. One mutex over all three maps keeps each repository call a
/// consistent snapshot.
#[derive(Default, Clone)]
pub(crate) struct InMemoryBoardRepository {
    state: Arc<Mutex<BoardState>>,
}

#[derive(Default)]
struct BoardState {
    accounts: HashMap<AccountId, Account>,
    teams: HashMap<TeamId, Team>,
    projects: HashMap<ProjectId, Project>,
}

impl BoardRepository for InMemoryBoardRepository {
    fn insert_account(&self, account: Account) -> Result<Account, RepositoryError> {
        let mut guard = self.state.lock().expect("board mutex poisoned");
        if guard.accounts.contains_key(&account.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    fn update_account(&self, account: Account) -> Result<(), RepositoryError> {
        let mut guard = self.state.lock().expect("board mutex poisoned");
        if !guard.accounts.contains_key(&account.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.accounts.insert(account.id, account);
        Ok(())
    }

    fn fetch_account(&self, id: &AccountId) -> Result<Option<Account>, RepositoryError> {
        let guard = self.state.lock().expect("board mutex poisoned");
        Ok(guard.accounts.get(id).cloned())
    }

    fn delete_account(&self, id: &AccountId) -> Result<(), RepositoryError> {
        let mut guard = self.state.lock().expect("board mutex poisoned");
        guard
            .accounts
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn username_taken(&self, username: &str) -> Result<bool, RepositoryError> {
        let guard = self.state.lock().expect("board mutex poisoned");
        Ok(guard
            .accounts
            .values()
            .any(|account| account.username.eq_ignore_ascii_case(username)))
    }

    fn email_taken(&self, email: &str) -> Result<bool, RepositoryError> {
        let guard = self.state.lock().expect("board mutex poisoned");
        Ok(guard
            .accounts
            .values()
            .any(|account| account.email.eq_ignore_ascii_case(email)))
    }

    fn student_no_taken(&self, student_no: u32) -> Result<bool, RepositoryError> {
        let guard = self.state.lock().expect("board mutex poisoned");
        Ok(guard.accounts.values().any(|account| {
            account
                .student_profile()
                .map(|profile| profile.student_no == student_no)
                .unwrap_or(false)
        }))
    }

    fn insert_team(&self, team: Team) -> Result<Team, RepositoryError> {
        let mut guard = self.state.lock().expect("board mutex poisoned");
        if guard.teams.contains_key(&team.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.teams.insert(team.id, team.clone());
        Ok(team)
    }

    fn update_team(&self, team: Team) -> Result<(), RepositoryError> {
        let mut guard = self.state.lock().expect("board mutex poisoned");
        if !guard.teams.contains_key(&team.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.teams.insert(team.id, team);
        Ok(())
    }

    fn fetch_team(&self, id: &TeamId) -> Result<Option<Team>, RepositoryError> {
        let guard = self.state.lock().expect("board mutex poisoned");
        Ok(guard.teams.get(id).cloned())
    }

    fn fetch_team_by_name(&self, name: &str) -> Result<Option<Team>, RepositoryError> {
        let guard = self.state.lock().expect("board mutex poisoned");
        Ok(guard
            .teams
            .values()
            .find(|team| team.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    fn delete_team(&self, id: &TeamId) -> Result<(), RepositoryError> {
        let mut guard = self.state.lock().expect("board mutex poisoned");
        guard
            .teams
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn list_teams(&self) -> Result<Vec<Team>, RepositoryError> {
        let guard = self.state.lock().expect("board mutex poisoned");
        Ok(guard.teams.values().cloned().collect())
    }

    fn insert_project(&self, project: Project) -> Result<Project, RepositoryError> {
        let mut guard = self.state.lock().expect("board mutex poisoned");
        if guard.projects.contains_key(&project.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.projects.insert(project.id, project.clone());
        Ok(project)
    }

    fn update_project(&self, project: Project) -> Result<(), RepositoryError> {
        let mut guard = self.state.lock().expect("board mutex poisoned");
        if !guard.projects.contains_key(&project.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.projects.insert(project.id, project);
        Ok(())
    }

    fn fetch_project(&self, id: &ProjectId) -> Result<Option<Project>, RepositoryError> {
        let guard = self.state.lock().expect("board mutex poisoned");
        Ok(guard.projects.get(id).cloned())
    }

    fn fetch_project_by_name(&self, name: &str) -> Result<Option<Project>, RepositoryError> {
        let guard = self.state.lock().expect("board mutex poisoned");
        Ok(guard
            .projects
            .values()
            .find(|project| project.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    fn delete_project(&self, id: &ProjectId) -> Result<(), RepositoryError> {
        let mut guard = self.state.lock().expect("board mutex poisoned");
        guard
            .projects
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn list_projects(&self) -> Result<Vec<Project>, RepositoryError> {
        let guard = self.state.lock().expect("board mutex poisoned");
        Ok(guard.projects.values().cloned().collect())
    }

    fn open_projects(&self) -> Result<Vec<Project>, RepositoryError> {
        let guard = self.state.lock().expect("board mutex poisoned");
        Ok(guard
            .projects
            .values()
            .filter(|project| {
                project.status == ProjectStatus::Open && project.assigned_team.is_none()
            })
            .cloned()
            .collect())
    }

    fn projects_by_author(&self, author: &AccountId) -> Result<Vec<Project>, RepositoryError> {
        let guard = self.state.lock().expect("board mutex poisoned");
        Ok(guard
            .projects
            .values()
            .filter(|project| project.author == *author)
            .cloned()
            .collect())
    }

    fn team_queued_anywhere(&self, team: &TeamId) -> Result<bool, RepositoryError> {
        let guard = self.state.lock().expect("board mutex poisoned");
        Ok(guard
            .projects
            .values()
            .any(|project| project.queued_teams.contains(team)))
    }

    fn purge_team_from_queues(&self, team: &TeamId) -> Result<(), RepositoryError> {
        let mut guard = self.state.lock().expect("board mutex poisoned");
        for project in guard.projects.values_mut() {
            project.queued_teams.remove(team);
        }
        Ok(())
    }
}
