use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::board::domain::{
    Account, AccountId, NewStudent, NewTeacher, Project, ProjectId, ProjectStatus, Team, TeamId,
};
use crate::board::repository::{BoardRepository, RepositoryError};
use crate::board::service::BoardService;

#[derive(Default, Clone)]
pub(super) struct MemoryBoard {
    state: Arc<Mutex<BoardState>>,
}

#[derive(Default)]
struct BoardState {
    accounts: HashMap<AccountId, Account>,
    teams: HashMap<TeamId, Team>,
    projects: HashMap<ProjectId, Project>,
}

impl MemoryBoard {
    pub(super) fn account(&self, id: &AccountId) -> Option<Account> {
        self.state
            .lock()
            .expect("board mutex poisoned")
            .accounts
            .get(id)
            .cloned()
    }

    pub(super) fn team(&self, id: &TeamId) -> Option<Team> {
        self.state
            .lock()
            .expect("board mutex poisoned")
            .teams
            .get(id)
            .cloned()
    }

    pub(super) fn project(&self, id: &ProjectId) -> Option<Project> {
        self.state
            .lock()
            .expect("board mutex poisoned")
            .projects
            .get(id)
            .cloned()
    }

    pub(super) fn put_account(&self, account: Account) {
        let mut guard = self.state.lock().expect("board mutex poisoned");
        guard.accounts.insert(account.id, account);
    }

    pub(super) fn put_project(&self, project: Project) {
        let mut guard = self.state.lock().expect("board mutex poisoned");
        guard.projects.insert(project.id, project);
    }
}

impl BoardRepository for MemoryBoard {
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
        Ok(self.account(id))
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
        Ok(self.team(id))
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
        Ok(self.project(id))
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

pub(super) fn build_service() -> (BoardService<MemoryBoard>, Arc<MemoryBoard>) {
    let repository = Arc::new(MemoryBoard::default());
    let service = BoardService::new(repository.clone());
    (service, repository)
}

pub(super) fn enroll_student(
    service: &BoardService<MemoryBoard>,
    username: &str,
    student_no: u32,
) -> Account {
    service
        .create_student(NewStudent {
            username: username.to_string(),
            email: format!("{username}@example.edu"),
            password: "correct horse".to_string(),
            student_no,
        })
        .expect("student registration succeeds")
}

pub(super) fn enroll_teacher(service: &BoardService<MemoryBoard>, username: &str) -> Account {
    service
        .create_teacher(NewTeacher {
            username: username.to_string(),
            email: format!("{username}@example.edu"),
            password: "correct horse".to_string(),
        })
        .expect("teacher registration succeeds")
}

/// Two students on one full team, ready to queue.
pub(super) fn full_team(
    service: &BoardService<MemoryBoard>,
    name: &str,
    first: &str,
    second: &str,
    base_no: u32,
) -> (Account, Account, Team) {
    let first = enroll_student(service, first, base_no);
    let second = enroll_student(service, second, base_no + 1);
    let team = service
        .create_team(&first.id, name)
        .expect("team creation succeeds");
    let team = service
        .join_team(&second.id, &team.id)
        .expect("second member joins");
    (first, second, team)
}
