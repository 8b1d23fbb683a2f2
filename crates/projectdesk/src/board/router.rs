use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{AccountId, NewStudent, NewTeacher, ProjectId, TeamId};
use super::repository::{BoardRepository, RepositoryError};
use super::service::{BoardService, BoardServiceError};

/// Router builder exposing the rule engine over HTTP.
///
/// Callers are expected to arrive already authenticated; the `actor_id`
/// carried by the mutating payloads identifies who acts, and the engine
/// itself decides whether that account is allowed to.
pub fn board_router<R>(service: Arc<BoardService<R>>) -> Router
where
    R: BoardRepository + 'static,
{
    Router::new()
        .route("/api/v1/accounts", post(create_account::<R>))
        .route(
            "/api/v1/accounts/:account_id",
            get(account_detail::<R>).delete(delete_account::<R>),
        )
        .route(
            "/api/v1/accounts/:account_id/password",
            post(change_password::<R>),
        )
        .route("/api/v1/accounts/:account_id/email", post(change_email::<R>))
        .route(
            "/api/v1/teams",
            get(list_teams::<R>).post(create_team::<R>),
        )
        .route("/api/v1/teams/leave", post(leave_team::<R>))
        .route("/api/v1/teams/:team_id", get(team_detail::<R>))
        .route("/api/v1/teams/:team_id/join", post(join_team::<R>))
        .route(
            "/api/v1/projects",
            get(list_projects::<R>).post(create_project::<R>),
        )
        .route(
            "/api/v1/projects/:project_id",
            get(project_detail::<R>)
                .put(edit_project::<R>)
                .delete(delete_project::<R>),
        )
        .route(
            "/api/v1/projects/:project_id/queue",
            post(queue_join::<R>).delete(queue_leave::<R>),
        )
        .route("/api/v1/assignment", post(run_assignment::<R>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub role: AccountKind,
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub student_no: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Student,
    Teacher,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangeEmailRequest {
    pub new_email: String,
}

/// Shared payload for operations that only need to know who acts.
#[derive(Debug, Deserialize)]
pub struct ActorRequest {
    pub actor_id: u64,
}

#[derive(Debug, Deserialize)]
pub struct CreateTeamRequest {
    pub actor_id: u64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ProjectBodyRequest {
    pub actor_id: u64,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct AssignmentResponse {
    pub projects_assigned: usize,
}

async fn create_account<R>(
    State(service): State<Arc<BoardService<R>>>,
    Json(request): Json<CreateAccountRequest>,
) -> Response
where
    R: BoardRepository + 'static,
{
    let created = match request.role {
        AccountKind::Student => {
            let Some(student_no) = request.student_no else {
                let payload = json!({ "error": "student accounts require a student_no" });
                return (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response();
            };
            service.create_student(NewStudent {
                username: request.username,
                email: request.email,
                password: request.password,
                student_no,
            })
        }
        AccountKind::Teacher => service.create_teacher(NewTeacher {
            username: request.username,
            email: request.email,
            password: request.password,
        }),
    };

    match created {
        Ok(account) => (StatusCode::CREATED, Json(account.view())).into_response(),
        Err(error) => error_response(error),
    }
}

async fn account_detail<R>(
    State(service): State<Arc<BoardService<R>>>,
    Path(account_id): Path<u64>,
) -> Response
where
    R: BoardRepository + 'static,
{
    match service.account_view(&AccountId(account_id)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn delete_account<R>(
    State(service): State<Arc<BoardService<R>>>,
    Path(account_id): Path<u64>,
) -> Response
where
    R: BoardRepository + 'static,
{
    match service.delete_account(&AccountId(account_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

async fn change_password<R>(
    State(service): State<Arc<BoardService<R>>>,
    Path(account_id): Path<u64>,
    Json(request): Json<ChangePasswordRequest>,
) -> Response
where
    R: BoardRepository + 'static,
{
    match service.change_password(
        &AccountId(account_id),
        &request.current_password,
        &request.new_password,
    ) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

async fn change_email<R>(
    State(service): State<Arc<BoardService<R>>>,
    Path(account_id): Path<u64>,
    Json(request): Json<ChangeEmailRequest>,
) -> Response
where
    R: BoardRepository + 'static,
{
    match service.change_email(&AccountId(account_id), &request.new_email) {
        Ok(account) => (StatusCode::OK, Json(account.view())).into_response(),
        Err(error) => error_response(error),
    }
}

async fn list_teams<R>(State(service): State<Arc<BoardService<R>>>) -> Response
where
    R: BoardRepository + 'static,
{
    match service.list_team_views() {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn team_detail<R>(
    State(service): State<Arc<BoardService<R>>>,
    Path(team_id): Path<u64>,
) -> Response
where
    R: BoardRepository + 'static,
{
    match service.team_view(&TeamId(team_id)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn create_team<R>(
    State(service): State<Arc<BoardService<R>>>,
    Json(request): Json<CreateTeamRequest>,
) -> Response
where
    R: BoardRepository + 'static,
{
    match service.create_team(&AccountId(request.actor_id), &request.name) {
        Ok(team) => match service.team_view(&team.id) {
            Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
            Err(error) => error_response(error),
        },
        Err(error) => error_response(error),
    }
}

async fn join_team<R>(
    State(service): State<Arc<BoardService<R>>>,
    Path(team_id): Path<u64>,
    Json(request): Json<ActorRequest>,
) -> Response
where
    R: BoardRepository + 'static,
{
    match service.join_team(&AccountId(request.actor_id), &TeamId(team_id)) {
        Ok(team) => match service.team_view(&team.id) {
            Ok(view) => (StatusCode::OK, Json(view)).into_response(),
            Err(error) => error_response(error),
        },
        Err(error) => error_response(error),
    }
}

async fn leave_team<R>(
    State(service): State<Arc<BoardService<R>>>,
    Json(request): Json<ActorRequest>,
) -> Response
where
    R: BoardRepository + 'static,
{
    match service.leave_team(&AccountId(request.actor_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

async fn list_projects<R>(State(service): State<Arc<BoardService<R>>>) -> Response
where
    R: BoardRepository + 'static,
{
    match service.list_project_views() {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn project_detail<R>(
    State(service): State<Arc<BoardService<R>>>,
    Path(project_id): Path<u64>,
) -> Response
where
    R: BoardRepository + 'static,
{
    match service.project_view(&ProjectId(project_id)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn create_project<R>(
    State(service): State<Arc<BoardService<R>>>,
    Json(request): Json<ProjectBodyRequest>,
) -> Response
where
    R: BoardRepository + 'static,
{
    match service.create_project(
        &AccountId(request.actor_id),
        &request.name,
        &request.description,
    ) {
        Ok(project) => (StatusCode::CREATED, Json(project.view())).into_response(),
        Err(error) => error_response(error),
    }
}

async fn edit_project<R>(
    State(service): State<Arc<BoardService<R>>>,
    Path(project_id): Path<u64>,
    Json(request): Json<ProjectBodyRequest>,
) -> Response
where
    R: BoardRepository + 'static,
{
    match service.edit_project(
        &AccountId(request.actor_id),
        &ProjectId(project_id),
        &request.name,
        &request.description,
    ) {
        Ok(project) => (StatusCode::OK, Json(project.view())).into_response(),
        Err(error) => error_response(error),
    }
}

async fn delete_project<R>(
    State(service): State<Arc<BoardService<R>>>,
    Path(project_id): Path<u64>,
    Json(request): Json<ActorRequest>,
) -> Response
where
    R: BoardRepository + 'static,
{
    match service.delete_project(&AccountId(request.actor_id), &ProjectId(project_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

async fn queue_join<R>(
    State(service): State<Arc<BoardService<R>>>,
    Path(project_id): Path<u64>,
    Json(request): Json<ActorRequest>,
) -> Response
where
    R: BoardRepository + 'static,
{
    match service.queue_join(&AccountId(request.actor_id), &ProjectId(project_id)) {
        Ok(project) => (StatusCode::OK, Json(project.view())).into_response(),
        Err(error) => error_response(error),
    }
}

async fn queue_leave<R>(
    State(service): State<Arc<BoardService<R>>>,
    Path(project_id): Path<u64>,
    Json(request): Json<ActorRequest>,
) -> Response
where
    R: BoardRepository + 'static,
{
    match service.queue_leave(&AccountId(request.actor_id), &ProjectId(project_id)) {
        Ok(project) => (StatusCode::OK, Json(project.view())).into_response(),
        Err(error) => error_response(error),
    }
}

async fn run_assignment<R>(
    State(service): State<Arc<BoardService<R>>>,
    Json(request): Json<ActorRequest>,
) -> Response
where
    R: BoardRepository + 'static,
{
    match service.run_assignment(&AccountId(request.actor_id)) {
        Ok(projects_assigned) => {
            (StatusCode::OK, Json(AssignmentResponse { projects_assigned })).into_response()
        }
        Err(error) => error_response(error),
    }
}

fn error_response(error: BoardServiceError) -> Response {
    use BoardServiceError as E;

    let status = match &error {
        E::MustBeStudent | E::MustBeTeacher | E::MustBeAuthor => StatusCode::FORBIDDEN,
        E::InvalidPassword => StatusCode::UNAUTHORIZED,
        E::InvalidProject | E::InvalidTeam | E::Repository(RepositoryError::NotFound) => {
            StatusCode::NOT_FOUND
        }
        E::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        E::UserAlreadyInTeam
        | E::UserNotInTeam
        | E::TeamIsFull
        | E::TeamAlreadyInProjectQueue
        | E::TeamNotInProjectQueue
        | E::ProjectHasAssignedTeam
        | E::UserAssignedToProject
        | E::UsernameAlreadyExists
        | E::EmailAlreadyExists
        | E::StudentNumberAlreadyExists
        | E::TeamNameAlreadyExists
        | E::ProjectNameAlreadyExists => StatusCode::CONFLICT,
    };

    let body = Json(json!({ "error": error.to_string() }));
    (status, body).into_response()
}
