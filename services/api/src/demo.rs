use std::sync::Arc;

use clap::Args;
use projectdesk::board::{BoardService, BoardServiceError, NewStudent, NewTeacher};
use projectdesk::error::AppError;

use crate::infra::InMemoryBoardRepository;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// How many full teams compete for the contested project (minimum 1)
    #[arg(long, default_value_t = 2)]
    pub(crate) contending_teams: u8,
    /// Skip printing the JSON views of the final state
    #[arg(long)]
    pub(crate) skip_views: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    if let Err(err) = demo_scenario(args) {
        println!("demo aborted: {err}");
    }
    Ok(())
}

fn demo_scenario(args: DemoArgs) -> Result<(), BoardServiceError> {
    let DemoArgs {
        contending_teams,
        skip_views,
    } = args;
    let contending_teams = contending_teams.max(1);

    let repository = Arc::new(InMemoryBoardRepository::default());
    let service = BoardService::new(repository);

    println!("projectdesk demo");

    let prof = service.create_teacher(NewTeacher {
        username: "prof_rivera".to_string(),
        email: "rivera@example.edu".to_string(),
        password: "faculty pass".to_string(),
    })?;
    let contested = service.create_project(
        &prof.id,
        "distributed-kv",
        "replicated key-value store",
    )?;
    let leftover = service.create_project(&prof.id, "ray-tracer", "weekend path tracer")?;
    println!(
        "- teacher {} opened projects '{}' and '{}'",
        prof.username, contested.name, leftover.name
    );

    for index in 0..contending_teams {
        let base = 1000 + u32::from(index) * 2;
        let first = service.create_student(NewStudent {
            username: format!("student_{base}"),
            email: format!("student_{base}@example.edu"),
            password: "student pass".to_string(),
            student_no: base,
        })?;
        let second = service.create_student(NewStudent {
            username: format!("student_{}", base + 1),
            email: format!("student_{}@example.edu", base + 1),
            password: "student pass".to_string(),
            student_no: base + 1,
        })?;

        let team = service.create_team(&first.id, &format!("team-{:02}", index + 1))?;
        service.join_team(&second.id, &team.id)?;
        service.queue_join(&first.id, &contested.id)?;
        println!(
            "- team '{}' ({}, {}) queued for '{}'",
            team.name, first.username, second.username, contested.name
        );
    }

    // A half-formed team joins the queue but cannot win the draw.
    let solo = service.create_student(NewStudent {
        username: "student_solo".to_string(),
        email: "student_solo@example.edu".to_string(),
        password: "student pass".to_string(),
        student_no: 9000,
    })?;
    let half_team = service.create_team(&solo.id, "team-solo")?;
    service.queue_join(&solo.id, &contested.id)?;
    println!(
        "- half-formed team '{}' queued as well (ineligible for the draw)",
        half_team.name
    );

    let assigned = service.run_assignment(&prof.id)?;
    println!("\nAssignment pass bound teams to {assigned} project(s)");

    let contested_view = service.project_view(&contested.id)?;
    let winner = contested_view.assigned_team;
    println!(
        "- '{}' is now {} (winning team id: {})",
        contested_view.name,
        contested_view.status,
        winner.map(|team| team.0.to_string()).unwrap_or_default()
    );
    println!(
        "- '{}' stays open for the next pass",
        service.project_view(&leftover.id)?.name
    );

    // The rules hold after the draw: the winners are locked in.
    if let Some(team_id) = winner {
        let team_view = service.team_view(&team_id)?;
        if let Some(member) = team_view.members.first() {
            match service.leave_team(&member.id) {
                Err(err) => println!("- {} cannot leave the bound team: {err}", member.username),
                Ok(()) => println!("- unexpected: a bound member left their team"),
            }
        }
    }

    if skip_views {
        return Ok(());
    }

    println!("\nFinal state");
    let teams = service.list_team_views()?;
    match serde_json::to_string_pretty(&teams) {
        Ok(json) => println!("teams:\n{json}"),
        Err(err) => println!("teams unavailable: {err}"),
    }
    let projects = service.list_project_views()?;
    match serde_json::to_string_pretty(&projects) {
        Ok(json) => println!("projects:\n{json}"),
        Err(err) => println!("projects unavailable: {err}"),
    }

    Ok(())
}
