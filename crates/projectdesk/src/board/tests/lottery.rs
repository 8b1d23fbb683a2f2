use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::common::*;
use crate::board::domain::{AccountId, ProjectStatus, StudentStatus, Team, TeamId};
use crate::board::lottery;
use crate::board::service::BoardServiceError;

#[test]
fn eligible_teams_excludes_half_formed_ones() {
    let full = Team {
        id: TeamId(1),
        name: "sparks".to_string(),
        first_teammate: Some(AccountId(10)),
        second_teammate: Some(AccountId(11)),
    };
    let half = Team {
        id: TeamId(2),
        name: "embers".to_string(),
        first_teammate: Some(AccountId(12)),
        second_teammate: None,
    };

    let eligible = lottery::eligible_teams(&[full, half]);
    assert_eq!(eligible, vec![TeamId(1)]);
}

#[test]
fn draw_covers_every_eligible_team() {
    let mut rng = StdRng::seed_from_u64(7);
    let pool = vec![TeamId(1), TeamId(2), TeamId(3)];

    let mut seen = BTreeSet::new();
    for _ in 0..200 {
        let winner = lottery::draw_winner(&mut rng, &pool).expect("non-empty pool");
        assert!(pool.contains(&winner));
        seen.insert(winner);
    }
    assert_eq!(seen.len(), pool.len());

    assert_eq!(lottery::draw_winner(&mut rng, &[]), None);
}

#[test]
fn pass_assigns_the_only_eligible_team() {
    let (service, repository) = build_service();
    let teacher = enroll_teacher(&service, "turing");
    let project = service
        .create_project(&teacher.id, "compilers", "build one")
        .expect("project created");

    let (ada, grace, team) = full_team(&service, "sparks", "ada", "grace", 1001);
    service
        .queue_join(&ada.id, &project.id)
        .expect("full team queues");

    let eve = enroll_student(&service, "eve", 2001);
    service
        .create_team(&eve.id, "embers")
        .expect("half-formed team created");
    service
        .queue_join(&eve.id, &project.id)
        .expect("half-formed team queues");

    let assigned = service
        .run_assignment(&teacher.id)
        .expect("pass succeeds");
    assert_eq!(assigned, 1);

    let project = repository.project(&project.id).expect("project present");
    assert_eq!(project.assigned_team, Some(team.id));
    assert_eq!(project.status, ProjectStatus::Closed);
    assert!(project.queued_teams.is_empty(), "losers are evicted too");

    for member in [&ada.id, &grace.id] {
        let account = repository.account(member).expect("account present");
        assert_eq!(
            account.student_profile().expect("student role").status,
            StudentStatus::Assigned
        );
    }
    // The half-formed team was merely evicted, not assigned.
    let eve = repository.account(&eve.id).expect("account present");
    assert_eq!(
        eve.student_profile().expect("student role").status,
        StudentStatus::Unassigned
    );
}

#[test]
fn pass_without_eligible_teams_changes_nothing() {
    let (service, repository) = build_service();
    let teacher = enroll_teacher(&service, "turing");
    let project = service
        .create_project(&teacher.id, "compilers", "build one")
        .expect("project created");

    let eve = enroll_student(&service, "eve", 2001);
    service
        .create_team(&eve.id, "embers")
        .expect("half-formed team created");
    service
        .queue_join(&eve.id, &project.id)
        .expect("half-formed team queues");

    let assigned = service
        .run_assignment(&teacher.id)
        .expect("pass succeeds");
    assert_eq!(assigned, 0);

    let project = repository.project(&project.id).expect("project present");
    assert_eq!(project.status, ProjectStatus::Open);
    assert_eq!(project.assigned_team, None);
    assert_eq!(project.queued_teams.len(), 1);
}

#[test]
fn rerunning_the_pass_is_idempotent() {
    let (service, repository) = build_service();
    let teacher = enroll_teacher(&service, "turing");
    let project = service
        .create_project(&teacher.id, "compilers", "build one")
        .expect("project created");
    let (ada, _, _) = full_team(&service, "sparks", "ada", "grace", 1001);
    service
        .queue_join(&ada.id, &project.id)
        .expect("queue join succeeds");

    assert_eq!(service.run_assignment(&teacher.id).expect("pass"), 1);
    let after_first = repository.project(&project.id).expect("project present");

    assert_eq!(service.run_assignment(&teacher.id).expect("pass"), 0);
    let after_second = repository.project(&project.id).expect("project present");
    assert_eq!(after_first, after_second);
}

#[test]
fn pass_requires_a_teacher() {
    let (service, _) = build_service();
    let ada = enroll_student(&service, "ada", 1001);
    assert!(matches!(
        service.run_assignment(&ada.id),
        Err(BoardServiceError::MustBeTeacher)
    ));
}

#[test]
fn pass_covers_every_open_project_independently() {
    let (service, repository) = build_service();
    let teacher = enroll_teacher(&service, "turing");
    let first = service
        .create_project(&teacher.id, "compilers", "build one")
        .expect("project created");
    let second = service
        .create_project(&teacher.id, "databases", "build one")
        .expect("project created");

    let (ada, _, sparks) = full_team(&service, "sparks", "ada", "grace", 1001);
    let (eve, _, embers) = full_team(&service, "embers", "eve", "lin", 2001);
    service
        .queue_join(&ada.id, &first.id)
        .expect("queue join succeeds");
    service
        .queue_join(&eve.id, &second.id)
        .expect("queue join succeeds");

    let assigned = service
        .run_assignment(&teacher.id)
        .expect("pass succeeds");
    assert_eq!(assigned, 2);

    assert_eq!(
        repository.project(&first.id).expect("present").assigned_team,
        Some(sparks.id)
    );
    assert_eq!(
        repository
            .project(&second.id)
            .expect("present")
            .assigned_team,
        Some(embers.id)
    );
}

#[test]
fn winner_comes_from_the_eligible_pool_and_losers_stay_free() {
    let (service, repository) = build_service();
    let teacher = enroll_teacher(&service, "turing");
    let contested = service
        .create_project(&teacher.id, "compilers", "build one")
        .expect("project created");
    let fallback = service
        .create_project(&teacher.id, "databases", "build one")
        .expect("project created");

    let (ada, _, sparks) = full_team(&service, "sparks", "ada", "grace", 1001);
    let (eve, _, embers) = full_team(&service, "embers", "eve", "lin", 2001);
    service
        .queue_join(&ada.id, &contested.id)
        .expect("queue join succeeds");
    service
        .queue_join(&eve.id, &contested.id)
        .expect("queue join succeeds");

    let mut rng = StdRng::seed_from_u64(42);
    let assigned = service
        .run_assignment_with_rng(&teacher.id, &mut rng)
        .expect("pass succeeds");
    // The fallback project had an empty queue, so exactly one binding.
    assert_eq!(assigned, 1);

    let contested = repository.project(&contested.id).expect("present");
    let winner = contested.assigned_team.expect("a team was bound");
    assert!(winner == sparks.id || winner == embers.id);
    assert!(contested.queued_teams.is_empty());

    // The losing team walks away unassigned and may queue elsewhere.
    let loser = if winner == sparks.id { &eve } else { &ada };
    let loser_account = repository.account(&loser.id).expect("account present");
    assert_eq!(
        loser_account
            .student_profile()
            .expect("student role")
            .status,
        StudentStatus::Unassigned
    );
    service
        .queue_join(&loser.id, &fallback.id)
        .expect("loser requeues elsewhere");
}
