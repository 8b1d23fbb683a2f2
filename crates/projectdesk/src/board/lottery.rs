use rand::seq::SliceRandom;
use rand::Rng;

use super::domain::{Team, TeamId};

/// Filter the queued teams down to the ones eligible for assignment. Only
/// full teams take part in the draw; half-formed teams stay queued but are
/// passed over (and evicted once a winner closes the project).
pub(crate) fn eligible_teams(queued: &[Team]) -> Vec<TeamId> {
    queued
        .iter()
        .filter(|team| team.is_full())
        .map(|team| team.id)
        .collect()
}

/// Draw a winner with a uniformly distributed index over the eligible set.
/// Uniformity is a fairness property of the assignment pass, not a detail:
/// every eligible team must have the same chance.
pub(crate) fn draw_winner<R: Rng + ?Sized>(rng: &mut R, eligible: &[TeamId]) -> Option<TeamId> {
    eligible.choose(rng).copied()
}
