// Greedy fallback: builds a best-effort legal squad when the MILP path
// reports infeasible or errors out.

use std::collections::HashMap;

use tracing::debug;

use crate::config::SquadConfig;
use crate::pool::{CandidatePool, Player, Position};

use super::interpret::{DecisionAssignment, SelectionState};

/// Points per unit of cost, used for greedy ordering. Zero-cost players sort
/// to the extreme matching the sign of their points so that 0/0 never
/// produces a NaN in the comparator.
fn value_density(player: &Player) -> f64 {
    if player.cost > 0.0 {
        player.projected_points / player.cost
    } else if player.projected_points > 0.0 {
        f64::INFINITY
    } else if player.projected_points < 0.0 {
        f64::NEG_INFINITY
    } else {
        0.0
    }
}

/// Tracks the squad being assembled: spent budget, per-club counts, and
/// per-position starter counts.
struct GreedyState<'a> {
    config: &'a SquadConfig,
    spent: f64,
    club_counts: HashMap<&'a str, usize>,
    starter_counts: HashMap<Position, usize>,
    states: Vec<SelectionState>,
    starters: usize,
    bench: usize,
}

impl<'a> GreedyState<'a> {
    fn new(config: &'a SquadConfig, pool_len: usize) -> Self {
        GreedyState {
            config,
            spent: 0.0,
            club_counts: HashMap::new(),
            starter_counts: HashMap::new(),
            states: vec![SelectionState::Unselected; pool_len],
            starters: 0,
            bench: 0,
        }
    }

    fn is_selected(&self, index: usize) -> bool {
        self.states[index] != SelectionState::Unselected
    }

    fn starters_at(&self, position: Position) -> usize {
        self.starter_counts.get(&position).copied().unwrap_or(0)
    }

    /// Whether the player fits the budget and club cap.
    fn fits(&self, player: &Player) -> bool {
        if self.spent + player.cost > self.config.total_budget {
            return false;
        }
        let club_count = self.club_counts.get(player.club.as_str()).copied().unwrap_or(0);
        club_count < self.config.max_per_club
    }

    fn take(&mut self, index: usize, player: &'a Player, state: SelectionState) {
        self.spent += player.cost;
        *self.club_counts.entry(player.club.as_str()).or_insert(0) += 1;
        self.states[index] = state;
        match state {
            SelectionState::Starter => {
                *self.starter_counts.entry(player.position).or_insert(0) += 1;
                self.starters += 1;
            }
            SelectionState::Substitute => self.bench += 1,
            SelectionState::Unselected => {}
        }
    }
}

/// Greedily assemble a legal squad, or `None` when the sorted pool cannot
/// satisfy every quota and size within budget and club caps.
///
/// Construction order:
/// 1. Sort by value density descending, ties by projected points descending,
///    then id ascending.
/// 2. Fill each position's starter minimum.
/// 3. Fill remaining starter slots, respecting per-position maximums.
/// 4. Fill the bench.
/// Candidates that would break the budget or a club cap are skipped, never
/// fabricated around.
pub fn greedy_squad(pool: &CandidatePool, config: &SquadConfig) -> Option<DecisionAssignment> {
    let mut order: Vec<(usize, &Player)> = pool.players().iter().enumerate().collect();
    order.sort_by(|(_, a), (_, b)| {
        value_density(b)
            .total_cmp(&value_density(a))
            .then(b.projected_points.total_cmp(&a.projected_points))
            .then(a.id.cmp(&b.id))
    });

    let mut state = GreedyState::new(config, pool.len());

    // Phase 1: guarantee a feasible skeleton by meeting every quota minimum.
    for position in Position::ALL {
        let need = config.quota(position).min;
        for &(index, player) in order.iter().filter(|(_, p)| p.position == position) {
            if state.starters_at(position) >= need {
                break;
            }
            if state.is_selected(index) || !state.fits(player) {
                continue;
            }
            state.take(index, player, SelectionState::Starter);
        }
        if state.starters_at(position) < need {
            debug!(
                position = %position,
                have = state.starters_at(position),
                need,
                "greedy fallback cannot meet quota minimum"
            );
            return None;
        }
    }

    // Phase 2: fill the remaining starter slots up to the lineup size.
    for &(index, player) in &order {
        if state.starters >= config.starting_size {
            break;
        }
        if state.is_selected(index) || !state.fits(player) {
            continue;
        }
        if state.starters_at(player.position) >= config.quota(player.position).max {
            continue;
        }
        state.take(index, player, SelectionState::Starter);
    }
    if state.starters < config.starting_size {
        debug!(
            have = state.starters,
            need = config.starting_size,
            "greedy fallback cannot fill the starting lineup"
        );
        return None;
    }

    // Phase 3: fill the bench.
    for &(index, player) in &order {
        if state.bench >= config.bench_size {
            break;
        }
        if state.is_selected(index) || !state.fits(player) {
            continue;
        }
        state.take(index, player, SelectionState::Substitute);
    }
    if state.bench < config.bench_size {
        debug!(
            have = state.bench,
            need = config.bench_size,
            "greedy fallback cannot fill the bench"
        );
        return None;
    }

    Some(DecisionAssignment::from_states(state.states))
}
