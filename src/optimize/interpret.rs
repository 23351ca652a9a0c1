// Result interpretation: maps solver output back onto players, re-verifies
// every constraint against the concrete squad, and builds the final report.

use serde::Serialize;
use thiserror::Error;

use crate::config::SquadConfig;
use crate::pool::{CandidatePool, Player, Position};

// Allowed float slack when re-checking the budget sum, so accumulated
// rounding in a legitimate solver answer is not rejected.
const BUDGET_EPSILON: f64 = 1e-6;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// A reconstructed squad violates its own constraints. Always fatal: it
/// indicates a formulation or solver bug, never bad user input.
#[derive(Debug, Error)]
pub enum ConsistencyError {
    #[error("assignment covers {actual} entries but expected {expected}")]
    AssignmentLength { expected: usize, actual: usize },

    #[error("player `{id}` is assigned as both starter and substitute")]
    DoubleAssignment { id: String },

    #[error("solution selects {actual} starters but the lineup requires {expected}")]
    StarterCount { expected: usize, actual: usize },

    #[error("solution selects {actual} substitutes but the bench requires {expected}")]
    BenchCount { expected: usize, actual: usize },

    #[error("starting lineup has {actual} {position} players, outside quota [{min}, {max}]")]
    QuotaViolation {
        position: Position,
        actual: usize,
        min: usize,
        max: usize,
    },

    #[error("squad cost {total_cost:.1} exceeds budget {budget:.1}")]
    BudgetExceeded { total_cost: f64, budget: f64 },

    #[error("club `{club}` appears {actual} times, above the cap of {cap}")]
    ClubCapExceeded {
        club: String,
        actual: usize,
        cap: usize,
    },
}

// ---------------------------------------------------------------------------
// Decision assignment
// ---------------------------------------------------------------------------

/// Per-player selection state produced by the solver or the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Starter,
    Substitute,
    Unselected,
}

/// The solver's decision for every player in the pool, indexed by pool
/// position.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionAssignment {
    states: Vec<SelectionState>,
}

impl DecisionAssignment {
    pub fn from_states(states: Vec<SelectionState>) -> Self {
        DecisionAssignment { states }
    }

    /// Build an assignment from raw solver columns (starter column `2i`,
    /// substitute column `2i+1`). Values above 0.5 count as selected.
    /// A player with both indicators set is a consistency violation.
    pub fn from_columns(pool: &CandidatePool, columns: &[f64]) -> Result<Self, ConsistencyError> {
        let expected = 2 * pool.len();
        if columns.len() != expected {
            return Err(ConsistencyError::AssignmentLength {
                expected,
                actual: columns.len(),
            });
        }

        let mut states = Vec::with_capacity(pool.len());
        for (i, player) in pool.players().iter().enumerate() {
            let starter = columns[2 * i] > 0.5;
            let substitute = columns[2 * i + 1] > 0.5;
            let state = match (starter, substitute) {
                (true, true) => {
                    return Err(ConsistencyError::DoubleAssignment {
                        id: player.id.clone(),
                    })
                }
                (true, false) => SelectionState::Starter,
                (false, true) => SelectionState::Substitute,
                (false, false) => SelectionState::Unselected,
            };
            states.push(state);
        }
        Ok(DecisionAssignment { states })
    }

    pub fn states(&self) -> &[SelectionState] {
        &self.states
    }
}

// ---------------------------------------------------------------------------
// Squad result
// ---------------------------------------------------------------------------

/// Final squad classification, honest about how the squad was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SquadStatus {
    /// Certified optimal by the solver.
    Optimal,
    /// Legal but not certified optimal (greedy fallback, or an uncertified
    /// solver incumbent).
    Fallback,
    /// No legal squad could be produced at all.
    Infeasible,
}

/// The final squad report. Built once per run, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SquadResult {
    /// Exactly `starting_size` players, ordered by position then pool order.
    pub starters: Vec<Player>,
    /// Exactly `bench_size` players, in pool order.
    pub substitutes: Vec<Player>,
    pub total_cost: f64,
    pub total_projected_points: f64,
    pub status: SquadStatus,
}

impl SquadResult {
    /// The empty result reported when neither the solver nor the fallback
    /// can produce a legal squad.
    pub fn infeasible() -> Self {
        SquadResult {
            starters: Vec::new(),
            substitutes: Vec::new(),
            total_cost: 0.0,
            total_projected_points: 0.0,
            status: SquadStatus::Infeasible,
        }
    }
}

// ---------------------------------------------------------------------------
// Interpretation
// ---------------------------------------------------------------------------

/// Reconstruct a squad from a decision assignment and independently
/// re-verify every formulation constraint against the concrete players.
///
/// The re-check is deliberately redundant with the solver's constraints:
/// a violation here means the formulation or the solver is wrong, and the
/// run must halt with a diagnostic instead of returning an illegal squad.
pub fn build_result(
    pool: &CandidatePool,
    config: &SquadConfig,
    assignment: &DecisionAssignment,
    status: SquadStatus,
) -> Result<SquadResult, ConsistencyError> {
    let states = assignment.states();
    if states.len() != pool.len() {
        return Err(ConsistencyError::AssignmentLength {
            expected: pool.len(),
            actual: states.len(),
        });
    }

    let mut starters: Vec<Player> = Vec::with_capacity(config.starting_size);
    let mut substitutes: Vec<Player> = Vec::with_capacity(config.bench_size);
    for (player, &state) in pool.players().iter().zip(states) {
        match state {
            SelectionState::Starter => starters.push(player.clone()),
            SelectionState::Substitute => substitutes.push(player.clone()),
            SelectionState::Unselected => {}
        }
    }

    if starters.len() != config.starting_size {
        return Err(ConsistencyError::StarterCount {
            expected: config.starting_size,
            actual: starters.len(),
        });
    }
    if substitutes.len() != config.bench_size {
        return Err(ConsistencyError::BenchCount {
            expected: config.bench_size,
            actual: substitutes.len(),
        });
    }

    for position in Position::ALL {
        let quota = config.quota(position);
        let actual = starters.iter().filter(|p| p.position == position).count();
        if actual < quota.min || actual > quota.max {
            return Err(ConsistencyError::QuotaViolation {
                position,
                actual,
                min: quota.min,
                max: quota.max,
            });
        }
    }

    let total_cost: f64 = starters.iter().chain(&substitutes).map(|p| p.cost).sum();
    if total_cost > config.total_budget + BUDGET_EPSILON {
        return Err(ConsistencyError::BudgetExceeded {
            total_cost,
            budget: config.total_budget,
        });
    }

    for club in pool.clubs() {
        let actual = starters
            .iter()
            .chain(&substitutes)
            .filter(|p| p.club == club)
            .count();
        if actual > config.max_per_club {
            return Err(ConsistencyError::ClubCapExceeded {
                club: club.to_string(),
                actual,
                cap: config.max_per_club,
            });
        }
    }

    let total_projected_points: f64 = starters
        .iter()
        .chain(&substitutes)
        .map(|p| p.projected_points)
        .sum();

    // Stable sort: players within a position keep their pool order.
    starters.sort_by_key(|p| p.position.sort_order());

    Ok(SquadResult {
        starters,
        substitutes,
        total_cost,
        total_projected_points,
        status,
    })
}
