// Squad optimization engine: MILP formulation, solving, interpretation,
// and the greedy fallback.

pub mod fallback;
pub mod formulate;
pub mod interpret;
pub mod solver;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::SquadConfig;
use crate::pool::CandidatePool;

pub use formulate::{InfeasibleConfigError, MilpModel};
pub use interpret::{ConsistencyError, DecisionAssignment, SelectionState, SquadResult, SquadStatus};
pub use solver::{LpSolver, MilpSolver, SolveOutcome};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SelectError {
    #[error("infeasible configuration: {0}")]
    Infeasible(#[from] InfeasibleConfigError),

    #[error("internal consistency check failed: {0}")]
    Inconsistent(#[from] ConsistencyError),
}

// ---------------------------------------------------------------------------
// Engine entry point
// ---------------------------------------------------------------------------

/// Run one squad selection: formulate the MILP, solve it under the
/// configured time budget, and interpret the outcome.
///
/// Failure policy:
/// - structural pool/config mismatches fail before any solve;
/// - solver infeasibility and solver faults are logged and recovered via
///   the greedy fallback, surfacing as `Fallback` or `Infeasible` status;
/// - a squad that fails re-verification is a fatal internal error.
pub fn select_squad(
    pool: &CandidatePool,
    config: &SquadConfig,
    solver: &dyn MilpSolver,
) -> Result<SquadResult, SelectError> {
    let model = formulate::formulate(pool, config)?;
    debug!(
        columns = model.num_cols,
        constraints = model.constraints.len(),
        "model formulated"
    );

    match solver.solve(&model, config.solver_time_limit()) {
        SolveOutcome::Optimal(columns) => {
            let assignment = DecisionAssignment::from_columns(pool, &columns)?;
            let result =
                interpret::build_result(pool, config, &assignment, SquadStatus::Optimal)?;
            info!(
                points = result.total_projected_points,
                cost = result.total_cost,
                "optimal squad selected"
            );
            Ok(result)
        }
        SolveOutcome::Feasible(columns) => {
            warn!("solver returned a feasible squad without an optimality certificate");
            let assignment = DecisionAssignment::from_columns(pool, &columns)?;
            let result =
                interpret::build_result(pool, config, &assignment, SquadStatus::Fallback)?;
            Ok(result)
        }
        SolveOutcome::Infeasible => {
            warn!("solver reports the model infeasible, trying the greedy fallback");
            fallback_result(pool, config)
        }
        SolveOutcome::Error(message) => {
            warn!(%message, "solver fault, trying the greedy fallback");
            fallback_result(pool, config)
        }
    }
}

/// Build a squad via the greedy heuristic; an `Infeasible` result is
/// reported honestly when even the heuristic cannot assemble a legal squad.
fn fallback_result(
    pool: &CandidatePool,
    config: &SquadConfig,
) -> Result<SquadResult, SelectError> {
    match fallback::greedy_squad(pool, config) {
        Some(assignment) => {
            let result =
                interpret::build_result(pool, config, &assignment, SquadStatus::Fallback)?;
            info!(
                points = result.total_projected_points,
                cost = result.total_cost,
                "fallback squad selected"
            );
            Ok(result)
        }
        None => {
            warn!("greedy fallback could not assemble a legal squad");
            Ok(SquadResult::infeasible())
        }
    }
}
