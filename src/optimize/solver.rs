// Solving adapter: submits a formulated model to the external MILP
// capability under a wall-clock budget and classifies the outcome.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use good_lp::{constraint, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel, Variable};
use tracing::debug;

use super::formulate::{Cmp, MilpModel};

// ---------------------------------------------------------------------------
// Capability contract
// ---------------------------------------------------------------------------

/// Classified outcome of one solve call.
///
/// The column vectors follow the model's column layout; values are solver
/// floats and are rounded during interpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    /// Certified global optimum.
    Optimal(Vec<f64>),
    /// Feasible incumbent without an optimality certificate (e.g. the
    /// solver's own budget ran out mid-search).
    Feasible(Vec<f64>),
    /// No assignment satisfies all constraints.
    Infeasible,
    /// Internal solver fault, or the time budget expired with no incumbent.
    Error(String),
}

/// External MILP capability: submit a model, get a classified outcome
/// within the given time budget. Implementations must not mutate anything
/// beyond their own solve state.
pub trait MilpSolver {
    fn solve(&self, model: &MilpModel, time_limit: Duration) -> SolveOutcome;
}

// ---------------------------------------------------------------------------
// Default backend
// ---------------------------------------------------------------------------

/// Default solver backed by good_lp's pure-Rust microlp backend.
///
/// The backend has no native time-limit support, so the solve runs on a
/// worker thread and is abandoned when the budget expires; expiry is
/// classified as `SolveOutcome::Error`, never an indefinite block.
#[derive(Debug, Clone, Copy, Default)]
pub struct LpSolver;

impl MilpSolver for LpSolver {
    fn solve(&self, model: &MilpModel, time_limit: Duration) -> SolveOutcome {
        let (tx, rx) = mpsc::channel();
        let model = model.clone();
        thread::spawn(move || {
            let _ = tx.send(solve_once(&model));
        });

        match rx.recv_timeout(time_limit) {
            Ok(outcome) => outcome,
            Err(_) => SolveOutcome::Error(format!(
                "solver exceeded time budget of {}ms",
                time_limit.as_millis()
            )),
        }
    }
}

fn solve_once(model: &MilpModel) -> SolveOutcome {
    let mut vars = ProblemVariables::new();
    let cols: Vec<Variable> = (0..model.num_cols)
        .map(|_| vars.add(variable().binary()))
        .collect();

    let objective: Expression = model
        .objective
        .iter()
        .zip(&cols)
        .map(|(&coeff, &col)| coeff * col)
        .sum();

    let mut problem = vars.maximise(objective).using(good_lp::default_solver);
    for c in &model.constraints {
        let lhs: Expression = c
            .terms
            .iter()
            .map(|&(col, coeff)| coeff * cols[col])
            .sum();
        problem = match c.cmp {
            Cmp::Le => problem.with(constraint!(lhs <= c.rhs)),
            Cmp::Ge => problem.with(constraint!(lhs >= c.rhs)),
            Cmp::Eq => problem.with(constraint!(lhs == c.rhs)),
        };
    }

    match problem.solve() {
        Ok(solution) => {
            debug!(columns = model.num_cols, "solver returned an optimal assignment");
            SolveOutcome::Optimal(cols.iter().map(|&col| solution.value(col)).collect())
        }
        Err(ResolutionError::Infeasible) => SolveOutcome::Infeasible,
        Err(other) => SolveOutcome::Error(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimize::formulate::LinearConstraint;

    fn model(objective: Vec<f64>, constraints: Vec<LinearConstraint>) -> MilpModel {
        MilpModel {
            num_cols: objective.len(),
            objective,
            constraints,
        }
    }

    fn budget() -> Duration {
        Duration::from_secs(10)
    }

    #[test]
    fn solves_trivial_model_optimally() {
        // max x0 + 2*x1 subject to x0 + x1 <= 1: picks x1.
        let m = model(
            vec![1.0, 2.0],
            vec![LinearConstraint {
                terms: vec![(0, 1.0), (1, 1.0)],
                cmp: Cmp::Le,
                rhs: 1.0,
            }],
        );
        match LpSolver.solve(&m, budget()) {
            SolveOutcome::Optimal(cols) => {
                assert!(cols[0] < 0.5, "x0 should stay unselected");
                assert!(cols[1] > 0.5, "x1 should be selected");
            }
            other => panic!("expected optimal outcome, got {:?}", other),
        }
    }

    #[test]
    fn classifies_infeasible_model() {
        // x0 >= 1 and x0 <= 0 cannot both hold.
        let m = model(
            vec![1.0],
            vec![
                LinearConstraint {
                    terms: vec![(0, 1.0)],
                    cmp: Cmp::Ge,
                    rhs: 1.0,
                },
                LinearConstraint {
                    terms: vec![(0, 1.0)],
                    cmp: Cmp::Le,
                    rhs: 0.0,
                },
            ],
        );
        assert_eq!(LpSolver.solve(&m, budget()), SolveOutcome::Infeasible);
    }

    #[test]
    fn respects_equality_constraints() {
        // max x0 + x1 subject to x0 + x1 == 1: exactly one is selected.
        let m = model(
            vec![1.0, 1.0],
            vec![LinearConstraint {
                terms: vec![(0, 1.0), (1, 1.0)],
                cmp: Cmp::Eq,
                rhs: 1.0,
            }],
        );
        match LpSolver.solve(&m, budget()) {
            SolveOutcome::Optimal(cols) => {
                let selected = cols.iter().filter(|&&v| v > 0.5).count();
                assert_eq!(selected, 1);
            }
            other => panic!("expected optimal outcome, got {:?}", other),
        }
    }

    #[test]
    fn expired_budget_classified_as_error() {
        struct SlowSolver;
        impl MilpSolver for SlowSolver {
            fn solve(&self, model: &MilpModel, time_limit: Duration) -> SolveOutcome {
                let (tx, rx) = mpsc::channel();
                thread::spawn(move || {
                    thread::sleep(Duration::from_secs(60));
                    let _ = tx.send(SolveOutcome::Infeasible);
                });
                let _ = model;
                match rx.recv_timeout(time_limit) {
                    Ok(outcome) => outcome,
                    Err(_) => SolveOutcome::Error("timed out".to_string()),
                }
            }
        }

        let m = model(vec![1.0], vec![]);
        let outcome = SlowSolver.solve(&m, Duration::from_millis(10));
        assert!(matches!(outcome, SolveOutcome::Error(_)));
    }
}
