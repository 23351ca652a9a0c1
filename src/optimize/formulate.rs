// MILP formulation: translates a candidate pool and squad configuration
// into a solver-neutral model with two binary columns per player.

use thiserror::Error;

use crate::config::SquadConfig;
use crate::pool::{CandidatePool, Position};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// The pool cannot structurally satisfy the configuration. Detected before
/// any solver call.
#[derive(Debug, Error)]
pub enum InfeasibleConfigError {
    #[error("pool has {available} players but a full squad needs {required}")]
    PoolTooSmall { available: usize, required: usize },

    #[error(
        "pool has {available} {position} players but the starting lineup needs at least {required}"
    )]
    NotEnoughAtPosition {
        position: Position,
        available: usize,
        required: usize,
    },
}

// ---------------------------------------------------------------------------
// Model types
// ---------------------------------------------------------------------------

/// Comparison operator of a linear constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmp {
    Le,
    Ge,
    Eq,
}

/// One linear constraint over model columns: `sum(coeff * col) cmp rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    pub terms: Vec<(usize, f64)>,
    pub cmp: Cmp,
    pub rhs: f64,
}

impl LinearConstraint {
    fn new(terms: Vec<(usize, f64)>, cmp: Cmp, rhs: f64) -> Self {
        LinearConstraint { terms, cmp, rhs }
    }
}

/// A solver-neutral MILP instance. All columns are binary and the objective
/// is maximized.
///
/// Column layout is fixed by pool order: player `i` owns the starter column
/// `starter_col(i)` and the substitute column `sub_col(i)`. Identical pool
/// ordering and configuration therefore always produce a structurally
/// identical model.
#[derive(Debug, Clone, PartialEq)]
pub struct MilpModel {
    pub num_cols: usize,
    /// Objective coefficient per column.
    pub objective: Vec<f64>,
    pub constraints: Vec<LinearConstraint>,
}

/// Column index of the starter indicator for pool index `i`.
pub fn starter_col(i: usize) -> usize {
    2 * i
}

/// Column index of the substitute indicator for pool index `i`.
pub fn sub_col(i: usize) -> usize {
    2 * i + 1
}

// ---------------------------------------------------------------------------
// Formulation
// ---------------------------------------------------------------------------

/// Build the MILP instance for one selection run.
///
/// Constraints, in emission order:
/// 1. starter count == starting_size
/// 2. substitute count == bench_size
/// 3. per player: starter + substitute <= 1
/// 4. per position: starter count within [quota.min, quota.max]
/// 5. total cost of selected players <= total_budget
/// 6. per club (derived from the pool): selected count <= max_per_club
///
/// Fails fast with `InfeasibleConfigError` when the pool is too small for a
/// full squad or has fewer players at some position than that position's
/// quota minimum.
pub fn formulate(
    pool: &CandidatePool,
    config: &SquadConfig,
) -> Result<MilpModel, InfeasibleConfigError> {
    let required = config.squad_size();
    if pool.len() < required {
        return Err(InfeasibleConfigError::PoolTooSmall {
            available: pool.len(),
            required,
        });
    }
    for position in Position::ALL {
        let quota = config.quota(position);
        let available = pool.count_at(position);
        if available < quota.min {
            return Err(InfeasibleConfigError::NotEnoughAtPosition {
                position,
                available,
                required: quota.min,
            });
        }
    }

    let players = pool.players();
    let num_cols = 2 * players.len();

    let mut objective = vec![0.0; num_cols];
    for (i, player) in players.iter().enumerate() {
        objective[starter_col(i)] = player.projected_points;
        objective[sub_col(i)] = config.bench_weight * player.projected_points;
    }

    let mut constraints = Vec::new();

    // 1-2. Exact starter and substitute counts.
    constraints.push(LinearConstraint::new(
        (0..players.len()).map(|i| (starter_col(i), 1.0)).collect(),
        Cmp::Eq,
        config.starting_size as f64,
    ));
    constraints.push(LinearConstraint::new(
        (0..players.len()).map(|i| (sub_col(i), 1.0)).collect(),
        Cmp::Eq,
        config.bench_size as f64,
    ));

    // 3. A player is never both a starter and a substitute.
    for i in 0..players.len() {
        constraints.push(LinearConstraint::new(
            vec![(starter_col(i), 1.0), (sub_col(i), 1.0)],
            Cmp::Le,
            1.0,
        ));
    }

    // 4. Starter quotas per position.
    for position in Position::ALL {
        let quota = config.quota(position);
        let terms: Vec<(usize, f64)> = players
            .iter()
            .enumerate()
            .filter(|(_, p)| p.position == position)
            .map(|(i, _)| (starter_col(i), 1.0))
            .collect();
        // A position absent from the pool only passes the pre-check when its
        // quota minimum is zero; both bounds are vacuous then.
        if terms.is_empty() {
            continue;
        }
        constraints.push(LinearConstraint::new(terms.clone(), Cmp::Ge, quota.min as f64));
        constraints.push(LinearConstraint::new(terms, Cmp::Le, quota.max as f64));
    }

    // 5. Budget over the whole squad.
    let mut budget_terms = Vec::with_capacity(num_cols);
    for (i, player) in players.iter().enumerate() {
        budget_terms.push((starter_col(i), player.cost));
        budget_terms.push((sub_col(i), player.cost));
    }
    constraints.push(LinearConstraint::new(
        budget_terms,
        Cmp::Le,
        config.total_budget,
    ));

    // 6. Per-club cap, over the clubs actually present in the pool.
    for club in pool.clubs() {
        let mut terms = Vec::new();
        for (i, player) in players.iter().enumerate() {
            if player.club == club {
                terms.push((starter_col(i), 1.0));
                terms.push((sub_col(i), 1.0));
            }
        }
        constraints.push(LinearConstraint::new(
            terms,
            Cmp::Le,
            config.max_per_club as f64,
        ));
    }

    Ok(MilpModel {
        num_cols,
        objective,
        constraints,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::RawPlayer;

    fn raw(id: &str, position: &str, club: &str, cost: f64, points: f64) -> RawPlayer {
        RawPlayer {
            id: Some(id.to_string()),
            position: Some(position.to_string()),
            club: Some(club.to_string()),
            cost: Some(cost),
            projected_points: Some(points),
        }
    }

    /// 16 players across 4 clubs: 2 GK, 5 DEF, 5 MID, 4 FWD.
    fn sixteen_pool() -> CandidatePool {
        let mut records = Vec::new();
        let positions = [
            ("GK", 2),
            ("DEF", 5),
            ("MID", 5),
            ("FWD", 4),
        ];
        let clubs = ["reds", "blues", "whites", "greens"];
        let mut n = 0;
        for (pos, count) in positions {
            for _ in 0..count {
                records.push(raw(
                    &format!("p{n}"),
                    pos,
                    clubs[n % clubs.len()],
                    4.0 + (n % 5) as f64,
                    1.0 + n as f64,
                ));
                n += 1;
            }
        }
        CandidatePool::build(records).unwrap()
    }

    #[test]
    fn column_layout_is_interleaved() {
        assert_eq!(starter_col(0), 0);
        assert_eq!(sub_col(0), 1);
        assert_eq!(starter_col(3), 6);
        assert_eq!(sub_col(3), 7);
    }

    #[test]
    fn model_shape_matches_pool() {
        let pool = sixteen_pool();
        let config = SquadConfig::default();
        let model = formulate(&pool, &config).unwrap();

        assert_eq!(model.num_cols, 2 * pool.len());
        assert_eq!(model.objective.len(), model.num_cols);
        // 2 count constraints + 16 mutual exclusions + 8 quota bounds
        // + 1 budget + 4 clubs = 31
        assert_eq!(model.constraints.len(), 2 + 16 + 8 + 1 + 4);
    }

    #[test]
    fn objective_weights_substitutes() {
        let pool = sixteen_pool();
        let mut config = SquadConfig::default();
        config.bench_weight = 0.5;
        let model = formulate(&pool, &config).unwrap();

        for (i, player) in pool.players().iter().enumerate() {
            assert_eq!(model.objective[starter_col(i)], player.projected_points);
            assert_eq!(model.objective[sub_col(i)], 0.5 * player.projected_points);
        }
    }

    #[test]
    fn formulation_is_deterministic() {
        let pool = sixteen_pool();
        let config = SquadConfig::default();
        let a = formulate(&pool, &config).unwrap();
        let b = formulate(&pool, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn count_constraints_are_exact() {
        let pool = sixteen_pool();
        let config = SquadConfig::default();
        let model = formulate(&pool, &config).unwrap();

        let starters = &model.constraints[0];
        assert_eq!(starters.cmp, Cmp::Eq);
        assert_eq!(starters.rhs, 11.0);
        assert_eq!(starters.terms.len(), pool.len());
        assert!(starters.terms.iter().all(|&(col, _)| col % 2 == 0));

        let bench = &model.constraints[1];
        assert_eq!(bench.cmp, Cmp::Eq);
        assert_eq!(bench.rhs, 4.0);
        assert!(bench.terms.iter().all(|&(col, _)| col % 2 == 1));
    }

    #[test]
    fn budget_constraint_uses_costs_for_both_roles() {
        let pool = sixteen_pool();
        let config = SquadConfig::default();
        let model = formulate(&pool, &config).unwrap();

        let budget = model
            .constraints
            .iter()
            .find(|c| c.cmp == Cmp::Le && c.rhs == config.total_budget)
            .expect("budget constraint present");
        assert_eq!(budget.terms.len(), model.num_cols);
        for (i, player) in pool.players().iter().enumerate() {
            assert_eq!(budget.terms[2 * i], (starter_col(i), player.cost));
            assert_eq!(budget.terms[2 * i + 1], (sub_col(i), player.cost));
        }
    }

    #[test]
    fn club_constraints_cover_pool_clubs() {
        let pool = sixteen_pool();
        let config = SquadConfig::default();
        let model = formulate(&pool, &config).unwrap();

        // Club constraints are the only ones that mix starter and substitute
        // columns with unit coefficients and the club-cap right-hand side.
        let club_constraints: Vec<&LinearConstraint> = model
            .constraints
            .iter()
            .filter(|c| {
                c.cmp == Cmp::Le
                    && c.rhs == config.max_per_club as f64
                    && c.terms.len() > 2
                    && c.terms.iter().any(|&(col, _)| col % 2 == 1)
                    && c.terms.iter().all(|&(_, coeff)| coeff == 1.0)
            })
            .collect();
        assert_eq!(club_constraints.len(), pool.clubs().len());
    }

    #[test]
    fn pool_too_small_fails_fast() {
        let pool = CandidatePool::build(vec![
            raw("p0", "GK", "reds", 4.0, 1.0),
            raw("p1", "DEF", "reds", 4.0, 1.0),
        ])
        .unwrap();
        let err = formulate(&pool, &SquadConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            InfeasibleConfigError::PoolTooSmall {
                available: 2,
                required: 15
            }
        ));
    }

    #[test]
    fn missing_goalkeepers_fail_fast() {
        // 16 players, none of them a goalkeeper.
        let mut records = Vec::new();
        for n in 0..16 {
            let pos = if n < 6 { "DEF" } else if n < 12 { "MID" } else { "FWD" };
            records.push(raw(&format!("p{n}"), pos, "reds", 4.0, 1.0));
        }
        let pool = CandidatePool::build(records).unwrap();
        let err = formulate(&pool, &SquadConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            InfeasibleConfigError::NotEnoughAtPosition {
                position: Position::Goalkeeper,
                available: 0,
                required: 1
            }
        ));
    }
}
