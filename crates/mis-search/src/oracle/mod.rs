//! Packing oracles.
//!
//! The search treats an oracle as a black box behind [`SolverGateway`]: given
//! a container, a resolution and a list of item dimensions it either returns
//! a placement, proves that none exists, or gives up. Giving up (timeout,
//! cancellation, internal fault) is reported as an [`OracleFailure`] and is
//! never mistaken for infeasibility.
//!
//! Three exact oracles ship with the crate, selected through [`SolverKind`]:
//!
//! - `grid` places items on multiples of the resolution, without rotation
//! - `interval` searches normal-pattern coordinates, with rotation
//! - `disjunctive` branches on pairwise separation relations, with rotation

mod deadline;
mod disjunctive;
mod grid;
mod interval;
mod lattice;
mod scaling;

pub use deadline::{Deadline, SearchClock};
pub use disjunctive::DisjunctiveOracle;
pub use grid::GridOracle;
pub use interval::IntervalOracle;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SearchError;
use crate::model::{Dimensions, Position};

/// One oracle invocation.
#[derive(Debug, Clone, Copy)]
pub struct SolveRequest<'a> {
    pub length: f64,
    pub width: f64,
    pub items: &'a [Dimensions],
    pub resolution: u64,
}

/// A conclusive oracle answer.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Positions are index-aligned with the request's items.
    Feasible(Vec<Position>),
    Infeasible,
}

/// Why an oracle call ended without a conclusive answer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleFailure {
    #[error("time budget exhausted")]
    Timeout,

    #[error("cancelled")]
    Cancelled,

    #[error("{0}")]
    Fault(String),
}

impl From<OracleFailure> for SearchError {
    fn from(failure: OracleFailure) -> Self {
        match failure {
            OracleFailure::Timeout => SearchError::OracleTimeout,
            OracleFailure::Cancelled => SearchError::Cancelled,
            OracleFailure::Fault(reason) => SearchError::OracleError(reason),
        }
    }
}

/// Feasibility-and-placement capability consumed by the search.
///
/// Implementations must be deterministic up to their own internals and must
/// return [`OracleFailure::Timeout`] once `deadline` expires rather than
/// blocking.
pub trait SolverGateway: Send + Sync {
    fn name(&self) -> &str;

    fn solve(&self, request: &SolveRequest<'_>, deadline: &Deadline) -> Result<Verdict, OracleFailure>;
}

/// Oracle variants selectable by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    Grid,
    #[default]
    Interval,
    Disjunctive,
}

impl SolverKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolverKind::Grid => "grid",
            SolverKind::Interval => "interval",
            SolverKind::Disjunctive => "disjunctive",
        }
    }

    pub fn build(self) -> Oracle {
        match self {
            SolverKind::Grid => Oracle::Grid(GridOracle),
            SolverKind::Interval => Oracle::Interval(IntervalOracle),
            SolverKind::Disjunctive => Oracle::Disjunctive(DisjunctiveOracle),
        }
    }
}

impl FromStr for SolverKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "grid" => Ok(SolverKind::Grid),
            "interval" => Ok(SolverKind::Interval),
            "disjunctive" => Ok(SolverKind::Disjunctive),
            other => Err(format!(
                "unknown solver '{}', expected grid, interval or disjunctive",
                other
            )),
        }
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The closed set of built-in oracles.
#[derive(Debug, Clone)]
pub enum Oracle {
    Grid(GridOracle),
    Interval(IntervalOracle),
    Disjunctive(DisjunctiveOracle),
}

impl SolverGateway for Oracle {
    fn name(&self) -> &str {
        match self {
            Oracle::Grid(o) => o.name(),
            Oracle::Interval(o) => o.name(),
            Oracle::Disjunctive(o) => o.name(),
        }
    }

    fn solve(&self, request: &SolveRequest<'_>, deadline: &Deadline) -> Result<Verdict, OracleFailure> {
        match self {
            Oracle::Grid(o) => o.solve(request, deadline),
            Oracle::Interval(o) => o.solve(request, deadline),
            Oracle::Disjunctive(o) => o.solve(request, deadline),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn dims(list: &[(f64, f64)]) -> Vec<Dimensions> {
        list.iter().map(|&(w, h)| Dimensions::new(w, h)).collect()
    }

    fn request<'a>(length: f64, width: f64, items: &'a [Dimensions], resolution: u64) -> SolveRequest<'a> {
        SolveRequest {
            length,
            width,
            items,
            resolution,
        }
    }

    /// Placements must stay inside the container and never overlap.
    fn assert_valid(req: &SolveRequest<'_>, positions: &[Position], rotation: bool) {
        assert_eq!(positions.len(), req.items.len());
        let mut rects = Vec::new();
        for (item, pos) in req.items.iter().zip(positions) {
            let fits = |w: f64, h: f64| pos.x + w <= req.length + 1e-9 && pos.y + h <= req.width + 1e-9;
            let (w, h) = if fits(item.width, item.height) {
                (item.width, item.height)
            } else {
                assert!(rotation && fits(item.height, item.width), "item outside container");
                (item.height, item.width)
            };
            assert!(pos.x >= 0.0 && pos.y >= 0.0);
            rects.push((pos.x, pos.y, w, h));
        }
        for i in 0..rects.len() {
            for j in i + 1..rects.len() {
                let (ax, ay, aw, ah) = rects[i];
                let (bx, by, bw, bh) = rects[j];
                let overlap = ax < bx + bw - 1e-9 && bx < ax + aw - 1e-9 && ay < by + bh - 1e-9 && by < ay + ah - 1e-9;
                assert!(!overlap, "items {} and {} overlap", i, j);
            }
        }
    }

    fn all_oracles() -> Vec<(Oracle, bool)> {
        vec![
            (SolverKind::Grid.build(), false),
            (SolverKind::Interval.build(), true),
            (SolverKind::Disjunctive.build(), true),
        ]
    }

    #[test]
    fn test_two_small_squares_fit() {
        let items = dims(&[(4.0, 4.0), (4.0, 4.0)]);
        let req = request(10.0, 10.0, &items, 2);
        for (oracle, rotation) in all_oracles() {
            match oracle.solve(&req, &Deadline::unbounded()).unwrap() {
                Verdict::Feasible(positions) => assert_valid(&req, &positions, rotation),
                Verdict::Infeasible => panic!("{} reported infeasible", oracle.name()),
            }
        }
    }

    #[test]
    fn test_two_large_squares_do_not_fit() {
        let items = dims(&[(6.0, 6.0), (6.0, 6.0)]);
        let req = request(10.0, 10.0, &items, 1);
        for (oracle, _) in all_oracles() {
            assert_eq!(
                oracle.solve(&req, &Deadline::unbounded()).unwrap(),
                Verdict::Infeasible,
                "{}",
                oracle.name()
            );
        }
    }

    #[test]
    fn test_area_bound_rejects() {
        let items = dims(&[(8.0, 8.0), (4.0, 4.0), (4.0, 4.0)]);
        let req = request(10.0, 10.0, &items, 2);
        for (oracle, _) in all_oracles() {
            assert_eq!(oracle.solve(&req, &Deadline::unbounded()).unwrap(), Verdict::Infeasible);
        }
    }

    #[test]
    fn test_tight_packing_with_non_square_items() {
        // 2x6 + 2x6 + 4x6 exactly fill 8x6.
        let items = dims(&[(2.0, 6.0), (4.0, 6.0), (2.0, 6.0)]);
        let req = request(8.0, 6.0, &items, 2);
        for (oracle, rotation) in all_oracles() {
            match oracle.solve(&req, &Deadline::unbounded()).unwrap() {
                Verdict::Feasible(positions) => assert_valid(&req, &positions, rotation),
                Verdict::Infeasible => panic!("{} missed a tight packing", oracle.name()),
            }
        }
    }

    #[test]
    fn test_rotation_is_used_when_permitted() {
        // Two 2x8 strips only fit an 8x4 container when rotated.
        let items = dims(&[(2.0, 8.0), (2.0, 8.0)]);
        let req = request(8.0, 4.0, &items, 1);

        assert_eq!(
            GridOracle.solve(&req, &Deadline::unbounded()).unwrap(),
            Verdict::Infeasible
        );
        for oracle in [SolverKind::Interval.build(), SolverKind::Disjunctive.build()] {
            match oracle.solve(&req, &Deadline::unbounded()).unwrap() {
                Verdict::Feasible(positions) => assert_valid(&req, &positions, true),
                Verdict::Infeasible => panic!("{} did not rotate", oracle.name()),
            }
        }
    }

    #[test]
    fn test_grid_depends_on_resolution() {
        // Two 3-wide items side by side need x = 3, which is off the 2-grid.
        let items = dims(&[(3.0, 4.0), (3.0, 4.0)]);
        let coarse = request(6.0, 4.0, &items, 2);
        let fine = request(6.0, 4.0, &items, 1);

        assert_eq!(
            GridOracle.solve(&coarse, &Deadline::unbounded()).unwrap(),
            Verdict::Infeasible
        );
        assert!(matches!(
            GridOracle.solve(&fine, &Deadline::unbounded()).unwrap(),
            Verdict::Feasible(_)
        ));
    }

    #[test]
    fn test_fractional_dimensions() {
        let items = dims(&[(2.5, 1.25), (2.5, 1.25)]);
        let req = request(5.0, 1.25, &items, 1);
        for oracle in [SolverKind::Interval.build(), SolverKind::Disjunctive.build()] {
            match oracle.solve(&req, &Deadline::unbounded()).unwrap() {
                Verdict::Feasible(positions) => assert_valid(&req, &positions, true),
                Verdict::Infeasible => panic!("{} failed on fractional sizes", oracle.name()),
            }
        }
    }

    #[test]
    fn test_expired_deadline_is_inconclusive() {
        // Passes the area bound, so every oracle has to start searching.
        let items = dims(&[(3.0, 3.0); 11]);
        let req = request(10.0, 10.0, &items, 1);
        let deadline = Deadline::new(Some(Duration::ZERO), None);
        for (oracle, _) in all_oracles() {
            assert_eq!(
                oracle.solve(&req, &deadline),
                Err(OracleFailure::Timeout),
                "{}",
                oracle.name()
            );
        }
    }

    #[test]
    fn test_solver_kind_parse() {
        assert_eq!("GRID".parse::<SolverKind>().unwrap(), SolverKind::Grid);
        assert_eq!(SolverKind::default(), SolverKind::Interval);
        assert!("ortools".parse::<SolverKind>().is_err());
        assert_eq!(SolverKind::Disjunctive.build().name(), "disjunctive");
    }

    #[test]
    fn test_failure_maps_to_error_taxonomy() {
        assert!(matches!(SearchError::from(OracleFailure::Timeout), SearchError::OracleTimeout));
        assert!(matches!(
            SearchError::from(OracleFailure::Fault("boom".into())),
            SearchError::OracleError(_)
        ));
    }
}
