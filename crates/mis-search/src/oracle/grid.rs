use super::lattice::{self, Orientation};
use super::scaling::ScaledProblem;
use super::{Deadline, OracleFailure, SearchClock, SolveRequest, SolverGateway, Verdict};

/// Places items at multiples of the resolution, in their given orientation.
///
/// A coarse resolution restricts the positions on offer, so a combination can
/// be infeasible at one resolution and feasible at a finer one.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridOracle;

fn multiples(step: i64, max: i64) -> Vec<i64> {
    (0..=max).step_by(step as usize).collect()
}

impl SolverGateway for GridOracle {
    fn name(&self) -> &str {
        "grid"
    }

    fn solve(&self, request: &SolveRequest<'_>, deadline: &Deadline) -> Result<Verdict, OracleFailure> {
        let problem = ScaledProblem::from_request(request)?;
        if problem.trivially_infeasible(false) {
            return Ok(Verdict::Infeasible);
        }

        let step = (request.resolution.max(1) as i64).saturating_mul(problem.scale);
        let options: Vec<Vec<Orientation>> = (0..problem.items.len())
            .map(|i| {
                problem
                    .orientations(i, false)
                    .into_iter()
                    .map(|(w, h)| Orientation {
                        w,
                        h,
                        xs: multiples(step, problem.length - w),
                        ys: multiples(step, problem.width - h),
                    })
                    .collect()
            })
            .collect();

        let mut clock = SearchClock::new(deadline);
        Ok(match lattice::search(&options, &mut clock)? {
            Some(corners) => Verdict::Feasible(
                corners
                    .into_iter()
                    .map(|(x, y)| problem.to_position(x, y))
                    .collect(),
            ),
            None => Verdict::Infeasible,
        })
    }
}
