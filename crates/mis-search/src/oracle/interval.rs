use super::lattice::{self, Orientation};
use super::scaling::ScaledProblem;
use super::{Deadline, OracleFailure, SearchClock, SolveRequest, SolverGateway, Verdict};

/// Longest axis, in scaled units, for which normal patterns are computed.
const MAX_PATTERN_SPAN: i64 = 1 << 22;

/// Exact packing with free positions and 90° rotation.
///
/// Any packing can be pushed left and down until every item touches the
/// container or another item, so each coordinate is a sum of extents of
/// other items ("normal patterns"). Searching those coordinates is exact. The
/// resolution is not used.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntervalOracle;

/// All sums `<= limit` that pick at most one extent from each group.
fn normal_patterns(groups: &[Vec<i64>], limit: i64) -> Vec<i64> {
    let limit = limit as usize;
    let mut reach = vec![false; limit + 1];
    reach[0] = true;

    for extents in groups {
        let before = reach.clone();
        for (sum, _) in before.iter().enumerate().filter(|(_, r)| **r) {
            for &e in extents {
                let next = sum + e as usize;
                if next <= limit {
                    reach[next] = true;
                }
            }
        }
    }

    reach
        .iter()
        .enumerate()
        .filter(|(_, r)| **r)
        .map(|(sum, _)| sum as i64)
        .collect()
}

/// Per other item, the extents it can take along one axis.
fn extents_of_others(
    orientations: &[Vec<(i64, i64)>],
    skip: usize,
    axis: impl Fn(&(i64, i64)) -> i64,
) -> Vec<Vec<i64>> {
    orientations
        .iter()
        .enumerate()
        .filter(|(j, _)| *j != skip)
        .map(|(_, o)| o.iter().map(&axis).collect())
        .collect()
}

impl SolverGateway for IntervalOracle {
    fn name(&self) -> &str {
        "interval"
    }

    fn solve(&self, request: &SolveRequest<'_>, deadline: &Deadline) -> Result<Verdict, OracleFailure> {
        let problem = ScaledProblem::from_request(request)?;
        if problem.trivially_infeasible(true) {
            return Ok(Verdict::Infeasible);
        }
        if problem.length.max(problem.width) > MAX_PATTERN_SPAN {
            return Err(OracleFailure::Fault(format!(
                "container of {} x {} scaled units is too large for the interval oracle",
                problem.length, problem.width
            )));
        }

        let n = problem.items.len();
        let orientations: Vec<Vec<(i64, i64)>> = (0..n).map(|i| problem.orientations(i, true)).collect();

        let mut clock = SearchClock::new(deadline);
        let mut options = Vec::with_capacity(n);
        for i in 0..n {
            clock.tick()?;
            let x_groups = extents_of_others(&orientations, i, |&(w, _)| w);
            let y_groups = extents_of_others(&orientations, i, |&(_, h)| h);

            options.push(
                orientations[i]
                    .iter()
                    .map(|&(w, h)| Orientation {
                        w,
                        h,
                        xs: normal_patterns(&x_groups, problem.length - w),
                        ys: normal_patterns(&y_groups, problem.width - h),
                    })
                    .collect::<Vec<_>>(),
            );
        }

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_patterns() {
        assert_eq!(normal_patterns(&[], 5), vec![0]);
        assert_eq!(normal_patterns(&[vec![2], vec![3]], 10), vec![0, 2, 3, 5]);
        // One extent per group at most: 2 + 2 is not reachable from one group.
        assert_eq!(normal_patterns(&[vec![2, 4]], 10), vec![0, 2, 4]);
        assert_eq!(normal_patterns(&[vec![4], vec![4]], 6), vec![0, 4]);
    }
}
