use super::scaling::ScaledProblem;
use super::{Deadline, OracleFailure, SearchClock, SolveRequest, SolverGateway, Verdict};

/// Exact packing by branching on how each pair of items is separated.
///
/// Every pair sits left of, right of, below or above the other. Once an
/// orientation and a relation per pair is fixed, the tightest coordinates are
/// longest paths over the relation graph, so a branch is feasible iff those
/// paths stay inside the container. Rotation is permitted and the resolution
/// is not used.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisjunctiveOracle;

#[derive(Debug, Clone, Copy)]
enum Relation {
    Left,
    Below,
    Right,
    Above,
}

const RELATIONS: [Relation; 4] = [Relation::Left, Relation::Below, Relation::Right, Relation::Above];

/// `pos[to] >= pos[from] + extent[from]` for every edge.
fn longest_paths(edges: &[(usize, usize)], extent: &[i64], limit: i64) -> Option<Vec<i64>> {
    let mut pos = vec![0i64; extent.len()];
    loop {
        let mut changed = false;
        for &(from, to) in edges {
            let need = pos[from] + extent[from];
            if pos[to] < need {
                pos[to] = need;
                // Also catches cycles, which grow without bound.
                if need + extent[to] > limit {
                    return None;
                }
                changed = true;
            }
        }
        if !changed {
            return Some(pos);
        }
    }
}

struct Separation<'a, 'c> {
    problem: &'a ScaledProblem,
    pairs: Vec<(usize, usize)>,
    widths: Vec<i64>,
    heights: Vec<i64>,
    x_edges: Vec<(usize, usize)>,
    y_edges: Vec<(usize, usize)>,
    clock: &'a mut SearchClock<'c>,
}

impl Separation<'_, '_> {
    fn orient(&mut self, item: usize) -> Result<Option<Vec<(i64, i64)>>, OracleFailure> {
        if item == self.widths.len() {
            return self.separate(0);
        }
        for (w, h) in self.problem.orientations(item, true) {
            self.widths[item] = w;
            self.heights[item] = h;
            if let Some(found) = self.orient(item + 1)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    fn separate(&mut self, pair: usize) -> Result<Option<Vec<(i64, i64)>>, OracleFailure> {
        self.clock.tick()?;

        let xs = longest_paths(&self.x_edges, &self.widths, self.problem.length);
        let ys = longest_paths(&self.y_edges, &self.heights, self.problem.width);
        let (Some(xs), Some(ys)) = (xs, ys) else {
            return Ok(None);
        };
        if pair == self.pairs.len() {
            return Ok(Some(xs.into_iter().zip(ys).collect()));
        }

        let (i, j) = self.pairs[pair];
        for relation in RELATIONS {
            let (edges, edge) = match relation {
                Relation::Left => (&mut self.x_edges, (i, j)),
                Relation::Right => (&mut self.x_edges, (j, i)),
                Relation::Below => (&mut self.y_edges, (i, j)),
                Relation::Above => (&mut self.y_edges, (j, i)),
            };
            edges.push(edge);
            let found = self.separate(pair + 1);
            match relation {
                Relation::Left | Relation::Right => self.x_edges.pop(),
                Relation::Below | Relation::Above => self.y_edges.pop(),
            };
            if let Some(corners) = found? {
                return Ok(Some(corners));
            }
        }
        Ok(None)
    }
}

impl SolverGateway for DisjunctiveOracle {
    fn name(&self) -> &str {
        "disjunctive"
    }

    fn solve(&self, request: &SolveRequest<'_>, deadline: &Deadline) -> Result<Verdict, OracleFailure> {
        let problem = ScaledProblem::from_request(request)?;
        if problem.trivially_infeasible(true) {
            return Ok(Verdict::Infeasible);
        }

        let n = problem.items.len();
        let pairs = (0..n).flat_map(|i| (i + 1..n).map(move |j| (i, j))).collect();
        let mut clock = SearchClock::new(deadline);
        let mut search = Separation {
            problem: &problem,
            pairs,
            widths: vec![0; n],
            heights: vec![0; n],
            x_edges: Vec::new(),
            y_edges: Vec::new(),
            clock: &mut clock,
        };

        Ok(match search.orient(0)? {
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
    fn test_longest_paths() {
        // 0 left of 1 left of 2, each 3 wide.
        let edges = [(0, 1), (1, 2)];
        assert_eq!(longest_paths(&edges, &[3, 3, 3], 9), Some(vec![0, 3, 6]));
        assert_eq!(longest_paths(&edges, &[3, 3, 3], 8), None);
    }

    #[test]
    fn test_cycle_is_rejected() {
        let edges = [(0, 1), (1, 0)];
        assert_eq!(longest_paths(&edges, &[1, 1], 100), None);
    }
}
