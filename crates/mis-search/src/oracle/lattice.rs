//! Exhaustive placement over per-item candidate coordinates.

use super::{OracleFailure, SearchClock};

/// One way to place an item: its extent and the coordinates it may start at.
///
/// Callers only supply coordinates that keep the item inside the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Orientation {
    pub w: i64,
    pub h: i64,
    pub xs: Vec<i64>,
    pub ys: Vec<i64>,
}

#[derive(Debug, Clone, Copy)]
struct Rect {
    x: i64,
    y: i64,
    w: i64,
    h: i64,
}

impl Rect {
    fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }
}

/// Chosen (orientation, y index, x index) of a placed item.
type Choice = (usize, usize, usize);

struct Lattice<'a, 'c> {
    options: &'a [Vec<Orientation>],
    order: Vec<usize>,
    /// `twin[d]`: item at depth `d` has the same options as the one at `d - 1`.
    twin: Vec<bool>,
    placed: Vec<Rect>,
    choices: Vec<Choice>,
    clock: &'a mut SearchClock<'c>,
}

impl Lattice<'_, '_> {
    fn place(&mut self, depth: usize) -> Result<bool, OracleFailure> {
        if depth == self.order.len() {
            return Ok(true);
        }

        let item = self.order[depth];
        // Interchangeable items are placed in non-decreasing choice order.
        let floor = if self.twin[depth] { self.choices[depth - 1] } else { (0, 0, 0) };

        for (oi, o) in self.options[item].iter().enumerate() {
            for (yi, &y) in o.ys.iter().enumerate() {
                for (xi, &x) in o.xs.iter().enumerate() {
                    if (oi, yi, xi) < floor {
                        continue;
                    }
                    self.clock.tick()?;

                    let rect = Rect { x, y, w: o.w, h: o.h };
                    if self.placed.iter().any(|p| p.overlaps(&rect)) {
                        continue;
                    }

                    self.placed.push(rect);
                    self.choices.push((oi, yi, xi));
                    if self.place(depth + 1)? {
                        return Ok(true);
                    }
                    self.placed.pop();
                    self.choices.pop();
                }
            }
        }

        Ok(false)
    }
}

/// Find non-overlapping lower-left corners, one per item, or prove none exist
/// among the given candidates.
pub(crate) fn search(
    options: &[Vec<Orientation>],
    clock: &mut SearchClock<'_>,
) -> Result<Option<Vec<(i64, i64)>>, OracleFailure> {
    let area = |i: usize| options[i].first().map(|o| o.w * o.h).unwrap_or(0);

    // Large items first.
    let mut order: Vec<usize> = (0..options.len()).collect();
    order.sort_by(|&a, &b| area(b).cmp(&area(a)).then(a.cmp(&b)));

    let twin = (0..order.len())
        .map(|d| d > 0 && options[order[d]] == options[order[d - 1]])
        .collect();

    let mut lattice = Lattice {
        options,
        order,
        twin,
        placed: Vec::with_capacity(options.len()),
        choices: Vec::with_capacity(options.len()),
        clock,
    };

    if !lattice.place(0)? {
        return Ok(None);
    }

    let mut corners = vec![(0, 0); options.len()];
    for (depth, &item) in lattice.order.iter().enumerate() {
        let rect = lattice.placed[depth];
        corners[item] = (rect.x, rect.y);
    }
    Ok(Some(corners))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::Deadline;

    fn grid(w: i64, h: i64, max_x: i64, max_y: i64) -> Vec<Orientation> {
        vec![Orientation {
            w,
            h,
            xs: (0..=max_x).collect(),
            ys: (0..=max_y).collect(),
        }]
    }

    #[test]
    fn test_twins_are_placed_once() {
        let deadline = Deadline::unbounded();
        let mut clock = SearchClock::new(&deadline);
        // Four 2x2 squares tile a 4x4 container.
        let options = vec![grid(2, 2, 2, 2); 4];
        let corners = search(&options, &mut clock).unwrap().unwrap();
        let mut sorted = corners.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), 4);
    }

    #[test]
    fn test_no_candidates_is_infeasible() {
        let deadline = Deadline::unbounded();
        let mut clock = SearchClock::new(&deadline);
        let options = vec![grid(3, 3, 1, 1), grid(3, 3, 1, 1)];
        assert_eq!(search(&options, &mut clock).unwrap(), None);
    }

    #[test]
    fn test_results_follow_input_order() {
        let deadline = Deadline::unbounded();
        let mut clock = SearchClock::new(&deadline);
        // The wide item is searched first but reported second.
        let options = vec![grid(1, 1, 3, 1), grid(4, 1, 0, 1)];
        let corners = search(&options, &mut clock).unwrap().unwrap();
        assert_eq!(corners[1], (0, 0));
        assert_eq!(corners[0].1, 1);
    }
}
