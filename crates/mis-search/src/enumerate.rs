//! Combination enumerators.
//!
//! Every strategy yields subsets of size two or more, each exactly once, in
//! an order where a subset always comes before any of its strict supersets.
//! For `all`/`bfs` this follows from the size-ascending order. For `dfs` it
//! follows from the include/exclude order: the first key where a subset and
//! its superset differ is excluded from the subset, and the exclude branch is
//! always explored first.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::Combination;

/// Traversal order over the subset lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Size-ascending, lexicographic within a size.
    All,
    /// Same order as `All`.
    #[default]
    Bfs,
    /// Include/exclude traversal in key order.
    Dfs,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::All => "all",
            Strategy::Bfs => "bfs",
            Strategy::Dfs => "dfs",
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(Strategy::All),
            "bfs" => Ok(Strategy::Bfs),
            "dfs" => Ok(Strategy::Dfs),
            other => Err(format!("unknown strategy '{}', expected all, bfs or dfs", other)),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Start a fresh enumeration of `keys` under `strategy`.
pub fn enumerate(keys: &[String], strategy: Strategy) -> Combinations<'_> {
    Combinations::new(keys, strategy, None)
}

/// Lazy, finite sequence of combinations.
///
/// Each call to [`enumerate`] builds an independent cursor.
pub struct Combinations<'a> {
    keys: &'a [String],
    max_size: usize,
    inner: Traversal,
}

enum Traversal {
    BySize(BySize),
    DepthFirst(DepthFirst),
}

impl<'a> Combinations<'a> {
    pub fn new(keys: &'a [String], strategy: Strategy, max_size: Option<usize>) -> Self {
        let max_size = max_size.unwrap_or(keys.len()).min(keys.len());
        let inner = match strategy {
            Strategy::All | Strategy::Bfs => Traversal::BySize(BySize::new(keys.len(), max_size)),
            Strategy::Dfs => Traversal::DepthFirst(DepthFirst::new(keys.len(), max_size)),
        };
        Self {
            keys,
            max_size,
            inner,
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl Iterator for Combinations<'_> {
    type Item = Combination;

    fn next(&mut self) -> Option<Self::Item> {
        let indices = match &mut self.inner {
            Traversal::BySize(t) => t.next_indices()?,
            Traversal::DepthFirst(t) => t.next_indices()?,
        };
        Some(Combination::new(indices.iter().map(|&i| self.keys[i].as_str())))
    }
}

/// Index combinations of size 2, 3, .., `max_size`, lexicographic within a size.
struct BySize {
    n: usize,
    max_size: usize,
    current: Vec<usize>,
    started: bool,
}

impl BySize {
    fn new(n: usize, max_size: usize) -> Self {
        Self {
            n,
            max_size,
            current: Vec::new(),
            started: false,
        }
    }

    fn next_indices(&mut self) -> Option<Vec<usize>> {
        if self.max_size < 2 {
            return None;
        }
        if !self.started {
            self.started = true;
            self.current = (0..2).collect();
            return Some(self.current.clone());
        }

        let k = self.current.len();
        // Rightmost position that can still move forward.
        let mut i = k;
        while i > 0 {
            i -= 1;
            if self.current[i] < self.n - k + i {
                self.current[i] += 1;
                for j in i + 1..k {
                    self.current[j] = self.current[j - 1] + 1;
                }
                return Some(self.current.clone());
            }
        }

        if k >= self.max_size {
            return None;
        }
        self.current = (0..k + 1).collect();
        Some(self.current.clone())
    }
}

enum Frame {
    Enter(usize),
    Include(usize),
    Leave,
}

/// Explicit-stack include/exclude traversal.
///
/// For index `i` the branch without key `i` is explored before the branch
/// with it; a subset is emitted when the index reaches the end of the keys.
struct DepthFirst {
    n: usize,
    max_size: usize,
    stack: Vec<Frame>,
    current: Vec<usize>,
}

impl DepthFirst {
    fn new(n: usize, max_size: usize) -> Self {
        let stack = if max_size >= 2 { vec![Frame::Enter(0)] } else { Vec::new() };
        Self {
            n,
            max_size,
            stack,
            current: Vec::new(),
        }
    }

    fn next_indices(&mut self) -> Option<Vec<usize>> {
        while let Some(frame) = self.stack.pop() {
            match frame {
                Frame::Enter(idx) if idx == self.n => {
                    if self.current.len() >= 2 {
                        return Some(self.current.clone());
                    }
                }
                Frame::Enter(idx) => {
                    if self.current.len() < self.max_size {
                        self.stack.push(Frame::Include(idx));
                    }
                    self.stack.push(Frame::Enter(idx + 1));
                }
                Frame::Include(idx) => {
                    self.current.push(idx);
                    self.stack.push(Frame::Leave);
                    self.stack.push(Frame::Enter(idx + 1));
                }
                Frame::Leave => {
                    self.current.pop();
                }
            }
        }
        None
    }
}
