//! Resolution schedule for a container.
//!
//! The schedule is every positive divisor of `gcd(⌊L⌋, ⌊W⌋)`, coarsest first.
//! Coarse grids are cheap for the oracle, and a combination found feasible
//! on a coarse grid is reused at every finer one.

use crate::error::{Result, SearchError};

/// Ordered (descending) resolutions for a `length` x `width` container.
pub fn schedule(length: f64, width: f64) -> Result<Vec<u64>> {
    if !(length > 0.0) || !(width > 0.0) || !length.is_finite() || !width.is_finite() {
        return Err(SearchError::InvalidDimensions { length, width });
    }

    let (l, w) = (length.floor() as u64, width.floor() as u64);
    if l == 0 || w == 0 {
        // Sub-unit sides only admit the unit grid.
        return Ok(vec![1]);
    }

    Ok(divisors_descending(gcd(l, w)))
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

fn divisors_descending(n: u64) -> Vec<u64> {
    let mut small = Vec::new();
    let mut large = Vec::new();
    let mut i = 1;
    while i * i <= n {
        if n % i == 0 {
            small.push(i);
            if i != n / i {
                large.push(n / i);
            }
        }
        i += 1;
    }
    // `large` is already descending; `small` ascending.
    large.extend(small.into_iter().rev());
    large
}
