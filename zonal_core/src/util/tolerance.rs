/*
This file is part of the Building Aggregration Tool
Copyright (C) 2022 Novel-T

The Building Aggregration Tool is free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with this program.  If not, see <http://www.gnu.org/licenses/>.
*/
use float_cmp::{ApproxEq, F64Margin};

/// Absolute tolerance used when comparing raw coordinates (segment/grid-line
/// intersection tests inside the traversal). Per the numerical policy.
pub const COORD_ABS_EPSILON: f64 = 1e-12;
/// Relative tolerance used alongside [`COORD_ABS_EPSILON`] for coordinate
/// comparisons, and for row/column lookup tie-breaking.
pub const COORD_REL_EPSILON: f64 = 1e-8;
/// Relative tolerance used for row/column-count rounding and grid
/// compatibility testing.
pub const GRID_REL_EPSILON: f64 = 1e-6;

/// True if `a` and `b` agree within [`GRID_REL_EPSILON`] relative tolerance
/// (falling back to absolute comparison near zero).
pub fn approx_eq_rel(a: f64, b: f64, rel_epsilon: f64) -> bool {
    let scale = a.abs().max(b.abs()).max(1.0);
    a.approx_eq(
        b,
        F64Margin {
            epsilon: rel_epsilon * scale,
            ulps: 2,
        },
    )
}

/// Round-half-away-from-zero, the rounding rule the grid's row/column count
/// derivation uses (`round()` in Rust is already round-half-away-from-zero
/// for positive and negative values, so this is a thin, documented wrapper).
#[inline]
pub fn round_half_away_from_zero(x: f64) -> f64 {
    x.round()
}

/// `a <= b`, tolerant of floating point noise at the `GRID_REL_EPSILON` scale.
pub fn le_tolerant(a: f64, b: f64) -> bool {
    a <= b || approx_eq_rel(a, b, GRID_REL_EPSILON)
}

/// `a >= b`, tolerant of floating point noise at the `GRID_REL_EPSILON` scale.
pub fn ge_tolerant(a: f64, b: f64) -> bool {
    a >= b || approx_eq_rel(a, b, GRID_REL_EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approx_eq_rel() {
        assert!(approx_eq_rel(1.0, 1.0 + 1e-10, 1e-6));
        assert!(!approx_eq_rel(1.0, 1.1, 1e-6));
        assert!(approx_eq_rel(0.0, 1e-10, 1e-6));
    }

    #[test]
    fn test_tolerant_comparisons() {
        assert!(le_tolerant(1.0, 1.0 + 1e-10));
        assert!(ge_tolerant(1.0 + 1e-10, 1.0));
        assert!(!le_tolerant(1.1, 1.0));
    }
}
