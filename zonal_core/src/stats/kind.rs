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
use crate::error::{Result, ZonalError};

/// Tagged variant of every statistic the accumulator can answer (spec §9
/// "Statistics dispatch" design note: a tagged enum plus a method table
/// instead of a chain of string comparisons, so an unknown statistic is a
/// compile-time impossibility for in-process callers). `UnknownStatistic`
/// remains reachable only through [`StatKind::parse`], the boundary where
/// an arbitrary string name (from a CLI flag or output-sink config) is
/// turned into a `StatKind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatKind {
    Count,
    Sum,
    Mean,
    Min,
    Max,
    Variety,
    Mode,
    Minority,
    WeightedCount,
    WeightedSum,
    WeightedMean,
    WeightedFraction,
    /// (supplement) coverage-weighted variance of the values, Σf(v-mean)²/Σf.
    Variance,
    /// (supplement) `sqrt(variance)`.
    Stddev,
}

impl StatKind {
    /// True iff answering this statistic requires the per-value frequency
    /// map (spec §4.4 `store_values`): mode, minority, variety, and the
    /// weighted fraction all need per-distinct-value accounting; everything
    /// else is answerable from the running moment sums alone.
    pub fn requires_value_store(self) -> bool {
        matches!(self, StatKind::Mode | StatKind::Minority | StatKind::Variety)
    }

    pub fn name(self) -> &'static str {
        match self {
            StatKind::Count => "count",
            StatKind::Sum => "sum",
            StatKind::Mean => "mean",
            StatKind::Min => "min",
            StatKind::Max => "max",
            StatKind::Variety => "variety",
            StatKind::Mode => "mode",
            StatKind::Minority => "minority",
            StatKind::WeightedCount => "weighted_count",
            StatKind::WeightedSum => "weighted_sum",
            StatKind::WeightedMean => "weighted_mean",
            StatKind::WeightedFraction => "weighted_fraction",
            StatKind::Variance => "variance",
            StatKind::Stddev => "stddev",
        }
    }

    /// Parses the CLI/output-sink's string statistic name. This is the one
    /// place `UnknownStatistic` can actually occur (spec §7).
    pub fn parse(name: &str) -> Result<StatKind> {
        let kind = match name {
            "count" => StatKind::Count,
            "sum" => StatKind::Sum,
            "mean" => StatKind::Mean,
            "min" => StatKind::Min,
            "max" => StatKind::Max,
            "variety" => StatKind::Variety,
            "mode" => StatKind::Mode,
            "minority" => StatKind::Minority,
            "weighted_count" => StatKind::WeightedCount,
            "weighted_sum" => StatKind::WeightedSum,
            "weighted_mean" => StatKind::WeightedMean,
            "weighted_fraction" => StatKind::WeightedFraction,
            "variance" => StatKind::Variance,
            "stddev" => StatKind::Stddev,
            other => {
                return Err(ZonalError::UnknownStatistic {
                    name: other.to_string(),
                })
            }
        };
        Ok(kind)
    }

    /// All statistics, in table order (spec §4.4 plus the variance/stddev
    /// supplement), for callers that want "everything" (e.g. the CLI's
    /// default `--stat all`).
    pub fn all() -> &'static [StatKind] {
        &[
            StatKind::Count,
            StatKind::Sum,
            StatKind::Mean,
            StatKind::Min,
            StatKind::Max,
            StatKind::Variety,
            StatKind::Mode,
            StatKind::Minority,
            StatKind::WeightedCount,
            StatKind::WeightedSum,
            StatKind::WeightedMean,
            StatKind::WeightedFraction,
            StatKind::Variance,
            StatKind::Stddev,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrips_name() {
        for &kind in StatKind::all() {
            assert_eq!(StatKind::parse(kind.name()).unwrap(), kind);
        }
    }

    #[test]
    fn test_parse_unknown_errors() {
        assert!(StatKind::parse("bogus").is_err());
    }
}
