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
use std::collections::HashMap;

use crate::error::{Result, ZonalError};
use crate::raster::{is_nodata_f64, Raster};
use crate::stats::StatKind;

/// Streaming, moment-style + frequency-style statistics accumulator (spec
/// §4.4). Consumes `(coverage, value, weight?)` cell triples without
/// materializing them; the per-distinct-value frequency map is allocated
/// only when `store_values` is set (spec §9 "value-store lazy allocation"),
/// since it dominates memory for large tiles when nobody asked for
/// `mode`/`minority`/`variety`.
pub struct StatsAccumulator {
    store_values: bool,
    value_nodata: f64,
    weight_nodata: f64,

    sum_f: f64,
    sum_fv: f64,
    sum_fw: f64,
    sum_fvw: f64,
    sum_fv2: f64,
    min: Option<f64>,
    max: Option<f64>,

    /// bit pattern of the value -> (value, coverage-weighted freq, weighted freq)
    freq: Option<HashMap<u64, (f64, f64, f64)>>,
}

impl StatsAccumulator {
    /// `store_values` should be true iff any statistic this accumulator
    /// will be queried for is in [`StatKind::requires_value_store`]'s set.
    pub fn new(store_values: bool, value_nodata: f64, weight_nodata: f64) -> Self {
        StatsAccumulator {
            store_values,
            value_nodata,
            weight_nodata,
            sum_f: 0.0,
            sum_fv: 0.0,
            sum_fw: 0.0,
            sum_fvw: 0.0,
            sum_fv2: 0.0,
            min: None,
            max: None,
            freq: None,
        }
    }

    pub fn store_values(&self) -> bool {
        self.store_values
    }

    /// Unweighted ingestion: `weight` is implicitly `1` for every cell.
    pub fn process(&mut self, coverage: &Raster<f64>, values: &Raster<f64>) -> Result<()> {
        self.process_impl(coverage, values, None)
    }

    /// Weighted ingestion.
    pub fn process_weighted(
        &mut self,
        coverage: &Raster<f64>,
        values: &Raster<f64>,
        weights: &Raster<f64>,
    ) -> Result<()> {
        self.process_impl(coverage, values, Some(weights))
    }

    fn process_impl(
        &mut self,
        coverage: &Raster<f64>,
        values: &Raster<f64>,
        weights: Option<&Raster<f64>>,
    ) -> Result<()> {
        require_same_grid(coverage, values)?;
        if let Some(w) = weights {
            require_same_grid(coverage, w)?;
        }

        for r in 0..coverage.rows() {
            for c in 0..coverage.cols() {
                let f = coverage.get(r, c);
                if f == 0.0 {
                    continue;
                }

                let v = values.get(r, c);
                if is_nodata_f64(v, self.value_nodata) {
                    continue;
                }

                let w = match weights {
                    Some(wr) => wr.get(r, c),
                    None => 1.0,
                };
                if is_nodata_f64(w, self.weight_nodata) {
                    continue;
                }

                self.sum_f += f;
                self.sum_fv += f * v;
                self.sum_fw += f * w;
                self.sum_fvw += f * v * w;
                self.sum_fv2 += f * v * v;
                self.min = Some(self.min.map_or(v, |m| m.min(v)));
                self.max = Some(self.max.map_or(v, |m| m.max(v)));

                if self.store_values {
                    let entry = self
                        .freq
                        .get_or_insert_with(HashMap::new)
                        .entry(v.to_bits())
                        .or_insert((v, 0.0, 0.0));
                    entry.1 += f;
                    entry.2 += f * w;
                }
            }
        }

        Ok(())
    }

    /// Combines another accumulator's state into this one (disjoint-tile
    /// additivity, spec §4.4/§8 — used when tiles of the same zone are
    /// accumulated independently, e.g. on separate worker threads, and
    /// later combined).
    pub fn merge(&mut self, other: &StatsAccumulator) {
        self.sum_f += other.sum_f;
        self.sum_fv += other.sum_fv;
        self.sum_fw += other.sum_fw;
        self.sum_fvw += other.sum_fvw;
        self.sum_fv2 += other.sum_fv2;

        self.min = merge_extreme(self.min, other.min, f64::min);
        self.max = merge_extreme(self.max, other.max, f64::max);

        if let Some(other_freq) = &other.freq {
            let mine = self.freq.get_or_insert_with(HashMap::new);
            for (&bits, &(v, f, wf)) in other_freq {
                let entry = mine.entry(bits).or_insert((v, 0.0, 0.0));
                entry.1 += f;
                entry.2 += wf;
            }
        }
    }

    /// `NodataAllCells` (spec §7): a zone where every cell was skipped
    /// (`count == 0` is a normal, non-error outcome from `query`; this is
    /// the one place it's surfaced as an error, for callers — like
    /// `TileRunner` — that want to treat an entirely-nodata zone as a
    /// failure rather than a silent zero).
    pub fn require_contributing_cells(&self, zone_id: &str) -> Result<()> {
        if self.sum_f == 0.0 {
            Err(ZonalError::NodataAllCells {
                zone_id: zone_id.to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Answers a statistic directly from its [`StatKind`]. Never fails:
    /// an empty accumulator returns `NaN` for moment statistics and `NaN`
    /// for frequency statistics too (spec §7's "sentinel" for
    /// mode/minority/min/max is `NaN`, matching the crate's float-only
    /// value domain).
    pub fn query(&self, kind: StatKind) -> f64 {
        match kind {
            StatKind::Count => self.sum_f,
            StatKind::Sum => self.sum_fv,
            StatKind::Mean => safe_div(self.sum_fv, self.sum_f),
            StatKind::Min => self.min.unwrap_or(f64::NAN),
            StatKind::Max => self.max.unwrap_or(f64::NAN),
            StatKind::Variety => self.variety(),
            StatKind::Mode => self.mode_like(true),
            StatKind::Minority => self.mode_like(false),
            StatKind::WeightedCount => self.sum_fw,
            StatKind::WeightedSum => self.sum_fvw,
            StatKind::WeightedMean => safe_div(self.sum_fvw, self.sum_fw),
            StatKind::WeightedFraction => safe_div(self.sum_fw, self.sum_f),
            StatKind::Variance => self.variance(),
            StatKind::Stddev => self.variance().sqrt(),
        }
    }

    /// String-keyed boundary entry point (spec §6 `query_named`); the only
    /// place an unrecognized statistic name fails with `UnknownStatistic`.
    pub fn query_named(&self, name: &str) -> Result<f64> {
        Ok(self.query(StatKind::parse(name)?))
    }

    /// All statistics as a `{name -> value}` map, `count` always present
    /// (spec §6 `RasterStats` serialization contract).
    pub fn results_map(&self) -> HashMap<String, f64> {
        StatKind::all()
            .iter()
            .map(|&k| (k.name().to_string(), self.query(k)))
            .collect()
    }

    fn variance(&self) -> f64 {
        if self.sum_f <= 0.0 {
            return f64::NAN;
        }
        let mean = self.sum_fv / self.sum_f;
        // clamp at 0: cancellation between sum_fv2/sum_f and mean*mean can
        // otherwise go slightly negative when contributing values are all
        // (near-)equal, which would turn Stddev's sqrt() into NaN.
        (self.sum_fv2 / self.sum_f - mean * mean).max(0.0)
    }

    fn variety(&self) -> f64 {
        match &self.freq {
            None => f64::NAN,
            Some(map) => map.values().filter(|&&(_, f, _)| f > 0.0).count() as f64,
        }
    }

    /// `want_max = true` picks the mode (maximum frequency); `false` picks
    /// the minority (minimum non-zero frequency). Both break ties toward
    /// the smaller value (spec §4.4 table).
    fn mode_like(&self, want_max: bool) -> f64 {
        let map = match &self.freq {
            Some(m) => m,
            None => return f64::NAN,
        };

        let mut best: Option<(f64, f64)> = None;
        for &(v, f, _) in map.values() {
            if f <= 0.0 {
                continue;
            }
            let better = match best {
                None => true,
                Some((bv, bf)) => {
                    if want_max {
                        f > bf || (f == bf && v < bv)
                    } else {
                        f < bf || (f == bf && v < bv)
                    }
                }
            };
            if better {
                best = Some((v, f));
            }
        }

        best.map(|(v, _)| v).unwrap_or(f64::NAN)
    }
}

fn safe_div(num: f64, denom: f64) -> f64 {
    if denom > 0.0 {
        num / denom
    } else {
        f64::NAN
    }
}

fn merge_extreme(a: Option<f64>, b: Option<f64>, pick: impl Fn(f64, f64) -> f64) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(pick(x, y)),
        (Some(x), None) => Some(x),
        (None, Some(y)) => Some(y),
        (None, None) => None,
    }
}

fn require_same_grid(a: &Raster<f64>, b: &Raster<f64>) -> Result<()> {
    if a.extent() == b.extent() && a.xres() == b.xres() && a.yres() == b.yres() {
        Ok(())
    } else {
        Err(ZonalError::IncompatibleGrids {
            lhs_dx: a.xres(),
            rhs_dx: b.xres(),
            lhs_dy: a.yres(),
            rhs_dy: b.yres(),
        })
    }
}
