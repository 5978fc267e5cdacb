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
use thiserror::Error;

/// The error kinds of the zonal-stats core, per the error handling design.
///
/// The policy around these: a failing zone is reported and processing
/// continues with the next zone. Stats queries on empty accumulators
/// return NaN/a sentinel, they never produce one of these.
#[derive(Clone, PartialEq, Debug, Error)]
pub enum ZonalError {
    #[error("coordinate ({x}, {y}) is outside the bounded grid extent {xmin}..{xmax}, {ymin}..{ymax}")]
    OutOfExtent {
        x: f64,
        y: f64,
        xmin: f64,
        xmax: f64,
        ymin: f64,
        ymax: f64,
    },

    #[error("grids are not compatible for common_grid: dx {lhs_dx}/{rhs_dx}, dy {lhs_dy}/{rhs_dy}")]
    IncompatibleGrids {
        lhs_dx: f64,
        rhs_dx: f64,
        lhs_dy: f64,
        rhs_dy: f64,
    },

    #[error("invalid polygon geometry: {reason}")]
    InvalidGeometry { reason: String },

    #[error("unknown statistic '{name}'")]
    UnknownStatistic { name: String },

    #[error("zone '{zone_id}' has no contributing cells for this query")]
    NodataAllCells { zone_id: String },
}

pub type Result<T> = std::result::Result<T, ZonalError>;
