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

//! Area-weighted zonal statistics: a cell-intersection engine that walks a
//! polygon boundary across a regular grid and a streaming accumulator that
//! turns the resulting coverage fractions, together with value and optional
//! weight rasters, into per-zone summary statistics.
//!
//! The crate is organized leaf-first, per component:
//! - [`grid`] — the grid algebra (extents, compatibility, subdivision).
//! - [`raster`] — dense cell buffers and resolution-reinterpreting views.
//! - [`engine`] — the cell-intersection engine (`intersect`).
//! - [`stats`] — the statistics accumulator and its statistic dispatch.
//! - [`providers`] / [`runner`] — the external-interface traits and the
//!   control flow that sequences the above for one zone at a time.

pub mod engine;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod providers;
pub mod raster;
pub mod runner;
pub mod stats;
pub mod util;

pub use engine::intersect;
pub use error::{Result, ZonalError};
pub use geometry::{Envelope, Point, Polygon, Ring, Segment};
pub use grid::Grid;
pub use providers::{InMemoryPolygonProvider, InMemoryRasterProvider, OutputSink, PolygonProvider, RasterProvider};
pub use raster::{Raster, RasterView};
pub use runner::TileRunner;
pub use stats::{StatKind, StatsAccumulator};
