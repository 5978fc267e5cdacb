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
mod csv_sink;
mod polygon_format;
mod raster_format;

use std::path::PathBuf;

use anyhow::Result;
use log::LevelFilter;
use simple_logger::SimpleLogger;
use structopt::StructOpt;

use zonal_core::TileRunner;

use crate::csv_sink::CsvOutputSink;
use crate::polygon_format::read_polygon_provider;
use crate::raster_format::read_raster_provider;

/// Computes area-weighted zonal statistics for a set of polygon zones
/// against a value raster (and, optionally, a weight raster), writing one
/// CSV row of statistics per zone.
#[derive(StructOpt)]
struct Cli {
    #[structopt(long, default_value = "Warn")]
    log_level: LevelFilter,

    #[structopt(parse(from_os_str), long, help = "Zone polygons, 'id;ring[|ring...]' per line")]
    zones: PathBuf,

    #[structopt(parse(from_os_str), long, help = "Bincode-serialized value raster")]
    value_raster: PathBuf,

    #[structopt(parse(from_os_str), long, help = "Bincode-serialized weight raster")]
    weight_raster: Option<PathBuf>,

    #[structopt(long, default_value = "NaN", help = "Nodata sentinel for the value raster")]
    value_nodata: f64,

    #[structopt(long, default_value = "NaN", help = "Nodata sentinel for the weight raster")]
    weight_nodata: f64,

    #[structopt(long, help = "Compute mode/minority/variety (requires per-value bookkeeping)")]
    store_values: bool,

    #[structopt(long, default_value = "1000000", help = "Memory-bounded tile size, in cells")]
    max_cells_per_tile: u64,

    #[structopt(parse(from_os_str), long, help = "Path to write the summary CSV")]
    summary_csv: PathBuf,
}

fn run(args: &Cli) -> Result<()> {
    let mut polygons = read_polygon_provider(&args.zones)?;
    let value_provider = read_raster_provider(&args.value_raster)?;
    let weight_provider = args
        .weight_raster
        .as_ref()
        .map(|p| read_raster_provider(p))
        .transpose()?;

    let mut runner = TileRunner::new(&value_provider, args.value_nodata, args.store_values)
        .with_max_cells_per_tile(args.max_cells_per_tile);
    if let Some(wp) = &weight_provider {
        runner = runner.with_weights(wp, args.weight_nodata);
    }

    let mut sink = CsvOutputSink::create(&args.summary_csv)?;
    runner.run_all(&mut polygons, &mut sink);

    Ok(())
}

fn main() {
    let args = Cli::from_args();
    SimpleLogger::new().with_level(args.log_level).init().unwrap();
    run(&args).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::temp_dir;
    use std::fs::{read_to_string, remove_file, write};

    use zonal_core::{Envelope, Grid, Raster};

    use crate::raster_format::write_raster_file;

    #[test]
    fn test_end_to_end_full_coverage_zone() {
        let zones_path = temp_dir().join("zonal_stats_main_test_zones.txt");
        let raster_path = temp_dir().join("zonal_stats_main_test_raster.bin");
        let csv_path = temp_dir().join("zonal_stats_main_test_out.csv");

        write(&zones_path, "zone_a;0,0 4,0 4,4 0,4\n").unwrap();

        let grid = Grid::new(Envelope::new(0.0, 0.0, 4.0, 4.0), 1.0, 1.0);
        let raster = Raster::filled(grid, 3.0_f64);
        write_raster_file(&raster_path, &raster, -9999.0).unwrap();

        let args = Cli {
            log_level: LevelFilter::Off,
            zones: zones_path.clone(),
            value_raster: raster_path.clone(),
            weight_raster: None,
            value_nodata: -9999.0,
            weight_nodata: f64::NAN,
            store_values: false,
            max_cells_per_tile: 1_000_000,
            summary_csv: csv_path.clone(),
        };

        run(&args).unwrap();

        let content = read_to_string(&csv_path).unwrap();
        assert!(content.starts_with("zone_a,"));
        assert!(content.contains("count=16"));
        assert!(content.contains("mean=3"));

        remove_file(&zones_path).ok();
        remove_file(&raster_path).ok();
        remove_file(&csv_path).ok();
    }
}
