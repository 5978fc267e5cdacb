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
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use itertools::Itertools;

use zonal_core::{OutputSink, StatKind};

/// Writes one `id, stat=value, stat=value...` line per zone, in `StatKind`
/// table order (spec §4.4), `BufWriter`-backed the way the original
/// `zonal_stats::main::run` wrote its summary CSV.
pub struct CsvOutputSink {
    writer: BufWriter<File>,
}

impl CsvOutputSink {
    pub fn create(path: &Path) -> std::io::Result<Self> {
        Ok(CsvOutputSink {
            writer: BufWriter::new(File::create(path)?),
        })
    }
}

impl OutputSink for CsvOutputSink {
    fn write(&mut self, id: &str, stats: &std::collections::HashMap<String, f64>) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let fields = StatKind::all()
            .iter()
            .map(|k| format!("{}={}", k.name(), stats.get(k.name()).copied().unwrap_or(f64::NAN)))
            .join(", ");

        writeln!(self.writer, "{}, {}", id, fields)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::env::temp_dir;
    use std::fs::{read_to_string, remove_file};

    #[test]
    fn test_writes_one_line_per_zone() {
        let path = temp_dir().join("zonal_stats_test_sink.csv");
        {
            let mut sink = CsvOutputSink::create(&path).unwrap();
            let mut stats = HashMap::new();
            stats.insert("count".to_string(), 4.0);
            stats.insert("mean".to_string(), 7.5);
            sink.write("zone_a", &stats).unwrap();
        }

        let content = read_to_string(&path).unwrap();
        assert!(content.starts_with("zone_a, count=4"));
        assert!(content.contains("mean=7.5"));

        remove_file(&path).ok();
    }
}
