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
use std::fs::read_to_string;
use std::path::Path;

use anyhow::{bail, Result};

use zonal_core::{InMemoryPolygonProvider, Polygon};

/// Parses the CLI's small WKT-ish zone format: one zone per non-empty,
/// non-`#`-prefixed line, `id;ring[|ring...]`, each ring a space-separated
/// list of `x,y` vertex pairs. Real vector-format reading (shapefile,
/// GeoJSON, ...) is explicitly out of scope (spec §1); this is the
/// smallest stand-in for demonstrating the pipeline end-to-end.
///
/// Example:
/// ```text
/// zone_a;0,0 10,0 10,10 0,10
/// zone_b;20,20 30,20 30,30 20,30|22,22 24,22 24,24 22,24
/// ```
pub fn read_polygon_provider(path: &Path) -> Result<InMemoryPolygonProvider> {
    let text = read_to_string(path)?;
    let mut zones = Vec::new();

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (id, rings_text) = match line.split_once(';') {
            Some(parts) => parts,
            None => bail!("line {}: expected 'id;ring[|ring...]', got {:?}", lineno + 1, line),
        };

        let mut rings = Vec::new();
        for ring_text in rings_text.split('|') {
            let mut ring = Vec::new();
            for pair in ring_text.split_whitespace() {
                let (x_text, y_text) = match pair.split_once(',') {
                    Some(parts) => parts,
                    None => bail!("line {}: expected 'x,y', got {:?}", lineno + 1, pair),
                };
                let x: f64 = x_text.parse()?;
                let y: f64 = y_text.parse()?;
                ring.push((x, y));
            }
            rings.push(ring);
        }

        zones.push((id.to_string(), Polygon::new(rings)));
    }

    Ok(InMemoryPolygonProvider::new(zones))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::temp_dir;
    use std::fs::write;
    use zonal_core::PolygonProvider;

    #[test]
    fn test_parses_single_ring_zone() {
        let path = temp_dir().join("zonal_stats_test_zones.txt");
        write(&path, "zone_a;0,0 10,0 10,10 0,10\n").unwrap();

        let mut provider = read_polygon_provider(&path).unwrap();
        assert!(provider.next());
        assert_eq!(provider.current_id(), "zone_a");
        assert_eq!(provider.current_polygon().rings.len(), 1);
        assert!(!provider.next());

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_parses_multi_ring_zone() {
        let path = temp_dir().join("zonal_stats_test_zones_multi.txt");
        write(
            &path,
            "zone_b;20,20 30,20 30,30 20,30|22,22 24,22 24,24 22,24\n",
        )
        .unwrap();

        let mut provider = read_polygon_provider(&path).unwrap();
        assert!(provider.next());
        assert_eq!(provider.current_polygon().rings.len(), 2);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_skips_blank_and_comment_lines() {
        let path = temp_dir().join("zonal_stats_test_zones_comments.txt");
        write(&path, "# a comment\n\nzone_a;0,0 1,0 1,1 0,1\n").unwrap();

        let mut provider = read_polygon_provider(&path).unwrap();
        assert!(provider.next());
        assert!(!provider.next());

        std::fs::remove_file(&path).ok();
    }
}
