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
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle `(xmin, ymin, xmax, ymax)`, spec's "Box".
///
/// `xmin <= xmax` and `ymin <= ymax` always hold; a degenerate (zero-area)
/// envelope is permitted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Envelope {
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        assert!(xmin <= xmax, "xmin {} > xmax {}", xmin, xmax);
        assert!(ymin <= ymax, "ymin {} > ymax {}", ymin, ymax);
        Envelope { xmin, ymin, xmax, ymax }
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    pub fn intersects(&self, other: &Envelope) -> bool {
        self.xmin <= other.xmax
            && self.xmax >= other.xmin
            && self.ymin <= other.ymax
            && self.ymax >= other.ymin
    }

    pub fn intersection(&self, other: &Envelope) -> Option<Envelope> {
        if !self.intersects(other) {
            return None;
        }

        let xmin = self.xmin.max(other.xmin);
        let ymin = self.ymin.max(other.ymin);
        let xmax = self.xmax.min(other.xmax);
        let ymax = self.ymax.min(other.ymax);

        if xmin > xmax || ymin > ymax {
            return None;
        }

        Some(Envelope { xmin, ymin, xmax, ymax })
    }

    pub fn contains(&self, point: (f64, f64)) -> bool {
        let (x, y) = point;
        x >= self.xmin && x <= self.xmax && y >= self.ymin && y <= self.ymax
    }

    pub fn union(&self, other: &Envelope) -> Envelope {
        Envelope {
            xmin: self.xmin.min(other.xmin),
            ymin: self.ymin.min(other.ymin),
            xmax: self.xmax.max(other.xmax),
            ymax: self.ymax.max(other.ymax),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersects() {
        let a = Envelope::new(0.0, 0.0, 10.0, 10.0);
        let b = Envelope::new(5.0, 5.0, 15.0, 15.0);
        let c = Envelope::new(20.0, 20.0, 30.0, 30.0);

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_intersection() {
        let a = Envelope::new(0.0, 0.0, 10.0, 10.0);
        let b = Envelope::new(5.0, 5.0, 15.0, 15.0);

        let i = a.intersection(&b).unwrap();
        assert_eq!(i, Envelope::new(5.0, 5.0, 10.0, 10.0));
    }

    #[test]
    fn test_contains() {
        let a = Envelope::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.contains((5.0, 5.0)));
        assert!(a.contains((0.0, 0.0)));
        assert!(!a.contains((10.1, 5.0)));
    }

    #[test]
    fn test_union() {
        let a = Envelope::new(0.0, 0.0, 10.0, 10.0);
        let b = Envelope::new(5.0, -5.0, 20.0, 5.0);
        assert_eq!(a.union(&b), Envelope::new(0.0, -5.0, 20.0, 10.0));
    }
}
