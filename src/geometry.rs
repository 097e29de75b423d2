//! Positions and bearing calculations.
//!
//! Contains helper functions for:
//! - Distance calculations (squared distance to avoid sqrt in hot paths)
//! - Azimuth computation between two endpoint positions
//!
//! Positions are in meters. Azimuth is the horizontal bearing from one point
//! to another, measured in radians from the +x axis, counter-clockwise, in
//! the range (-π, π]. Directional antenna gain is looked up by this angle;
//! the z component contributes to distance (and thus loss/delay) only.

use serde::Deserialize;

/// A point in 3D space, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    /// Height; defaults to 0 when absent from scene files.
    #[serde(default)]
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Position { x, y, z }
    }

    /// Squared Euclidean distance (avoids a sqrt when only comparing).
    pub fn distance2(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    /// Euclidean distance in meters.
    pub fn distance_to(&self, other: &Position) -> f64 {
        self.distance2(other).sqrt()
    }

    /// Horizontal bearing from `self` toward `other`, in radians.
    ///
    /// Note that `a.azimuth_to(b)` and `b.azimuth_to(a)` are generally
    /// different angles (they differ by π for distinct points), which is why
    /// the link budget computes both directions instead of reusing one.
    /// For coincident horizontal positions the bearing is 0 by convention.
    pub fn azimuth_to(&self, other: &Position) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        if dx == 0.0 && dy == 0.0 {
            return 0.0;
        }
        dy.atan2(dx)
    }
}
