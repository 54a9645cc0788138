// Position value object

use std::fmt;

use serde::{Deserialize, Serialize};

/// Positions closer than this to the world origin are treated as "not yet placed".
pub const ORIGIN_SENTINEL_RADIUS: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const UP: Vec3 = Vec3 {
        x: 0.0,
        y: 1.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn add(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn sub(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn scale(self, factor: f32) -> Vec3 {
        Vec3::new(self.x * factor, self.y * factor, self.z * factor)
    }

    pub fn lifted(self, height: f32) -> Vec3 {
        Vec3::new(self.x, self.y + height, self.z)
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    pub fn distance(self, other: Vec3) -> f32 {
        self.sub(other).length()
    }

    pub fn distance_squared(self, other: Vec3) -> f32 {
        self.sub(other).length_squared()
    }

    pub fn midpoint(self, other: Vec3) -> Vec3 {
        self.add(other).scale(0.5)
    }

    pub fn normalized(self) -> Vec3 {
        let len = self.length();
        if len <= f32::EPSILON {
            return Vec3::ZERO;
        }
        self.scale(1.0 / len)
    }

    /// True for the unplaced placeholder positions some hosts report before physics settles.
    pub fn is_origin_sentinel(self) -> bool {
        self.distance(Vec3::ZERO) <= ORIGIN_SENTINEL_RADIUS
    }

    /// Teleport-friendly "x,y,z" label with one decimal.
    pub fn coordinate_label(self) -> String {
        format!("{:.1},{:.1},{:.1}", self.x, self.y, self.z)
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

/// Map-grid cell label ("G12") for a world of `world_size` units centred on the origin.
///
/// Cells are 1024/7 units wide, columns are lettered from the west edge and rows are numbered
/// from the north edge.
pub fn grid_label(position: Vec3, world_size: f32) -> String {
    if world_size <= 0.0 {
        return "??".to_string();
    }
    let half = world_size / 2.0;
    let norm_x = ((position.x + half) / world_size).clamp(0.0, 1.0);
    let norm_z = ((position.z + half) / world_size).clamp(0.0, 1.0);
    let cells = world_size / 1024.0 * 7.0;
    let column = (norm_x * cells).floor() as u32 + 1;
    let row = (cells - norm_z * cells).floor().max(0.0) as u32;
    format!("{}{}", column_letters(column), row)
}

fn column_letters(mut column: u32) -> String {
    let mut letters = Vec::new();
    while column > 0 {
        let rem = (column - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        column = (column - 1) / 26;
    }
    letters.iter().rev().collect()
}
