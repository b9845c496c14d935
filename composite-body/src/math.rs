// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Planar math value types
//!
//! Bodies live in a 2D world: component layouts, fixture polygons and body
//! poses are all expressed with the double-precision types in this module.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// 2D vector with double-precision components
///
/// # Examples
///
/// ```
/// use composite_body::math::Vec2;
///
/// let v = Vec2::new(3.0, 4.0);
/// assert_eq!(v.length(), 5.0);
/// assert!(v.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// X component
    pub x: f64,
    /// Y component
    pub y: f64,
}

impl Vec2 {
    /// Create a new vector
    pub const fn new(x: f64, y: f64) -> Self {
        Vec2 { x, y }
    }

    /// The zero vector
    pub const fn zero() -> Self {
        Vec2::new(0.0, 0.0)
    }

    /// Dot product
    pub fn dot(self, other: Vec2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// 2D cross product (z component of the 3D cross product)
    pub fn cross(self, other: Vec2) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Cross product of a scalar angular quantity with this vector (`w x r`)
    pub fn perp_scaled(self, w: f64) -> Vec2 {
        Vec2::new(-w * self.y, w * self.x)
    }

    /// Euclidean length
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Squared length
    pub fn length_squared(self) -> f64 {
        self.dot(self)
    }

    /// Distance to another point
    pub fn distance(self, other: Vec2) -> f64 {
        (self - other).length()
    }

    /// Check if both components are finite (not NaN or infinite)
    pub fn is_valid(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Get the vector as an array
    pub fn as_array(self) -> [f64; 2] {
        [self.x, self.y]
    }

    /// Create a vector from an array
    pub fn from_array(arr: [f64; 2]) -> Self {
        Vec2::new(arr[0], arr[1])
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Vec2) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;

    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// Planar rotation stored as an angle in radians
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotation {
    radians: f64,
}

impl Rotation {
    /// Rotation by the given angle in radians
    pub fn from_radians(radians: f64) -> Self {
        Rotation { radians }
    }

    /// Rotation by a whole number of quarter turns
    pub fn from_quarter_turns(turns: i32) -> Self {
        Rotation::from_radians(f64::from(turns) * std::f64::consts::FRAC_PI_2)
    }

    /// The identity rotation
    pub fn identity() -> Self {
        Rotation { radians: 0.0 }
    }

    /// Angle in radians
    pub fn radians(&self) -> f64 {
        self.radians
    }

    /// Rotate a vector about the origin
    pub fn apply(&self, v: Vec2) -> Vec2 {
        let (sin, cos) = self.radians.sin_cos();
        Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
    }

    /// Rotate a vector by the inverse of this rotation
    pub fn apply_inverse(&self, v: Vec2) -> Vec2 {
        self.inverse().apply(v)
    }

    /// The opposite rotation
    pub fn inverse(&self) -> Rotation {
        Rotation::from_radians(-self.radians)
    }

    /// Rotation equivalent to applying `self` and then `other`
    pub fn then(&self, other: Rotation) -> Rotation {
        Rotation::from_radians(self.radians + other.radians)
    }
}

/// Rigid 2D pose: rotation followed by translation
///
/// Maps a point `p` to `rotation * p + translation`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform2 {
    /// Translation applied after rotation
    pub translation: Vec2,
    /// Rotation about the local origin
    pub rotation: Rotation,
}

impl Transform2 {
    /// Create a transform from its parts
    pub fn new(translation: Vec2, rotation: Rotation) -> Self {
        Transform2 { translation, rotation }
    }

    /// The identity transform
    pub fn identity() -> Self {
        Transform2::default()
    }

    /// Map a local point into the parent frame
    pub fn apply(&self, point: Vec2) -> Vec2 {
        self.rotation.apply(point) + self.translation
    }

    /// Map a parent-frame point back into the local frame
    pub fn apply_inverse(&self, point: Vec2) -> Vec2 {
        self.rotation.apply_inverse(point - self.translation)
    }

    /// Compose: the result maps a point through `inner` and then `self`
    pub fn compose(&self, inner: &Transform2) -> Transform2 {
        Transform2 {
            translation: self.apply(inner.translation),
            rotation: inner.rotation.then(self.rotation),
        }
    }

    /// Check if the transform contains only finite values
    pub fn is_valid(&self) -> bool {
        self.translation.is_valid() && self.rotation.radians().is_finite()
    }
}
