// Copyright 2025 eraflo
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

//! View frustum extraction and box visibility testing.
//!
//! Planes are extracted from a view-projection matrix with the Gribb/Hartmann
//! method, for clip spaces whose depth range is `[0, 1]`.

use super::{Aabb, Mat4, Vec4, EPSILON};

/// Identifies one of the six planes of a [`Frustum`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Plane {
    /// The near clipping plane.
    Near = 0,
    /// The far clipping plane.
    Far = 1,
    /// The left side plane.
    Left = 2,
    /// The right side plane.
    Right = 3,
    /// The top side plane.
    Top = 4,
    /// The bottom side plane.
    Bottom = 5,
}

impl Plane {
    /// All planes, in storage order.
    pub const ALL: [Plane; 6] = [
        Plane::Near,
        Plane::Far,
        Plane::Left,
        Plane::Right,
        Plane::Top,
        Plane::Bottom,
    ];
}

/// A set of frustum planes to test against.
///
/// An empty mask disables culling altogether, which is what 2D and UI passes use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrustumPlanes {
    bits: u8,
}

impl FrustumPlanes {
    /// No planes: every box is visible.
    pub const NONE: Self = Self { bits: 0 };
    /// The near plane.
    pub const NEAR: Self = Self::from_plane(Plane::Near);
    /// The far plane.
    pub const FAR: Self = Self::from_plane(Plane::Far);
    /// The left plane.
    pub const LEFT: Self = Self::from_plane(Plane::Left);
    /// The right plane.
    pub const RIGHT: Self = Self::from_plane(Plane::Right);
    /// The top plane.
    pub const TOP: Self = Self::from_plane(Plane::Top);
    /// The bottom plane.
    pub const BOTTOM: Self = Self::from_plane(Plane::Bottom);
    /// The four side planes, used by shadow passes whose casters may sit
    /// in front of the near plane or past the far plane.
    pub const SIDES: Self = Self {
        bits: Self::LEFT.bits | Self::RIGHT.bits | Self::TOP.bits | Self::BOTTOM.bits,
    };
    /// All six planes.
    pub const ALL: Self = Self { bits: 0b11_1111 };

    /// Creates a mask from raw bits. Bits above the sixth are ignored.
    pub const fn from_bits(bits: u8) -> Self {
        Self {
            bits: bits & Self::ALL.bits,
        }
    }

    /// Creates a mask containing a single plane.
    pub const fn from_plane(plane: Plane) -> Self {
        Self {
            bits: 1 << plane as u8,
        }
    }

    /// Returns the raw bits.
    pub const fn bits(&self) -> u8 {
        self.bits
    }

    /// Combines two masks.
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// Checks if the mask contains a specific plane.
    pub const fn contains(&self, plane: Plane) -> bool {
        self.bits & (1 << plane as u8) != 0
    }

    /// Checks if the mask is empty (culling disabled).
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }
}

impl Default for FrustumPlanes {
    fn default() -> Self {
        Self::ALL
    }
}

impl std::ops::BitOr for FrustumPlanes {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for FrustumPlanes {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

/// The six planes bounding a camera's visible volume.
///
/// Each plane is stored as `(a, b, c, d)` with its normal pointing inwards, so
/// that a point is on the visible side when `a*x + b*y + c*z + d >= 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    planes: [Vec4; 6],
}

impl Frustum {
    /// Extracts the frustum planes from a column-major view-projection matrix.
    pub fn from_view_projection(view_projection: &Mat4) -> Self {
        let r0 = view_projection.get_row(0);
        let r1 = view_projection.get_row(1);
        let r2 = view_projection.get_row(2);
        let r3 = view_projection.get_row(3);

        let planes = [
            r2,      // Near (z >= 0)
            r3 - r2, // Far (z <= w)
            r3 + r0, // Left
            r3 - r0, // Right
            r3 - r1, // Top
            r3 + r1, // Bottom
        ];

        Self {
            planes: planes.map(normalize_plane),
        }
    }

    /// Returns the equation of one plane.
    #[inline]
    pub fn plane(&self, plane: Plane) -> Vec4 {
        self.planes[plane as usize]
    }

    /// Returns all six planes, in [`Plane::ALL`] order.
    #[inline]
    pub fn planes(&self) -> &[Vec4; 6] {
        &self.planes
    }

    /// Tests a box against the planes selected by `mask`.
    ///
    /// The box is rejected only if it lies entirely on the outer side of one of
    /// the active planes. Invalid boxes (`min > max` on some axis) and empty
    /// masks always pass.
    pub fn is_visible(&self, aabb: &Aabb, mask: FrustumPlanes) -> bool {
        if mask.is_empty() || !aabb.is_valid() {
            return true;
        }

        Plane::ALL
            .iter()
            .filter(|plane| mask.contains(**plane))
            .all(|plane| {
                let p = self.planes[*plane as usize];
                // Corner furthest along the plane normal.
                let x = if p.x >= 0.0 { aabb.max.x } else { aabb.min.x };
                let y = if p.y >= 0.0 { aabb.max.y } else { aabb.min.y };
                let z = if p.z >= 0.0 { aabb.max.z } else { aabb.min.z };
                p.x * x + p.y * y + p.z * z + p.w >= 0.0
            })
    }
}

fn normalize_plane(plane: Vec4) -> Vec4 {
    let len = plane.truncate().length();
    if len > EPSILON {
        plane / len
    } else {
        plane
    }
}
