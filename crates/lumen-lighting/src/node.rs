//! Positions and queue entries of the light flood fill.

pub use lumen_chunk::LightType;

/// A voxel position inside a [`LightArea`](crate::LightArea).
///
/// `x` and `z` are local to the area (0 at the corner of its first chunk);
/// `y` is the absolute world Y.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VoxelPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl VoxelPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn offset(self, (dx, dy, dz): (i32, i32, i32)) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
        }
    }
}

/// The six axis-aligned neighbour offsets.
pub(crate) const NEIGHBORS_6: [(i32, i32, i32); 6] = [
    (1, 0, 0),
    (-1, 0, 0),
    (0, 1, 0),
    (0, -1, 0),
    (0, 0, 1),
    (0, 0, -1),
];

/// A pending light update: `pos` should hold at least `level` of `kind`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LightNode {
    pub pos: VoxelPos,
    pub kind: LightType,
    pub level: u8,
}

impl LightNode {
    pub fn new(pos: VoxelPos, kind: LightType, level: u8) -> Self {
        Self { pos, kind, level }
    }
}
