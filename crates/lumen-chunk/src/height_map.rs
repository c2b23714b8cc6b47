//! Per-column height of the highest light-blocking block.

/// 256 column heights indexed by `(x << 4) | z`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeightMap {
    heights: [i16; 256],
}

impl HeightMap {
    /// Creates a height map with every column at `y`.
    pub fn new(y: i16) -> Self {
        Self { heights: [y; 256] }
    }

    /// Height of column `(x, z)`. Coordinates are masked into `[0, 16)`.
    pub fn at(&self, x: u8, z: u8) -> i16 {
        self.heights[column(x, z)]
    }

    /// Sets the height of column `(x, z)`.
    pub fn set(&mut self, x: u8, z: u8, y: i16) {
        self.heights[column(x, z)] = y;
    }

    /// The highest of the horizontal neighbours of `(x, z)` that lie inside
    /// this chunk. Neighbours across the chunk border are not considered.
    pub fn highest_neighbour(&self, x: u8, z: u8) -> i16 {
        let (x, z) = (x & 15, z & 15);
        let mut highest = i16::MIN;
        if x > 0 {
            highest = highest.max(self.at(x - 1, z));
        }
        if x < 15 {
            highest = highest.max(self.at(x + 1, z));
        }
        if z > 0 {
            highest = highest.max(self.at(x, z - 1));
        }
        if z < 15 {
            highest = highest.max(self.at(x, z + 1));
        }
        highest
    }

    /// The heights in column order.
    pub fn values(&self) -> &[i16; 256] {
        &self.heights
    }
}

fn column(x: u8, z: u8) -> usize {
    (usize::from(x & 15) << 4) | usize::from(z & 15)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_read_back() {
        let mut map = HeightMap::new(-64);
        map.set(3, 9, 70);
        assert_eq!(map.at(3, 9), 70);
        assert_eq!(map.at(9, 3), -64);
        assert_eq!(map.values()[(3 << 4) | 9], 70);
    }

    #[test]
    fn test_highest_neighbour_ignores_out_of_chunk() {
        let mut map = HeightMap::new(0);
        map.set(1, 0, 5);
        map.set(0, 1, 9);
        assert_eq!(map.highest_neighbour(0, 0), 9);
        map.set(14, 15, 12);
        assert_eq!(map.highest_neighbour(15, 15), 12);
    }
}
