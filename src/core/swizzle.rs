//! Threadblock swizzling: which output tile each launched block computes.
//!
//! Identity swizzles interleave `2^log_tile` consecutive N-tiles along the
//! grid's X axis so neighbouring blocks share B tiles in L2. The horizontal
//! swizzle walks N first.

use serde::{Deserialize, Serialize};
use crate::core::shape::{Dim3, GemmShape};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwizzlingFunctor {
    Identity1,
    Identity2,
    Identity4,
    Identity8,
    Horizontal,
}

impl SwizzlingFunctor {
    pub fn short_name(self) -> &'static str {
        match self {
            Self::Identity1 => "identity1",
            Self::Identity2 => "identity2",
            Self::Identity4 => "identity4",
            Self::Identity8 => "identity8",
            Self::Horizontal => "horizontal",
        }
    }

    fn identity_width(self) -> u32 {
        match self {
            Self::Identity1 | Self::Horizontal => 1,
            Self::Identity2 => 2,
            Self::Identity4 => 4,
            Self::Identity8 => 8,
        }
    }

    /// Number of tiles along M, N and K (split-k slices or batches).
    pub fn tiled_shape(m: usize, n: usize, threadblock: GemmShape, slices: usize) -> GemmShape {
        let tiles = |extent: usize, tile: u32| -> u32 {
            if tile == 0 { 0 } else { extent.div_ceil(tile as usize) as u32 }
        };
        GemmShape::new(tiles(m, threadblock.m), tiles(n, threadblock.n), slices as u32)
    }

    pub fn log_tile(self, tiled: GemmShape) -> u32 {
        let width = self.identity_width();
        if width >= 8 && tiled.n >= 6 {
            3
        } else if width >= 4 && tiled.n >= 3 {
            2
        } else if width >= 2 && tiled.n >= 2 {
            1
        } else {
            0
        }
    }

    pub fn grid_shape(self, tiled: GemmShape) -> Dim3 {
        match self {
            Self::Horizontal => Dim3::new(tiled.n, tiled.m, tiled.k),
            _ => {
                let tile = 1u32 << self.log_tile(tiled);
                Dim3::new(tiled.m * tile, tiled.n.div_ceil(tile), tiled.k)
            }
        }
    }

    /// Tile coordinate of `block`; may fall outside `tiled`, in which case
    /// the block has nothing to do.
    pub fn tile_offset(self, tiled: GemmShape, block: Dim3) -> GemmShape {
        match self {
            Self::Horizontal => GemmShape::new(block.y, block.x, block.z),
            _ => {
                let log_tile = self.log_tile(tiled);
                GemmShape::new(
                    block.x >> log_tile,
                    (block.y << log_tile) + (block.x & ((1 << log_tile) - 1)),
                    block.z,
                )
            }
        }
    }

    /// In-range tile offsets in block launch order.
    pub fn tiles(self, tiled: GemmShape) -> Vec<GemmShape> {
        let grid = self.grid_shape(tiled);
        let mut tiles = Vec::with_capacity(grid.volume() as usize);
        for z in 0..grid.z {
            for y in 0..grid.y {
                for x in 0..grid.x {
                    let t = self.tile_offset(tiled, Dim3::new(x, y, z));
                    if t.m < tiled.m && t.n < tiled.n {
                        tiles.push(t);
                    }
                }
            }
        }
        tiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_identity8_grid() {
        let tiled = GemmShape::new(4, 6, 1);
        let swizzle = SwizzlingFunctor::Identity8;
        assert_eq!(swizzle.log_tile(tiled), 3);
        assert_eq!(swizzle.grid_shape(tiled), Dim3::new(32, 1, 1));
        assert_eq!(swizzle.tile_offset(tiled, Dim3::new(9, 0, 0)), GemmShape::new(1, 1, 0));
    }

    #[test]
    fn test_tiled_shape() {
        let tb = GemmShape::new(128, 128, 32);
        assert_eq!(SwizzlingFunctor::tiled_shape(500, 504, tb, 3), GemmShape::new(4, 4, 3));
        assert_eq!(SwizzlingFunctor::tiled_shape(4, 4, tb, 1), GemmShape::new(1, 1, 1));
    }

    proptest! {
        #[test]
        fn every_tile_visited_once(
            m in 1u32..24,
            n in 1u32..24,
            k in 1u32..4,
            which in 0usize..5,
        ) {
            let swizzle = [
                SwizzlingFunctor::Identity1,
                SwizzlingFunctor::Identity2,
                SwizzlingFunctor::Identity4,
                SwizzlingFunctor::Identity8,
                SwizzlingFunctor::Horizontal,
            ][which];
            let tiled = GemmShape::new(m, n, k);
            let tiles = swizzle.tiles(tiled);
            let unique: HashSet<_> = tiles.iter().copied().collect();
            prop_assert_eq!(tiles.len(), (m * n * k) as usize);
            prop_assert_eq!(unique.len(), tiles.len());
        }
    }
}
