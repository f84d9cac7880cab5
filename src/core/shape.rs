use serde::{Deserialize, Serialize};
use std::fmt;

/// An `M x N x K` triple: instruction shapes, threadblock tiles and warp counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GemmShape {
    pub m: u32,
    pub n: u32,
    pub k: u32,
}

impl GemmShape {
    pub const fn new(m: u32, n: u32, k: u32) -> Self {
        Self { m, n, k }
    }

    pub fn product(&self) -> u64 {
        self.m as u64 * self.n as u64 * self.k as u64
    }

    pub fn is_positive(&self) -> bool {
        self.m > 0 && self.n > 0 && self.k > 0
    }

    /// Component-wise division, `None` if any divisor is zero.
    pub fn checked_div(&self, rhs: GemmShape) -> Option<GemmShape> {
        Some(GemmShape {
            m: self.m.checked_div(rhs.m)?,
            n: self.n.checked_div(rhs.n)?,
            k: self.k.checked_div(rhs.k)?,
        })
    }

    /// True when every component of `self` is a whole multiple of `rhs`.
    pub fn is_divisible_by(&self, rhs: GemmShape) -> bool {
        rhs.is_positive() && self.m % rhs.m == 0 && self.n % rhs.n == 0 && self.k % rhs.k == 0
    }
}

impl From<[u32; 3]> for GemmShape {
    fn from(v: [u32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl fmt::Display for GemmShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.m, self.n, self.k)
    }
}

/// Grid or block index in launch space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Dim3 {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl Dim3 {
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    pub fn volume(&self) -> u64 {
        self.x as u64 * self.y as u64 * self.z as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_divisibility() {
        let tb = GemmShape::new(128, 128, 32);
        assert!(tb.is_divisible_by(GemmShape::new(2, 2, 1)));
        assert!(!tb.is_divisible_by(GemmShape::new(3, 2, 1)));
        assert!(!tb.is_divisible_by(GemmShape::new(0, 2, 1)));
        assert_eq!(tb.checked_div(GemmShape::new(2, 2, 1)), Some(GemmShape::new(64, 64, 32)));
        assert_eq!(tb.checked_div(GemmShape::new(2, 0, 1)), None);
    }

    #[test]
    fn test_from_array_and_display() {
        let s: GemmShape = [16, 8, 8].into();
        assert_eq!(s, GemmShape::new(16, 8, 8));
        assert_eq!(s.to_string(), "16x8x8");
        assert_eq!(s.product(), 1024);
    }
}
