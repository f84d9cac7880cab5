use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layout {
    RowMajor,
    ColumnMajor,
}

impl Layout {
    /// `t` for row-major, `n` for column-major, as in kernel names (`tn`, `nn`).
    pub fn short_name(self) -> char {
        match self {
            Self::RowMajor => 't',
            Self::ColumnMajor => 'n',
        }
    }

    /// Densely packed leading dimension of a `rows x cols` matrix.
    pub fn leading_dim(self, rows: usize, cols: usize) -> usize {
        match self {
            Self::RowMajor => cols,
            Self::ColumnMajor => rows,
        }
    }

    #[inline]
    pub fn offset(self, row: usize, col: usize, ld: usize) -> usize {
        match self {
            Self::RowMajor => row * ld + col,
            Self::ColumnMajor => col * ld + row,
        }
    }
}
