//! Offset arithmetic for triangular packing.
//! 
//! The upper triangle is packed column by column: column `j` occupies
//! the range `j(j+1)/2 .. (j+1)(j+2)/2` and holds rows `0..=j`.
//! The lower triangle is packed row by row, which is the upper packing
//! of the transpose, so `index_of_lower(j, i) == index_of_upper(i, j)`.
//! 
//! The non-normalizing functions are called from per-element loops.
//! Debug builds assert the ordering contract; release builds do not
//! check it, and a pair on the wrong side of the diagonal yields an
//! unrelated offset.

/// Number of cells needed to pack one triangle (diagonal included) of an `n × n` matrix.
#[inline]
pub fn packed_len(n: usize) -> usize { 
    n * (n + 1) / 2
}

/// Offset of `(row, column)` with `row <= column`.
#[inline]
pub fn index_of_upper(row: usize, column: usize) -> usize { 
    debug_assert!(row <= column, "({row}, {column}) is not in the upper triangle");
    row + column * (column + 1) / 2
}

/// Offset of `(row, column)` with `row >= column`.
#[inline]
pub fn index_of_lower(row: usize, column: usize) -> usize { 
    debug_assert!(row >= column, "({row}, {column}) is not in the lower triangle");
    column + row * (row + 1) / 2
}

#[inline]
pub fn index_of_diagonal(i: usize) -> usize { 
    i * (i + 3) / 2
}

/// Offset of `(row, column)` in upper packing, for any pair.
#[inline]
pub fn index_of(row: usize, column: usize) -> usize { 
    let (r, c) = if row <= column { 
        (row, column)
    } else { 
        (column, row)
    };
    index_of_upper(r, c)
}
