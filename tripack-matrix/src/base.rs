use std::borrow::Cow;
use derive_more::Display;
use tripack::Real;
use crate::dense::Mat;
use crate::error::MatError;

pub trait MatTrait {
    fn shape(&self) -> (usize, usize);
    fn nrows(&self) -> usize { self.shape().0 }
    fn ncols(&self) -> usize { self.shape().1 }
    fn is_square(&self) -> bool { 
        let (m, n) = self.shape();
        m == n
    }
}

/// Physical arrangement of the entries of a storage.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Display)]
pub enum Layout { 
    Dense, 
    Symmetric, 
    Upper, 
    Lower
}

impl Layout { 
    pub fn is_packed(&self) -> bool { 
        !matches!(self, Self::Dense)
    }
}

/// Logical `(row, column) -> value` access shared by all storages.
/// 
/// Arithmetic is routed through `packed_view`: a storage that keeps its
/// entries packed in some layout exposes the raw buffer for exactly that
/// layout, and every other storage is reached through `at`.
pub trait MatStorage<R>: MatTrait
where R: Real {
    fn at(&self, i: usize, j: usize) -> R;

    /// Fails without modifying `self` if the write would break the
    /// structure of the storage.
    fn set_at(&mut self, i: usize, j: usize, value: R) -> Result<(), MatError>;

    fn layout(&self) -> Layout;

    fn order(&self) -> usize { 
        self.nrows()
    }

    fn at_diagonal(&self, i: usize) -> R { 
        self.at(i, i)
    }

    fn is_symmetric(&self) -> bool { 
        let n = self.nrows();
        self.is_square() && (0..n).all(|j| 
            (0..j).all(|i| 
                self.at(i, j).same_as(&self.at(j, i))
            )
        )
    }

    fn packed(&self) -> Option<&[R]> { 
        None
    }

    fn packed_mut(&mut self) -> Option<&mut [R]> { 
        None
    }

    fn packed_view(&self, layout: Layout) -> Option<&[R]> { 
        if layout.is_packed() && self.layout() == layout { 
            self.packed()
        } else { 
            None
        }
    }

    fn packed_view_mut(&mut self, layout: Layout) -> Option<&mut [R]> { 
        if layout.is_packed() && self.layout() == layout { 
            self.packed_mut()
        } else { 
            None
        }
    }

    fn dense_view(&self) -> Option<&Mat<R>> { 
        None
    }

    fn to_dense(&self) -> Mat<R> { 
        Mat::from_fn(self.shape(), |i, j| self.at(i, j))
    }

    /// Dense form of `self`, borrowed when `self` already is dense.
    fn densify(&self) -> Cow<'_, Mat<R>> { 
        match self.dense_view() { 
            Some(a) => Cow::Borrowed(a),
            None    => Cow::Owned(self.to_dense())
        }
    }

    /// Checks that every entry of `src` can be stored in `self`.
    fn check_assign(&self, src: &Mat<R>) -> Result<(), MatError>;

    /// Overwrites `self` with `src`. Nothing is written unless
    /// `check_assign` succeeds.
    fn assign(&mut self, src: &Mat<R>) -> Result<(), MatError>;
}

#[cfg(test)]
mod tests { 
    use super::*;

    #[test]
    fn packed_layouts() { 
        assert!(!Layout::Dense.is_packed());
        assert!(Layout::Symmetric.is_packed());
        assert!(Layout::Upper.is_packed());
        assert!(Layout::Lower.is_packed());
    }

    #[test]
    fn display() { 
        assert_eq!(Layout::Symmetric.to_string(), "Symmetric");
        assert_eq!(Layout::Lower.to_string(), "Lower");
    }
}
