use std::fmt::Display;
use cartesian::cartesian;
use log::trace;
use rand::Rng;
use rand::distributions::Distribution;
use tripack::Real;
use crate::base::*;
use crate::dense::Mat;
use crate::error::{MatError, violation, invalid, check_len, check_shape};
use crate::index::*;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TriangularType { 
    Upper, Lower
}

impl TriangularType { 
    pub fn is_upper(&self) -> bool { 
        match self { 
            Self::Upper => true,
            Self::Lower => false
        }
    }

    pub fn transpose(&self) -> Self { 
        match self { 
            Self::Upper => Self::Lower,
            Self::Lower => Self::Upper
        }
    }

    pub fn layout(&self) -> Layout { 
        match self { 
            Self::Upper => Layout::Upper,
            Self::Lower => Layout::Lower
        }
    }

    pub fn from_layout(l: Layout) -> Option<Self> { 
        match l { 
            Layout::Upper => Some(Self::Upper),
            Layout::Lower => Some(Self::Lower),
            _ => None
        }
    }

    /// Whether `(i, j)` lies in the triangle (diagonal included).
    #[inline]
    pub fn contains(&self, i: usize, j: usize) -> bool { 
        if self.is_upper() { i <= j } else { i >= j }
    }

    #[inline]
    fn index(&self, i: usize, j: usize) -> usize { 
        if self.is_upper() { 
            index_of_upper(i, j)
        } else { 
            index_of_lower(i, j)
        }
    }
}

/// Triangular matrix storing only its triangle.
/// 
/// Entries on the other side of the diagonal read as zero and cannot be
/// written. The unchecked `at_upper` / `at_lower` / `set_at_*` accessors
/// assert their ordering contract in debug builds only.
#[derive(Clone, Debug, PartialEq)]
pub struct TriMat<R> 
where R: Real { 
    t: TriangularType,
    n: usize,
    data: Vec<R>
}

impl<R> MatTrait for TriMat<R>
where R: Real { 
    fn shape(&self) -> (usize, usize) {
        (self.n, self.n)
    }
}

impl<R> TriMat<R>
where R: Real { 
    pub fn new(t: TriangularType, n: usize) -> Self { 
        Self::from_value(t, n, R::zero())
    }

    /// Fills the triangle with `value`.
    pub fn from_value(t: TriangularType, n: usize, value: R) -> Self { 
        let data = vec![value; packed_len(n)];
        Self { t, n, data }
    }

    /// Takes ownership of a packed triangle of length `n(n+1)/2`.
    pub fn from_packed(t: TriangularType, n: usize, data: Vec<R>) -> Result<Self, MatError> { 
        check_len(packed_len(n), data.len())?;
        Ok(Self { t, n, data })
    }

    /// Copies a square array given by rows. Entries outside the triangle must be zero.
    pub fn from_rows<J>(t: TriangularType, rows: &[J]) -> Result<Self, MatError>
    where J: AsRef<[R]> { 
        let n = rows.len();

        if let Some((i, r)) = rows.iter().enumerate().find(|(_, r)| r.as_ref().len() != n) { 
            return invalid!("row {i} has length {}, expected {n}", r.as_ref().len())
        }

        let a = |i: usize, j: usize| rows[i].as_ref()[j];
        Self::collect(t, n, a)
    }

    /// Copies any storage whose entries outside the triangle are zero.
    pub fn from_storage(t: TriangularType, a: &dyn MatStorage<R>) -> Result<Self, MatError> { 
        if let Some(data) = a.packed_view(t.layout()) { 
            trace!("{:?} from {}: packed copy", t, a.layout());
            return Self::from_packed(t, a.order(), data.to_vec())
        }

        trace!("{:?} from {}: checked copy", t, a.layout());

        let n = a.nrows();
        check_shape((n, n), a.shape())?;
        Self::collect(t, n, |i, j| a.at(i, j))
    }

    fn collect<F>(t: TriangularType, n: usize, a: F) -> Result<Self, MatError>
    where F: Fn(usize, usize) -> R { 
        if let Some((i, j)) = cartesian!(0..n, 0..n).find(|&(i, j)| !t.contains(i, j) && !a(i, j).is_zero()) { 
            return violation!("nonzero entry {} at ({i}, {j}) outside the {:?} triangle", a(i, j), t)
        }

        // packed order: upper by columns, lower by rows.
        let data = (0..n).flat_map(|p| 
            (0..=p).map(move |q| if t.is_upper() { (q, p) } else { (p, q) })
        ).map(|(i, j)| a(i, j)).collect();

        Ok(Self { t, n, data })
    }

    pub fn identity(t: TriangularType, n: usize) -> Self { 
        let mut a = Self::new(t, n);
        for i in 0..n { 
            a.data[index_of_diagonal(i)] = R::one();
        }
        a
    }

    /// One sample per stored cell.
    pub fn random<D, G>(t: TriangularType, n: usize, dist: &D, rng: &mut G) -> Self
    where D: Distribution<R>, G: Rng + ?Sized { 
        let data = (0..packed_len(n)).map(|_| dist.sample(rng)).collect();
        Self { t, n, data }
    }

    pub fn randomize<D, G>(&mut self, dist: &D, rng: &mut G)
    where D: Distribution<R>, G: Rng + ?Sized { 
        for x in self.data.iter_mut() { 
            *x = dist.sample(rng);
        }
    }

    pub fn triangular_type(&self) -> TriangularType { 
        self.t
    }

    /// Requires `i <= j`.
    #[inline]
    pub fn at_upper(&self, i: usize, j: usize) -> R { 
        debug_assert!(i <= j);
        if self.t.is_upper() { 
            self.data[index_of_upper(i, j)]
        } else if i == j { 
            self.data[index_of_diagonal(i)]
        } else { 
            R::zero()
        }
    }

    /// Requires `i >= j`.
    #[inline]
    pub fn at_lower(&self, i: usize, j: usize) -> R { 
        debug_assert!(i >= j);
        if !self.t.is_upper() { 
            self.data[index_of_lower(i, j)]
        } else if i == j { 
            self.data[index_of_diagonal(i)]
        } else { 
            R::zero()
        }
    }

    /// Requires an upper matrix and `i <= j`.
    #[inline]
    pub fn set_at_upper(&mut self, i: usize, j: usize, value: R) { 
        debug_assert!(self.t.is_upper() || i == j);
        self.data[index_of_upper(i, j)] = value
    }

    /// Requires a lower matrix and `i >= j`.
    #[inline]
    pub fn set_at_lower(&mut self, i: usize, j: usize, value: R) { 
        debug_assert!(!self.t.is_upper() || i == j);
        self.data[index_of_lower(i, j)] = value
    }

    #[inline]
    pub fn set_at_diagonal(&mut self, i: usize, value: R) { 
        self.data[index_of_diagonal(i)] = value
    }

    pub fn diagonal(&self) -> Vec<R> { 
        (0..self.n).map(|i| self.data[index_of_diagonal(i)]).collect()
    }

    pub fn set_diagonal(&mut self, diag: &[R]) -> Result<(), MatError> { 
        check_len(self.n, diag.len())?;
        for (i, &d) in diag.iter().enumerate() { 
            self.set_at_diagonal(i, d);
        }
        Ok(())
    }

    pub fn fill(&mut self, value: R) { 
        self.data.fill(value)
    }

    pub fn clear(&mut self) { 
        self.fill(R::zero())
    }

    /// Stored cells `(i, j, a_ij)` in packed order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &R)> { 
        let t = self.t;
        (0..self.n).flat_map(move |p| 
            (0..=p).map(move |q| if t.is_upper() { (q, p) } else { (p, q) })
        ).zip(self.data.iter()).map(|((i, j), a)| 
            (i, j, a)
        )
    }

    pub fn as_packed(&self) -> &[R] { 
        &self.data
    }

    pub fn into_packed(self) -> Vec<R> { 
        self.data
    }

    /// The upper packing of `A` is the lower packing of `Aᵀ`, so the buffer is reused as is.
    pub fn into_transpose(self) -> Self { 
        let Self { t, n, data } = self;
        Self { t: t.transpose(), n, data }
    }

    pub fn transpose(&self) -> Self { 
        self.clone().into_transpose()
    }

    pub fn conjugate_transpose(&self) -> Self { 
        self.transpose()
    }
}

impl<R> MatStorage<R> for TriMat<R>
where R: Real { 
    fn at(&self, i: usize, j: usize) -> R {
        assert!(i < self.n && j < self.n, "({i}, {j}) out of bounds for order {}", self.n);
        if self.t.contains(i, j) { 
            self.data[self.t.index(i, j)]
        } else { 
            R::zero()
        }
    }

    fn set_at(&mut self, i: usize, j: usize, value: R) -> Result<(), MatError> {
        assert!(i < self.n && j < self.n, "({i}, {j}) out of bounds for order {}", self.n);
        if !self.t.contains(i, j) { 
            return violation!("({i}, {j}) is outside the {:?} triangle", self.t)
        }
        self.data[self.t.index(i, j)] = value;
        Ok(())
    }

    fn layout(&self) -> Layout {
        self.t.layout()
    }

    fn order(&self) -> usize {
        self.n
    }

    fn at_diagonal(&self, i: usize) -> R {
        self.data[index_of_diagonal(i)]
    }

    /// Holds only when every stored off-diagonal entry is zero.
    fn is_symmetric(&self) -> bool {
        self.iter().all(|(i, j, a)| i == j || a.is_zero())
    }

    fn packed(&self) -> Option<&[R]> {
        Some(&self.data)
    }

    fn packed_mut(&mut self) -> Option<&mut [R]> {
        Some(&mut self.data)
    }

    fn to_dense(&self) -> Mat<R> {
        let mut a = Mat::zero(self.shape());
        for (i, j, &x) in self.iter() { 
            a[(i, j)] = x;
        }
        a
    }

    fn check_assign(&self, src: &Mat<R>) -> Result<(), MatError> {
        check_shape(self.shape(), src.shape())?;
        if let Some((i, j, a)) = src.iter().find(|(i, j, a)| !self.t.contains(*i, *j) && !a.is_zero()) { 
            return violation!("nonzero entry {a} at ({i}, {j}) outside the {:?} triangle", self.t)
        }
        Ok(())
    }

    fn assign(&mut self, src: &Mat<R>) -> Result<(), MatError> {
        self.check_assign(src)?;

        let t = self.t;
        for (i, j, &a) in src.iter() { 
            if t.contains(i, j) { 
                self.data[t.index(i, j)] = a;
            }
        }
        Ok(())
    }
}

impl<R> Default for TriMat<R>
where R: Real { 
    fn default() -> Self {
        Self::new(TriangularType::Upper, 0)
    }
}

impl<R> Display for TriMat<R>
where R: Real { 
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.to_dense(), f)
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct TriMatRepr<R> { 
    kind: TriangularType,
    order: usize,
    data: Vec<R>
}

#[cfg(feature = "serde")]
impl<R> serde::Serialize for TriMat<R>
where R: Real + serde::Serialize {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where S: serde::Serializer {
        let repr = TriMatRepr { kind: self.t, order: self.n, data: self.data.clone() };
        repr.serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de, R> serde::Deserialize<'de> for TriMat<R>
where R: Real + serde::Deserialize<'de> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where D: serde::Deserializer<'de> {
        let repr = TriMatRepr::deserialize(deserializer)?;
        Self::from_packed(repr.kind, repr.order, repr.data).map_err(serde::de::Error::custom)
    }
}
