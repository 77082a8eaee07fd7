use std::fmt::Display;
use log::trace;
use rand::Rng;
use rand::distributions::Distribution;
use tripack::Real;
use crate::base::*;
use crate::dense::Mat;
use crate::error::{MatError, violation, invalid, check_len, check_shape};
use crate::index::*;

/// Symmetric matrix storing its upper triangle, column by column.
/// 
/// Reads and writes through `at` / `set_at` are normalized to the upper
/// triangle, so `(i, j)` and `(j, i)` always name the same cell.
#[derive(Clone, Debug, PartialEq)]
pub struct SymMat<R> 
where R: Real { 
    n: usize,
    data: Vec<R>
}

impl<R> MatTrait for SymMat<R>
where R: Real { 
    fn shape(&self) -> (usize, usize) {
        (self.n, self.n)
    }
}

impl<R> SymMat<R>
where R: Real { 
    pub fn new(n: usize) -> Self { 
        Self::from_value(n, R::zero())
    }

    pub fn from_value(n: usize, value: R) -> Self { 
        let data = vec![value; packed_len(n)];
        Self { n, data }
    }

    /// Takes ownership of a packed upper triangle of length `n(n+1)/2`.
    pub fn from_packed(n: usize, data: Vec<R>) -> Result<Self, MatError> { 
        check_len(packed_len(n), data.len())?;
        Ok(Self { n, data })
    }

    /// Copies a square array given by rows. Every off-diagonal pair must agree.
    pub fn from_rows<J>(rows: &[J]) -> Result<Self, MatError>
    where J: AsRef<[R]> { 
        let n = rows.len();

        if let Some((i, r)) = rows.iter().enumerate().find(|(_, r)| r.as_ref().len() != n) { 
            return invalid!("row {i} has length {}, expected {n}", r.as_ref().len())
        }

        let a = |i: usize, j: usize| rows[i].as_ref()[j];

        for j in 0..n { 
            for i in 0..j { 
                if !a(i, j).same_as(&a(j, i)) { 
                    return violation!("entries ({i}, {j}) and ({j}, {i}) differ: {} != {}", a(i, j), a(j, i))
                }
            }
        }

        let data = (0..n).flat_map(|j| 
            (0..=j).map(move |i| a(i, j))
        ).collect();

        Ok(Self { n, data })
    }

    /// Copies any storage that is symmetric.
    pub fn from_storage(a: &dyn MatStorage<R>) -> Result<Self, MatError> { 
        if let Some(data) = a.packed_view(Layout::Symmetric) { 
            trace!("sym from {}: packed copy", a.layout());
            return Self::from_packed(a.order(), data.to_vec())
        }

        trace!("sym from {}: checked copy", a.layout());

        let n = a.nrows();
        check_shape((n, n), a.shape())?;

        if !a.is_symmetric() { 
            return violation!("source ({}) is not symmetric", a.layout())
        }

        let data = (0..n).flat_map(|j| 
            (0..=j).map(move |i| a.at(i, j))
        ).collect();

        Ok(Self { n, data })
    }

    pub fn identity(n: usize) -> Self { 
        let mut a = Self::new(n);
        for i in 0..n { 
            a.data[index_of_diagonal(i)] = R::one();
        }
        a
    }

    pub fn from_diagonal(diag: &[R]) -> Self { 
        let mut a = Self::new(diag.len());
        for (i, &d) in diag.iter().enumerate() { 
            a.data[index_of_diagonal(i)] = d;
        }
        a
    }

    /// One sample per stored cell.
    pub fn random<D, G>(n: usize, dist: &D, rng: &mut G) -> Self
    where D: Distribution<R>, G: Rng + ?Sized { 
        let data = (0..packed_len(n)).map(|_| dist.sample(rng)).collect();
        Self { n, data }
    }

    pub fn randomize<D, G>(&mut self, dist: &D, rng: &mut G)
    where D: Distribution<R>, G: Rng + ?Sized { 
        for x in self.data.iter_mut() { 
            *x = dist.sample(rng);
        }
    }

    /// Requires `i <= j`.
    #[inline]
    pub fn at_upper(&self, i: usize, j: usize) -> R { 
        self.data[index_of_upper(i, j)]
    }

    /// Requires `i >= j`.
    #[inline]
    pub fn at_lower(&self, i: usize, j: usize) -> R { 
        self.data[index_of_upper(j, i)]
    }

    /// Requires `i <= j`.
    #[inline]
    pub fn set_at_upper(&mut self, i: usize, j: usize, value: R) { 
        self.data[index_of_upper(i, j)] = value
    }

    /// Requires `i >= j`.
    #[inline]
    pub fn set_at_lower(&mut self, i: usize, j: usize, value: R) { 
        self.data[index_of_upper(j, i)] = value
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

    /// Stored cells `(i, j, a_ij)` with `i <= j`, in packed order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &R)> { 
        (0..self.n).flat_map(|j| 
            (0..=j).map(move |i| (i, j))
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

    /// Equal to `self`.
    pub fn transpose(&self) -> Self { 
        self.clone()
    }

    pub fn into_transpose(self) -> Self { 
        self
    }

    pub fn conjugate_transpose(&self) -> Self { 
        self.transpose()
    }
}

impl<R> MatStorage<R> for SymMat<R>
where R: Real { 
    fn at(&self, i: usize, j: usize) -> R {
        assert!(i < self.n && j < self.n, "({i}, {j}) out of bounds for order {}", self.n);
        self.data[index_of(i, j)]
    }

    fn set_at(&mut self, i: usize, j: usize, value: R) -> Result<(), MatError> {
        assert!(i < self.n && j < self.n, "({i}, {j}) out of bounds for order {}", self.n);
        self.data[index_of(i, j)] = value;
        Ok(())
    }

    fn layout(&self) -> Layout {
        Layout::Symmetric
    }

    fn order(&self) -> usize {
        self.n
    }

    fn at_diagonal(&self, i: usize) -> R {
        self.data[index_of_diagonal(i)]
    }

    fn is_symmetric(&self) -> bool {
        true
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
            a[(j, i)] = x;
        }
        a
    }

    fn check_assign(&self, src: &Mat<R>) -> Result<(), MatError> {
        check_shape(self.shape(), src.shape())?;
        if !src.is_symmetric() { 
            return violation!("cannot store a non-symmetric matrix in symmetric storage")
        }
        Ok(())
    }

    fn assign(&mut self, src: &Mat<R>) -> Result<(), MatError> {
        self.check_assign(src)?;

        let n = self.n;
        for j in 0..n { 
            for i in 0..=j { 
                self.set_at_upper(i, j, src[(i, j)]);
            }
        }
        Ok(())
    }
}

impl<R> Default for SymMat<R>
where R: Real { 
    fn default() -> Self {
        Self::new(0)
    }
}

impl<R> Display for SymMat<R>
where R: Real { 
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.to_dense(), f)
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct SymMatRepr<R> { 
    order: usize,
    data: Vec<R>
}

#[cfg(feature = "serde")]
impl<R> serde::Serialize for SymMat<R>
where R: Real + serde::Serialize {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where S: serde::Serializer {
        let repr = SymMatRepr { order: self.n, data: self.data.clone() };
        repr.serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de, R> serde::Deserialize<'de> for SymMat<R>
where R: Real + serde::Deserialize<'de> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where D: serde::Deserializer<'de> {
        let repr = SymMatRepr::deserialize(deserializer)?;
        Self::from_packed(repr.order, repr.data).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests { 
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand::distributions::Uniform;
    use super::*;

    fn sample() -> SymMat<f64> { 
        SymMat::from_rows(&[
            [1., 2., 3.],
            [2., 2., 0.],
            [3., 0., 3.],
        ]).unwrap()
    }

    #[test]
    fn init() { 
        let a = SymMat::<f64>::new(3);
        assert_eq!(a.shape(), (3, 3));
        assert_eq!(a.as_packed(), &[0.; 6]);

        let a = SymMat::from_value(2, 1.5);
        assert_eq!(a.as_packed(), &[1.5; 3]);
    }

    #[test]
    fn from_rows() { 
        let a = sample();
        assert_eq!(a.as_packed(), &[1., 2., 2., 3., 0., 3.]);
        assert_eq!(a.at(0, 2), 3.);
        assert_eq!(a.at(2, 0), 3.);
        assert_eq!(a.at_diagonal(1), 2.);
    }

    #[test]
    fn from_rows_roundtrip() { 
        let rows = [
            [ 4., -1.,  0.5, 2.],
            [-1.,  3.,  7.,  0.],
            [ 0.5, 7., -2.,  1.],
            [ 2.,  0.,  1.,  9.],
        ];
        let a = SymMat::from_rows(&rows).unwrap();
        for i in 0..4 { 
            for j in 0..4 { 
                assert_eq!(a.at(i, j), rows[i][j]);
            }
        }
    }

    #[test]
    fn from_rows_non_symmetric() { 
        let e = SymMat::from_rows(&[
            [1., 2.],
            [2.5, 1.],
        ]);
        assert!(matches!(e, Err(MatError::StructuralViolation(_))));
    }

    #[test]
    fn from_rows_non_square() { 
        let e = SymMat::from_rows(&[
            vec![1., 2.],
            vec![2.],
        ]);
        assert!(matches!(e, Err(MatError::InvalidArgument(_))));
    }

    #[test]
    fn from_packed() { 
        let a = SymMat::from_packed(3, vec![1., 2., 2., 3., 0., 3.]).unwrap();
        assert_eq!(a, sample());

        let e = SymMat::from_packed(3, vec![1., 2., 3.]);
        assert_eq!(e, Err(MatError::LengthMismatch { expected: 6, found: 3 }));
    }

    #[test]
    fn from_storage() { 
        let a = sample();
        let b = SymMat::<f64>::from_storage(&a).unwrap();
        assert_eq!(a, b);

        let d = a.to_dense();
        let b = SymMat::<f64>::from_storage(&d).unwrap();
        assert_eq!(a, b);

        let d = Mat::from_data((2, 2), [1., 2., 3., 4.]);
        let e = SymMat::<f64>::from_storage(&d);
        assert!(matches!(e, Err(MatError::StructuralViolation(_))));

        let d = Mat::<f64>::zero((2, 3));
        let e = SymMat::<f64>::from_storage(&d);
        assert!(matches!(e, Err(MatError::DimensionMismatch { .. })));
    }

    #[test]
    fn mirrored_write() { 
        let mut a = sample();
        a.set_at(2, 1, 5.).unwrap();
        assert_eq!(a.at(1, 2), 5.);
        assert_eq!(a.at(2, 1), 5.);
        assert_eq!(a.at_upper(1, 2), 5.);
        assert_eq!(a.at_lower(2, 1), 5.);
    }

    #[test]
    fn upper_lower_access() { 
        let mut a = sample();
        for j in 0..3 { 
            for i in 0..=j { 
                assert_eq!(a.at(i, j), a.at_upper(i, j));
                assert_eq!(a.at(j, i), a.at_lower(j, i));
            }
        }

        a.set_at_lower(2, 0, -1.);
        assert_eq!(a.at(0, 2), -1.);

        a.set_at_upper(0, 1, -2.);
        assert_eq!(a.at(1, 0), -2.);
    }

    #[test]
    fn identity() { 
        let a = SymMat::<f64>::identity(4);
        for i in 0..4 { 
            for j in 0..4 { 
                assert_eq!(a.at(i, j), if i == j { 1. } else { 0. });
            }
        }
    }

    #[test]
    fn diagonal() { 
        let mut a = SymMat::from_diagonal(&[1., 2., 3.]);
        assert_eq!(a.diagonal(), vec![1., 2., 3.]);
        assert_eq!(a.at(0, 1), 0.);

        a.set_diagonal(&[4., 5., 6.]).unwrap();
        assert_eq!(a.diagonal(), vec![4., 5., 6.]);

        let e = a.set_diagonal(&[1.]);
        assert_eq!(e, Err(MatError::LengthMismatch { expected: 3, found: 1 }));
        assert_eq!(a.diagonal(), vec![4., 5., 6.]);
    }

    #[test]
    fn fill_and_clear() { 
        let mut a = sample();
        a.fill(2.);
        assert!(a.iter().all(|(_, _, &x)| x == 2.));

        a.clear();
        assert!(a.to_dense().is_zero());
    }

    #[test]
    fn to_dense() { 
        let a = sample();
        assert_eq!(a.to_dense(), Mat::from_data((3, 3), [
            1., 2., 3.,
            2., 2., 0.,
            3., 0., 3.,
        ]));
    }

    #[test]
    fn transpose() { 
        let a = sample();
        assert_eq!(a.transpose(), a);
        assert_eq!(a.conjugate_transpose(), a);
    }

    #[test]
    fn random_is_symmetric() { 
        let mut rng = StdRng::seed_from_u64(7);
        let dist = Uniform::new(-1.0, 1.0);
        let a = SymMat::random(6, &dist, &mut rng);

        assert_eq!(a.as_packed().len(), 21);
        assert!(a.to_dense().is_symmetric());
        for i in 0..6 { 
            for j in 0..6 { 
                assert_eq!(a.at(i, j), a.at(j, i));
            }
        }
    }

    struct Counter(std::cell::Cell<usize>);

    impl Distribution<f64> for Counter { 
        fn sample<G: Rng + ?Sized>(&self, _: &mut G) -> f64 { 
            self.0.set(self.0.get() + 1);
            self.0.get() as f64
        }
    }

    #[test]
    fn randomize() { 
        let mut rng = StdRng::seed_from_u64(1);
        let dist = Counter(Default::default());
        let mut a = SymMat::<f64>::identity(4);
        a.randomize(&dist, &mut rng);

        assert_eq!(dist.0.get(), 10);
        assert_eq!(a.as_packed(), &[1., 2., 3., 4., 5., 6., 7., 8., 9., 10.]);
        assert!(a.to_dense().is_symmetric());
        assert_eq!(a.at(3, 0), 7.);
        assert_eq!(a.at(0, 3), 7.);
    }

    #[test]
    fn assign() { 
        let mut a = SymMat::<f64>::new(3);
        a.assign(&sample().to_dense()).unwrap();
        assert_eq!(a, sample());

        let d = Mat::from_data((3, 3), [
            1., 2., 3.,
            0., 2., 0.,
            3., 0., 3.,
        ]);
        let e = a.assign(&d);
        assert!(matches!(e, Err(MatError::StructuralViolation(_))));
        assert_eq!(a, sample());
    }

    #[test]
    fn empty() { 
        let a = SymMat::<f64>::new(0);
        assert_eq!(a.as_packed().len(), 0);
        assert_eq!(a.to_dense().shape(), (0, 0));

        let a = SymMat::<f64>::from_rows::<[f64; 0]>(&[]).unwrap();
        assert_eq!(a.order(), 0);
    }

    #[test]
    #[cfg(feature = "serde")]
    fn serialize() { 
        let a = sample();
        let ser = serde_json::to_string(&a).unwrap();
        let des: SymMat<f64> = serde_json::from_str(&ser).unwrap();
        assert_eq!(a, des);

        let bad = serde_json::from_str::<SymMat<f64>>(r#"{"order":3,"data":[1.0]}"#);
        assert!(bad.is_err());
    }
}
