//! Dense Cholesky factorization for the small symmetric systems the Cox
//! solver produces (p x p information matrices).

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// pivots below this fraction of their diagonal entry count as singular
const RELATIVE_PIVOT_TOLERANCE: f64 = 1e-10;

/// A = L L', factored by nalgebra and handed back as ndarray
#[derive(Debug, Clone)]
pub struct Cholesky {
    factor: nalgebra::Cholesky<f64, nalgebra::Dyn>,
    lower: Array2<f64>,
}

impl Cholesky {
    /// factor a symmetric positive definite matrix; None if it is
    /// singular, indefinite or not square
    pub fn factor(a: ArrayView2<f64>) -> Option<Self> {
        let n = a.nrows();
        if n != a.ncols() || a.iter().any(|v| !v.is_finite()) {
            return None;
        }
        if a.diag().iter().any(|&d| d <= 0.0) {
            return None;
        }

        let factor = nalgebra::Cholesky::new(DMatrix::from_fn(n, n, |i, j| a[[i, j]]))?;
        let l = factor.l();

        // nalgebra only rejects negative pivots, near-zero ones mean collinearity
        for j in 0..n {
            let pivot = l[(j, j)] * l[(j, j)];
            if !pivot.is_finite() || pivot <= RELATIVE_PIVOT_TOLERANCE * a[[j, j]] {
                return None;
            }
        }

        let lower = Array2::from_shape_fn((n, n), |(i, j)| l[(i, j)]);
        Some(Self { factor, lower })
    }

    pub fn lower(&self) -> ArrayView2<'_, f64> {
        self.lower.view()
    }

    /// solve A x = b
    pub fn solve(&self, b: ArrayView1<f64>) -> Array1<f64> {
        let rhs = DVector::from_iterator(b.len(), b.iter().copied());
        Array1::from_iter(self.factor.solve(&rhs).iter().copied())
    }

    /// A^-1, symmetrized
    pub fn inverse(&self) -> Array2<f64> {
        let inverse = self.factor.inverse();
        let n = inverse.nrows();

        Array2::from_shape_fn((n, n), |(i, j)| 0.5 * (inverse[(i, j)] + inverse[(j, i)]))
    }
}
