use approx::RelativeEq;
use ndarray::{ArrayBase, Data, Dimension};

/// Tolerance comparison with a descriptive error, for use in tests.
pub trait IsClose<Rhs = Self> {
    fn is_close(&self, other: &Rhs, abs_tol: f64, rel_tol: f64) -> Result<(), String>;
}

impl<S1, S2, D> IsClose<ArrayBase<S2, D>> for ArrayBase<S1, D>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    D: Dimension,
{
    fn is_close(&self, other: &ArrayBase<S2, D>, abs_tol: f64, rel_tol: f64) -> Result<(), String> {
        if self.shape() != other.shape() {
            return Err(format!(
                "Array shapes differ: actual {:?}, expected {:?}",
                self.shape(),
                other.shape()
            ));
        }
        if self.relative_eq(other, abs_tol, rel_tol) {
            return Ok(());
        }
        let mut mismatches = Vec::new();
        for (idx, (a, b)) in self.iter().zip(other.iter()).enumerate() {
            let abs_diff = (a - b).abs();
            let tolerance = rel_tol.mul_add(a.abs().max(b.abs()), abs_tol).max(abs_tol);
            if abs_diff > tolerance {
                mismatches.push(format!(
                    "Element {} differs: actual {}, expected {}, abs_diff {}, tolerance {}",
                    idx, a, b, abs_diff, tolerance
                ));
            }
        }
        Err(mismatches.join("\n"))
    }
}

impl IsClose<f64> for f64 {
    fn is_close(&self, other: &f64, abs_tol: f64, rel_tol: f64) -> Result<(), String> {
        let abs_diff = (self - other).abs();
        let tolerance = rel_tol
            .mul_add(self.abs().max(other.abs()), abs_tol)
            .max(abs_tol);
        if abs_diff > tolerance {
            return Err(format!(
                "Scalar differs: actual {}, expected {}, abs_diff {}, tolerance {}",
                self, other, abs_diff, tolerance
            ));
        }
        Ok(())
    }
}
