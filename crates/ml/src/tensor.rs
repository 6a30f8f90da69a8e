use crate::error::{MlError, Result};

/// A dense host-side `f32` buffer with a row-major shape.
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor {
    pub data: Vec<f32>,
    pub shape: Vec<usize>,
}

impl Tensor {
    /// Builds a tensor from raw data.
    ///
    /// # Panics
    ///
    /// Panics if the shape does not describe `data.len()` elements. Use
    /// [`Tensor::try_from_vec`] when the sizes come from untrusted input.
    pub fn from_vec(shape: Vec<usize>, data: Vec<f32>) -> Self {
        assert_eq!(shape.iter().product::<usize>(), data.len());
        Self { data, shape }
    }

    pub fn try_from_vec(shape: Vec<usize>, data: Vec<f32>) -> Result<Self> {
        if shape.iter().product::<usize>() != data.len() {
            return Err(MlError::InvalidShape { shape, len: data.len() });
        }
        Ok(Self { data, shape })
    }

    #[must_use]
    pub fn zeros(shape: &[usize]) -> Self {
        Self { data: vec![0.0; shape.iter().product()], shape: shape.to_vec() }
    }

    /// A single value with shape `[1]`.
    #[must_use]
    pub fn scalar(value: f32) -> Self {
        Self { data: vec![value], shape: vec![1] }
    }

    /// Samples every element from `U[low, high)`.
    pub fn random_uniform(low: f32, high: f32, shape: &[usize], rng: &mut fastrand::Rng) -> Self {
        let len = shape.iter().product();
        let data = (0..len).map(|_| low + rng.f32() * (high - low)).collect();
        Self { data, shape: shape.to_vec() }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the only element of a single-element tensor.
    pub fn item(&self) -> Result<f32> {
        match self.data.as_slice() {
            [v] => Ok(*v),
            _ => Err(MlError::NotScalar(self.shape.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_from_vec_rejects_bad_shape() {
        let err = Tensor::try_from_vec(vec![2, 2], vec![1.0; 3]).unwrap_err();
        assert_eq!(err, MlError::InvalidShape { shape: vec![2, 2], len: 3 });
    }

    #[test]
    fn random_uniform_stays_in_bounds() {
        let mut rng = fastrand::Rng::with_seed(7);
        let t = Tensor::random_uniform(-0.25, 0.25, &[8, 8], &mut rng);
        assert_eq!(t.shape, vec![8, 8]);
        assert!(t.data.iter().all(|v| (-0.25..=0.25).contains(v)));
    }

    #[test]
    fn item_needs_one_element() {
        assert_eq!(Tensor::scalar(3.5).item().unwrap(), 3.5);
        assert!(Tensor::zeros(&[2]).item().is_err());
    }
}
