//! Multidimensional tensor shapes
//!
//! Shapes are dimension lists with row-major strides. The scratch layer only
//! needs the total element count (`volume`) to size allocations; strides are
//! carried so views handed to kernels can index without recomputing them.

/// Tensor shape with dimensions and row-major strides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorShape {
    dims: Vec<usize>,
    strides: Vec<usize>,
}

impl TensorShape {
    /// Create a tensor shape from dimensions, computing row-major strides
    pub fn from_dims(dims: &[usize]) -> Self {
        if dims.is_empty() {
            return Self {
                dims: vec![],
                strides: vec![],
            };
        }

        // Last dimension varies fastest; strides accumulate right-to-left.
        let mut strides = Vec::with_capacity(dims.len());
        for i in (0..dims.len()).rev() {
            let stride = if i == dims.len() - 1 {
                1
            } else {
                dims[i + 1..]
                    .iter()
                    .copied()
                    .fold(1usize, |acc, x| acc.checked_mul(x).unwrap_or(usize::MAX))
            };
            strides.push(stride);
        }
        strides.reverse();

        Self {
            dims: dims.to_vec(),
            strides,
        }
    }

    /// Get the dimensions
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Get the row-major strides
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Number of dimensions
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Total element count, saturating on overflow
    ///
    /// A saturated volume can never be allocated (the byte count check in the
    /// typed layer rejects it), so saturation is safe here.
    pub fn volume(&self) -> usize {
        self.dims
            .iter()
            .copied()
            .fold(1usize, |acc, x| acc.checked_mul(x).unwrap_or(usize::MAX))
    }
}

impl From<&[usize]> for TensorShape {
    fn from(dims: &[usize]) -> Self {
        Self::from_dims(dims)
    }
}

impl<const N: usize> From<[usize; N]> for TensorShape {
    fn from(dims: [usize; N]) -> Self {
        Self::from_dims(&dims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stride_computation() {
        let shape = TensorShape::from_dims(&[2, 3, 4]);
        assert_eq!(shape.dims(), &[2, 3, 4]);
        assert_eq!(shape.strides(), &[12, 4, 1]);
        assert_eq!(shape.volume(), 24);
    }

    #[test]
    fn test_one_dimensional() {
        let shape = TensorShape::from_dims(&[7]);
        assert_eq!(shape.strides(), &[1]);
        assert_eq!(shape.volume(), 7);
    }

    #[test]
    fn test_empty_shape_is_scalar() {
        let shape = TensorShape::from_dims(&[]);
        assert_eq!(shape.ndim(), 0);
        assert_eq!(shape.volume(), 1);
    }

    #[test]
    fn test_zero_extent_dimension() {
        let shape = TensorShape::from_dims(&[4, 0, 2]);
        assert_eq!(shape.volume(), 0);
    }

    #[test]
    fn test_volume_saturates_on_overflow() {
        let shape = TensorShape::from_dims(&[usize::MAX, 2]);
        assert_eq!(shape.volume(), usize::MAX);
    }

    #[test]
    fn test_from_array() {
        let shape: TensorShape = [2, 5].into();
        assert_eq!(shape.volume(), 10);
    }
}
