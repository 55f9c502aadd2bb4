use crate::{autograd::Op, Tensor, TensorNode};
use gradix_core::{
    error::{Error, Result},
    scalar::Scalar,
};

impl Tensor {
    pub fn sum(&self, dim: impl Into<Scalar>) -> Result<Tensor> {
        let dim_i64 = dim.into().as_f64_any() as i64;
        let dim: usize = if dim_i64 < 0 {
            (self.ndim() as i64 + dim_i64) as usize
        } else {
            dim_i64 as usize
        };

        let mut shape: Vec<usize> = self.shape().to_vec();
        if dim >= shape.len() {
            return Err(Error::DimensionOutOfBounds {
                dim: dim as i32,
                ndim: self.ndim(),
            });
        }
        shape.remove(dim);

        let mut result = Self::zeros_with_spec(&shape, self.device(), self.dtype())?;

        let metadata = prepare_sum_metadata(self, &[dim]);
        unsafe {
            result.with_buffer_mut(|out_buf| {
                gradix_core::be::ops::reduction::sum(out_buf, self.buffer(), self.size(), self.ndim(), 1, Some(&metadata))?;

                Ok(())
            })?;
        }

        if self.requires_grad() {
            result.with_grad()?;
            result.set_node(TensorNode::new(Op::SumDim { dim }, vec![self.clone()]));
        }

        Ok(result)
    }

    /// Sums every element into a scalar with a single reduction call, so the
    /// whole operation is one graph node.
    pub fn sum_all(&self) -> Result<Self> {
        let dims: Vec<usize> = (0..self.ndim()).collect();

        let mut result = Self::zeros_with_spec(&[], self.device(), self.dtype())?;

        let metadata = prepare_sum_metadata(self, &dims);
        unsafe {
            result.with_buffer_mut(|out_buf| {
                gradix_core::be::ops::reduction::sum(out_buf, self.buffer(), self.size(), self.ndim(), dims.len(), Some(&metadata))?;

                Ok(())
            })?;
        }

        if self.requires_grad() {
            result.with_grad()?;
            result.set_node(TensorNode::new(Op::SumAll, vec![self.clone()]));
        }

        Ok(result)
    }

    /// Reduces to a broadcast-compatible `shape` by summing the dimensions
    /// that were expanded. The gradient counterpart of `broadcast`.
    pub fn sum_to_shape(&self, shape: &[usize]) -> Result<Tensor> {
        if self.shape() == shape {
            return Ok(self.clone());
        }

        if shape.len() != self.ndim() {
            if self.ndim() > shape.len() {
                let mut result = self.clone();
                while result.ndim() > shape.len() {
                    result = result.sum(0)?;
                }
                return result.sum_to_shape(shape);
            } else {
                return Err(Error::ShapeMismatch {
                    expected: self.ndim(),
                    got: shape.len(),
                    msg: "Target shape has more dimensions than input".to_string(),
                });
            }
        }

        for (i, &dim) in shape.iter().enumerate() {
            if self.shape()[i] % dim != 0 {
                return Err(Error::ShapeMismatch {
                    expected: self.shape()[i],
                    got: dim,
                    msg: format!("Dimension {} is not divisible: {} -> {}", i, self.shape()[i], dim),
                });
            }
        }

        let mut result = Self::zeros_with_spec(shape, self.device(), self.dtype())?;

        let metadata = prepare_metadata_for_shape(self, shape);
        unsafe {
            result.with_buffer_mut(|out_buf| {
                gradix_core::be::ops::reduction::sum_to_shape(out_buf, self.buffer(), self.size(), self.ndim(), Some(&metadata))?;

                Ok(())
            })?;
        }

        if self.requires_grad() {
            result.with_grad()?;
            result.set_node(TensorNode::new(Op::SumToShape { shape: shape.to_vec() }, vec![self.clone()]));
        }

        Ok(result)
    }
}

fn prepare_sum_metadata(tensor: &Tensor, dims: &[usize]) -> Vec<usize> {
    let mut info = Vec::new();
    let shape = tensor.shape();
    let strides = tensor.strides();
    info.extend_from_slice(shape);
    info.extend_from_slice(strides);
    info.extend_from_slice(dims);
    info.push(tensor.offset());
    info
}

fn prepare_metadata_for_shape(tensor: &Tensor, target_shape: &[usize]) -> Vec<usize> {
    let mut info = Vec::new();
    let input_shape = tensor.shape();
    let input_strides = tensor.strides();
    info.extend_from_slice(input_shape);
    info.extend_from_slice(input_strides);
    info.extend_from_slice(target_shape);
    info.push(tensor.offset());
    info
}
