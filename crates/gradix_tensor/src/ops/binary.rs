use crate::{
    autograd::Op,
    utils::{
        broadcast::broadcast_tensor,
        promotion::{get_promoted_dtype, promote_tensor},
    },
    Tensor, TensorNode,
};
use gradix_core::error::Result;

impl Tensor {
    pub fn add(&self, rhs: &Tensor) -> Result<Tensor> {
        let target_dtype = if self.dtype() != rhs.dtype() {
            get_promoted_dtype(self.dtype(), rhs.dtype())
        } else {
            self.dtype()
        };

        let lhs_in = promote_tensor(self, target_dtype)?;
        let rhs_in = promote_tensor(rhs, target_dtype)?;
        let lhs = broadcast_tensor(&lhs_in, &rhs_in)?;
        let rhs_b = broadcast_tensor(&rhs_in, &lhs)?;

        let mut result = Self::empty_with_spec(lhs.shape(), lhs.device(), lhs.dtype())?;

        let dims_and_strides = prepare_dims_and_strides(&lhs, &rhs_b);
        unsafe {
            result.with_buffer_mut(|out_buf| {
                gradix_core::be::ops::binary::add(out_buf, lhs.buffer(), rhs_b.buffer(), lhs.size(), lhs.ndim(), Some(&dims_and_strides))?;

                Ok(())
            })?;
        }

        if self.requires_grad() || rhs.requires_grad() {
            result.with_grad()?;
            // The node keeps the pre-broadcast operands; the backward rule
            // reduces gradients back to these shapes.
            result.set_node(TensorNode::new(Op::Add, vec![self.clone(), rhs.clone()]));
        }

        Ok(result)
    }

    pub fn sub(&self, rhs: &Tensor) -> Result<Tensor> {
        let target_dtype = if self.dtype() != rhs.dtype() {
            get_promoted_dtype(self.dtype(), rhs.dtype())
        } else {
            self.dtype()
        };

        let lhs_in = promote_tensor(self, target_dtype)?;
        let rhs_in = promote_tensor(rhs, target_dtype)?;
        let lhs = broadcast_tensor(&lhs_in, &rhs_in)?;
        let rhs_b = broadcast_tensor(&rhs_in, &lhs)?;

        let mut result = Self::empty_with_spec(lhs.shape(), lhs.device(), lhs.dtype())?;

        let dims_and_strides = prepare_dims_and_strides(&lhs, &rhs_b);
        unsafe {
            result.with_buffer_mut(|out_buf| {
                gradix_core::be::ops::binary::sub(out_buf, lhs.buffer(), rhs_b.buffer(), lhs.size(), lhs.ndim(), Some(&dims_and_strides))?;

                Ok(())
            })?;
        }

        if self.requires_grad() || rhs.requires_grad() {
            result.with_grad()?;
            result.set_node(TensorNode::new(Op::Sub, vec![self.clone(), rhs.clone()]));
        }

        Ok(result)
    }

    pub fn mul(&self, rhs: &Tensor) -> Result<Tensor> {
        let target_dtype = if self.dtype() != rhs.dtype() {
            get_promoted_dtype(self.dtype(), rhs.dtype())
        } else {
            self.dtype()
        };

        let lhs_in = promote_tensor(self, target_dtype)?;
        let rhs_in = promote_tensor(rhs, target_dtype)?;
        let lhs = broadcast_tensor(&lhs_in, &rhs_in)?;
        let rhs_b = broadcast_tensor(&rhs_in, &lhs)?;

        let mut result = Self::empty_with_spec(lhs.shape(), lhs.device(), lhs.dtype())?;

        let dims_and_strides = prepare_dims_and_strides(&lhs, &rhs_b);
        unsafe {
            result.with_buffer_mut(|out_buf| {
                gradix_core::be::ops::binary::mul(out_buf, lhs.buffer(), rhs_b.buffer(), lhs.size(), lhs.ndim(), Some(&dims_and_strides))?;

                Ok(())
            })?;
        }

        if self.requires_grad() || rhs.requires_grad() {
            result.with_grad()?;
            result.set_node(TensorNode::new(Op::Mul, vec![self.clone(), rhs.clone()]));
        }

        Ok(result)
    }

    pub fn div(&self, rhs: &Tensor) -> Result<Tensor> {
        let target_dtype = if self.dtype() != rhs.dtype() {
            get_promoted_dtype(self.dtype(), rhs.dtype())
        } else {
            self.dtype()
        };

        let lhs_in = promote_tensor(self, target_dtype)?;
        let rhs_in = promote_tensor(rhs, target_dtype)?;
        let lhs = broadcast_tensor(&lhs_in, &rhs_in)?;
        let rhs_b = broadcast_tensor(&rhs_in, &lhs)?;

        let mut result = Self::empty_with_spec(lhs.shape(), lhs.device(), lhs.dtype())?;

        let dims_and_strides = prepare_dims_and_strides(&lhs, &rhs_b);
        unsafe {
            result.with_buffer_mut(|out_buf| {
                gradix_core::be::ops::binary::div(out_buf, lhs.buffer(), rhs_b.buffer(), lhs.size(), lhs.ndim(), Some(&dims_and_strides))?;

                Ok(())
            })?;
        }

        if self.requires_grad() || rhs.requires_grad() {
            result.with_grad()?;
            result.set_node(TensorNode::new(Op::Div, vec![self.clone(), rhs.clone()]));
        }

        Ok(result)
    }
}

fn prepare_dims_and_strides(lhs: &Tensor, rhs: &Tensor) -> Vec<usize> {
    let mut dims_and_strides = Vec::new();

    dims_and_strides.extend_from_slice(lhs.shape());
    dims_and_strides.extend_from_slice(lhs.strides());
    dims_and_strides.extend_from_slice(rhs.strides());

    dims_and_strides
}
