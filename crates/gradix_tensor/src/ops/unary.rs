use crate::{autograd::Op, Tensor, TensorNode};
use gradix_core::{error::Result, scalar::Scalar};

impl Tensor {
    pub fn neg(&self) -> Result<Tensor> {
        let mut result = Self::empty_with_spec(self.shape(), self.device(), self.dtype())?;

        unsafe {
            result.with_buffer_mut(|out_buf| {
                gradix_core::be::ops::unary::neg(
                    out_buf,
                    self.buffer(),
                    self.size(),
                    self.ndim(),
                    Some(&prepare_metadata(self)),
                )?;
                Ok(())
            })?;
        }

        if self.requires_grad() {
            result.with_grad()?;
            result.set_node(TensorNode::new(Op::Neg, vec![self.clone()]));
        }

        Ok(result)
    }

    pub fn square(&self) -> Result<Tensor> {
        let mut result = Self::empty_with_spec(self.shape(), self.device(), self.dtype())?;

        unsafe {
            result.with_buffer_mut(|out_buf| {
                gradix_core::be::ops::unary::square(
                    out_buf,
                    self.buffer(),
                    self.size(),
                    self.ndim(),
                    Some(&prepare_metadata(self)),
                )?;
                Ok(())
            })?;
        }

        if self.requires_grad() {
            result.with_grad()?;
            result.set_node(TensorNode::new(Op::Square, vec![self.clone()]));
        }

        Ok(result)
    }

    pub fn relu(&self) -> Result<Tensor> {
        let mut result = Self::empty_with_spec(self.shape(), self.device(), self.dtype())?;

        unsafe {
            result.with_buffer_mut(|out_buf| {
                gradix_core::be::ops::unary::relu(
                    out_buf,
                    self.buffer(),
                    self.size(),
                    self.ndim(),
                    Some(&prepare_metadata(self)),
                )?;
                Ok(())
            })?;
        }

        if self.requires_grad() {
            result.with_grad()?;
            result.set_node(TensorNode::new(Op::Relu, vec![self.clone()]));
        }

        Ok(result)
    }

    /// Heaviside step, 1 where the value is positive and 0 elsewhere. The
    /// result never records a graph node.
    pub fn step(&self) -> Result<Tensor> {
        let mut result = Self::empty_with_spec(self.shape(), self.device(), self.dtype())?;

        unsafe {
            result.with_buffer_mut(|out_buf| {
                gradix_core::be::ops::unary::step(
                    out_buf,
                    self.buffer(),
                    self.size(),
                    self.ndim(),
                    Some(&prepare_metadata(self)),
                )?;
                Ok(())
            })?;
        }

        Ok(result)
    }

    pub fn add_scalar<T: Into<Scalar>>(&self, scalar: T) -> Result<Tensor> {
        let scalar = scalar.into();
        let mut result = Self::empty_with_spec(self.shape(), self.device(), self.dtype())?;

        unsafe {
            result.with_buffer_mut(|out_buf| {
                gradix_core::be::ops::unary::add_scalar(
                    out_buf,
                    self.buffer(),
                    self.size(),
                    self.ndim(),
                    Some(&prepare_metadata(self)),
                    scalar,
                )?;
                Ok(())
            })?;
        }

        if self.requires_grad() {
            result.with_grad()?;
            result.set_node(TensorNode::new(Op::AddScalar(scalar), vec![self.clone()]));
        }

        Ok(result)
    }

    pub fn sub_scalar<T: Into<Scalar>>(&self, scalar: T) -> Result<Tensor> {
        let scalar = scalar.into();
        let mut result = Self::empty_with_spec(self.shape(), self.device(), self.dtype())?;

        unsafe {
            result.with_buffer_mut(|out_buf| {
                gradix_core::be::ops::unary::sub_scalar(
                    out_buf,
                    self.buffer(),
                    self.size(),
                    self.ndim(),
                    Some(&prepare_metadata(self)),
                    scalar,
                )?;
                Ok(())
            })?;
        }

        if self.requires_grad() {
            result.with_grad()?;
            result.set_node(TensorNode::new(Op::SubScalar(scalar), vec![self.clone()]));
        }

        Ok(result)
    }

    pub fn mul_scalar<T: Into<Scalar>>(&self, scalar: T) -> Result<Tensor> {
        let scalar = scalar.into();
        let mut result = Self::empty_with_spec(self.shape(), self.device(), self.dtype())?;

        unsafe {
            result.with_buffer_mut(|out_buf| {
                gradix_core::be::ops::unary::mul_scalar(
                    out_buf,
                    self.buffer(),
                    self.size(),
                    self.ndim(),
                    Some(&prepare_metadata(self)),
                    scalar,
                )?;
                Ok(())
            })?;
        }

        if self.requires_grad() {
            result.with_grad()?;
            result.set_node(TensorNode::new(Op::MulScalar(scalar), vec![self.clone()]));
        }

        Ok(result)
    }

    pub fn div_scalar<T: Into<Scalar>>(&self, scalar: T) -> Result<Tensor> {
        let scalar = scalar.into();
        let mut result = Self::empty_with_spec(self.shape(), self.device(), self.dtype())?;

        unsafe {
            result.with_buffer_mut(|out_buf| {
                gradix_core::be::ops::unary::div_scalar(
                    out_buf,
                    self.buffer(),
                    self.size(),
                    self.ndim(),
                    Some(&prepare_metadata(self)),
                    scalar,
                )?;
                Ok(())
            })?;
        }

        if self.requires_grad() {
            result.with_grad()?;
            result.set_node(TensorNode::new(Op::DivScalar(scalar), vec![self.clone()]));
        }

        Ok(result)
    }
}

pub(crate) fn prepare_metadata(tensor: &Tensor) -> Vec<usize> {
    let mut metadata = Vec::new();

    metadata.extend_from_slice(tensor.shape());
    metadata.extend_from_slice(tensor.strides());
    metadata.push(tensor.offset());

    metadata
}
