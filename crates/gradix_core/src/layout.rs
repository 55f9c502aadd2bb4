use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Layout {
    shape: Vec<usize>,
    strides: Vec<usize>,
    offset: usize,
}

impl Layout {
    pub fn new(shape: &[usize], strides: &[usize], offset: usize) -> Self {
        Self {
            shape: shape.to_vec(),
            strides: strides.to_vec(),
            offset,
        }
    }

    pub fn from_shape(shape: &[usize]) -> Self {
        Self {
            shape: shape.to_vec(),
            strides: Self::compute_strides(shape),
            offset: 0,
        }
    }

    pub fn set_shape(&mut self, shape: &[usize]) {
        self.shape = shape.to_vec();
    }
    pub fn set_strides(&mut self, strides: &[usize]) {
        self.strides = strides.to_vec();
    }
    pub fn set_offset(&mut self, offset: usize) {
        self.offset = offset;
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }
    pub fn size_dim(&self, dim: usize) -> Option<usize> {
        self.shape.get(dim).copied()
    }
    pub fn size(&self) -> usize {
        self.shape.iter().product()
    }
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_contiguous(&self) -> bool {
        let mut acc = 1;
        for d in (0..self.shape.len()).rev() {
            if self.shape[d] > 1 && self.strides[d] != acc {
                return false;
            }
            acc *= self.shape[d];
        }
        true
    }

    pub fn view(&mut self, new_shape: &[usize]) -> Result<()> {
        let old_size = self.size();
        let new_size = new_shape.iter().product();

        if old_size != new_size {
            return Err(Error::IncompatibleShape(format!(
                "Cannot reshape layout of size {} to size {}",
                old_size, new_size
            )));
        }

        self.shape = new_shape.to_vec();
        self.strides = Self::compute_strides(new_shape);

        Ok(())
    }

    pub fn transpose(&mut self, dim0: usize, dim1: usize) -> Result<()> {
        if dim0 >= self.ndim() || dim1 >= self.ndim() {
            return Ok(());
        }

        self.shape.swap(dim0, dim1);
        self.strides.swap(dim0, dim1);

        Ok(())
    }

    // helper

    pub fn compute_strides(shape: &[usize]) -> Vec<usize> {
        // Scalar layouts have an empty shape
        if shape.is_empty() {
            return vec![];
        }

        let mut strides = vec![1; shape.len()];
        for i in (0..shape.len() - 1).rev() {
            strides[i] = strides[i + 1] * shape[i + 1];
        }
        strides
    }

    pub fn compute_size(shape: &[usize]) -> usize {
        shape.iter().product()
    }

    pub fn can_broadcast_like(&self, target: &Layout) -> bool {
        let self_shape = &self.shape;
        let target_shape = &target.shape;

        // Pad the shorter shape with ones on the left, then compare dimension pairs
        let rank_diff = target_shape.len().saturating_sub(self_shape.len());
        let mut padded_self_shape = vec![1; rank_diff];
        padded_self_shape.extend(self_shape.iter());

        for (&a, &b) in padded_self_shape.iter().zip(target_shape.iter()) {
            if a != b && a != 1 && b != 1 {
                return false;
            }
        }

        true
    }
}
