use crate::Tensor;
use gradix_core::{
    buffer::{cpu::CpuBuffer, Buffer},
    device::Device,
    dtype::DType,
    error::{Error, Result},
    layout::Layout,
};
use std::sync::Arc;

impl Tensor {
    /// Reinterprets the tensor in place at a new shape with the same element
    /// count.
    pub fn with_shape(&mut self, shape: &[usize]) -> Result<()> {
        let new_size: usize = shape.iter().product();
        if new_size != self.size() {
            return Err(Error::InvalidShape {
                message: format!(
                    "Cannot resize tensor of {} elements to shape {:?} ({} elements)",
                    self.size(),
                    shape,
                    new_size
                ),
            });
        }

        self.metadata.layout = Layout::from_shape(shape);

        Ok(())
    }

    /// Marks the tensor as a gradient target. The gradient slot itself stays
    /// empty until a backward pass writes into it.
    pub fn with_grad(&mut self) -> Result<()> {
        self.metadata.requires_grad = true;

        Ok(())
    }

    pub fn set_requires_grad(&mut self, requires_grad: bool) {
        self.metadata.requires_grad = requires_grad;
    }

    pub fn with_label(&mut self, label: &str) {
        self.metadata.label = Some(label.to_string());
    }

    pub fn with_dtype(&mut self, dtype: DType) -> Result<()> {
        if self.dtype() == dtype {
            return Ok(());
        }

        let len = self.buffer().len();
        let mut new_buffer: Arc<dyn Buffer> = match self.device() {
            Device::CPU => Arc::new(CpuBuffer::new(len, dtype)?),
        };

        {
            let buffer_mut = Arc::get_mut(&mut new_buffer).ok_or(Error::BufferShared)?;
            buffer_mut.copy_from_with_dtype_cast(self.buffer(), 0, 0, len)?;
        }

        self.data.buffer = new_buffer;
        self.metadata.dtype = dtype;

        Ok(())
    }

    /// Returns a converted copy. The copy keeps `requires_grad` but starts a
    /// fresh graph history.
    pub fn to_dtype(&self, dtype: DType) -> Result<Self> {
        if self.dtype() == dtype {
            return Ok(self.clone());
        }

        let len = self.buffer().len();
        let mut new_buffer: Arc<dyn Buffer> = match self.device() {
            Device::CPU => Arc::new(CpuBuffer::new(len, dtype)?),
        };

        {
            let buffer_mut = Arc::get_mut(&mut new_buffer).ok_or(Error::BufferShared)?;
            buffer_mut.copy_from_with_dtype_cast(self.buffer(), 0, 0, len)?;
        }

        let mut result = Self::share_data(self)?;
        result.data.buffer = new_buffer;
        result.metadata.dtype = dtype;
        result.set_requires_grad(self.requires_grad());

        Ok(result)
    }
}
