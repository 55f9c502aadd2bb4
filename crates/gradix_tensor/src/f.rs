use crate::Tensor;
use gradix_core::{
    buffer::{cpu::CpuBuffer, Buffer},
    device::Device,
    error::{Error, Result},
    layout::Layout,
};
use std::sync::Arc;

impl Tensor {
    pub fn is_contiguous(&self) -> bool {
        self.metadata.layout.is_contiguous()
    }

    /// Returns a tensor with the same values laid out contiguously. Identity,
    /// gradient slot, and graph linkage are preserved, so the result stands
    /// in for the original anywhere in the graph.
    pub fn contiguous(&self) -> Result<Tensor> {
        if self.is_contiguous() && self.offset() == 0 {
            return Ok(self.clone());
        }

        let shape = self.shape().to_vec();
        let size = self.size();

        let mut new_buffer: Arc<dyn Buffer> = match self.device() {
            Device::CPU => Arc::new(CpuBuffer::new(size, self.dtype())?),
        };

        {
            let buffer_mut = Arc::get_mut(&mut new_buffer).ok_or(Error::BufferShared)?;
            for flat in 0..size {
                let value = self.item_at_flat_index(flat)?;
                buffer_mut.write_scalar(flat, value)?;
            }
        }

        let mut result = self.clone();
        result.data.buffer = new_buffer;
        result.metadata.layout = Layout::from_shape(&shape);

        Ok(result)
    }

    /// A value-sharing copy cut loose from the graph: no producing node and
    /// no gradient requirement. The gradient slot stays shared.
    pub fn detach(&self) -> Result<Self> {
        let mut result = self.clone();
        result.metadata.requires_grad = false;
        result.node = None;

        Ok(result)
    }
}
