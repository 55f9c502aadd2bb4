pub mod adapter;
mod autograd;
mod creation;
mod d;
mod f;
mod operators;
pub(crate) mod ops;
pub mod registry;
#[cfg(feature = "serde")]
mod serde;
pub mod utils;
mod vec;
mod wt;

pub use autograd::{BackwardConfig, Op, TensorNode};
pub use registry::{RegistryEntry, ValueRegistry};

use gradix_core::{
    buffer::{cpu::CpuBuffer, Buffer},
    device::Device,
    dtype::DType,
    error::{Error, Result},
    layout::Layout,
    scalar::Scalar,
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

static NEXT_TENSOR_ID: AtomicUsize = AtomicUsize::new(0);

pub(crate) fn next_tensor_id() -> usize {
    NEXT_TENSOR_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Clone)]
pub struct TensorData {
    buffer: Arc<dyn Buffer>,
    grad: Arc<Mutex<Option<Tensor>>>,
}

#[derive(Clone)]
pub struct TensorMetadata {
    id: usize,
    device: Device,
    dtype: DType,
    layout: Layout,
    requires_grad: bool,
    is_native_gradient: bool,
    label: Option<String>,
}

/// A shaped numeric value. Clones share the same buffer and gradient slot;
/// operations on tensors that require gradients record graph nodes that
/// `backward` later replays in reverse topological order.
#[derive(Clone)]
pub struct Tensor {
    data: TensorData,
    metadata: TensorMetadata,
    node: Option<Arc<TensorNode>>,
}

impl Tensor {
    // data

    pub fn buffer(&self) -> &dyn Buffer {
        Arc::as_ref(&self.data.buffer)
    }

    fn buffer_clone(&self) -> Result<Arc<dyn Buffer>> {
        let src_buffer = self.buffer();
        let device = src_buffer.device();
        let dtype = src_buffer.dtype();
        let size = src_buffer.len();

        let new_buffer: Arc<dyn Buffer> = match device {
            Device::CPU => Arc::new(CpuBuffer::new(size, dtype)?),
        };

        unsafe {
            let buffer_ptr = Arc::into_raw(new_buffer) as *mut dyn Buffer;
            (*buffer_ptr).copy_from(src_buffer, 0, 0, size)?;
            let new_buffer = Arc::from_raw(buffer_ptr);
            Ok(new_buffer)
        }
    }

    pub fn with_buffer_mut<F, R>(&mut self, func: F) -> Result<R>
    where
        F: FnOnce(&mut dyn Buffer) -> Result<R>,
    {
        if Arc::strong_count(&self.data.buffer) == 1 {
            let buffer = Arc::get_mut(&mut self.data.buffer).ok_or(Error::BufferShared)?;
            func(buffer)
        } else {
            let mut new_buffer = self.buffer_clone()?;
            let buffer = Arc::get_mut(&mut new_buffer).ok_or(Error::BufferShared)?;
            let result = func(buffer)?;
            self.data.buffer = new_buffer;
            Ok(result)
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.metadata.layout
    }

    pub fn layout_mut(&mut self) -> &mut Layout {
        &mut self.metadata.layout
    }

    pub fn shape(&self) -> &[usize] {
        self.metadata.layout.shape()
    }

    pub fn strides(&self) -> &[usize] {
        self.metadata.layout.strides()
    }

    pub fn offset(&self) -> usize {
        self.metadata.layout.offset()
    }

    pub fn size(&self) -> usize {
        self.metadata.layout.size()
    }

    /// Total element count, an alias for `size`.
    pub fn numel(&self) -> usize {
        self.metadata.layout.size()
    }

    pub fn ndim(&self) -> usize {
        self.metadata.layout.ndim()
    }

    pub fn dim_size(&self, dim: usize) -> Option<usize> {
        self.metadata.layout.size_dim(dim)
    }

    // data - grad

    /// Non-resetting read of the accumulated gradient. `None` until a
    /// backward pass has touched this tensor.
    pub fn grad(&self) -> Result<Option<Tensor>> {
        let guard = self.data.grad.lock().map_err(|_| Error::GradLocked)?;
        Ok(guard.clone())
    }

    /// Resetting read: returns the accumulated gradient and clears the slot,
    /// so a later backward pass starts accumulation fresh.
    pub fn take_grad(&self) -> Result<Option<Tensor>> {
        let mut guard = self.data.grad.lock().map_err(|_| Error::GradLocked)?;
        Ok(guard.take())
    }

    pub fn accumulate_grad(&self, grad_in: &Tensor) -> Result<()> {
        let mut guard = self.data.grad.lock().map_err(|_| Error::GradLocked)?;
        let updated = match guard.take() {
            Some(prev) => prev.add(grad_in)?,
            None => grad_in.clone(),
        };
        *guard = Some(updated);
        Ok(())
    }

    pub fn zero_grad(&self) -> Result<()> {
        {
            let mut guard = self.data.grad.lock().map_err(|_| Error::GradLocked)?;
            if let Some(grad) = guard.as_ref() {
                let zero_tensor = Tensor::zeros_like(grad)?;
                *guard = Some(zero_tensor);
            }
        }

        if let Some(node) = &self.node {
            for input in node.inputs() {
                if input.requires_grad() {
                    input.zero_grad()?;
                }
            }
        }

        Ok(())
    }

    // node

    pub fn node(&self) -> Option<&Arc<TensorNode>> {
        self.node.as_ref()
    }

    pub fn set_node(&mut self, node: TensorNode) {
        self.node = Some(Arc::new(node));
    }

    /// Forces the symbolic backward rule for the producing operation of this
    /// tensor. Fails if the tensor has no recorded producing operation.
    pub fn set_disable_native_gradient(&self, disable: bool) -> Result<()> {
        match &self.node {
            Some(node) => {
                node.set_disable_native_gradient(disable);
                Ok(())
            },
            None => Err(Error::InvalidArgument(
                "cannot toggle native gradient dispatch on a tensor without a backward node".to_string(),
            )),
        }
    }

    // etc

    pub fn id(&self) -> usize {
        self.metadata.id
    }

    pub fn device(&self) -> Device {
        self.metadata.device
    }

    pub fn dtype(&self) -> DType {
        self.metadata.dtype
    }

    pub fn requires_grad(&self) -> bool {
        self.metadata.requires_grad
    }

    /// True if this tensor was produced by a fused backend gradient kernel
    /// rather than by replaying symbolic backward rules.
    pub fn is_native_gradient(&self) -> bool {
        self.metadata.is_native_gradient
    }

    pub fn label(&self) -> Option<&str> {
        self.metadata.label.as_deref()
    }

    pub fn item(&self) -> Result<Scalar> {
        if self.size() != 1 {
            return Err(Error::InvalidArgument(format!(
                "item() can only be called on a tensor with a single element, but got tensor with {} elements",
                self.size()
            )));
        }

        self.buffer().read_scalar(self.offset())
    }
}
