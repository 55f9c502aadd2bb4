pub mod cpu;

use crate::{
    device::Device,
    dtype::DType,
    error::{Error, Result},
    scalar::Scalar,
};
use cpu::CpuBuffer;
use std::{ffi::c_void, sync::Arc};

pub struct BufferManager {}

impl BufferManager {
    pub fn create(size: usize, device: Device, dtype: DType) -> Result<Arc<dyn Buffer>> {
        let buffer: Arc<dyn Buffer> = match device {
            Device::CPU => Arc::new(CpuBuffer::new(size, dtype)?),
        };

        Ok(buffer)
    }
}

pub trait Buffer: Send + Sync {
    fn as_ptr(&self) -> *const c_void;
    fn as_mut_ptr(&mut self) -> *mut c_void;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn dtype(&self) -> DType;
    fn device(&self) -> Device;

    /// # Safety
    /// Requires both ranges to be in bounds with no memory overlap
    unsafe fn copy_from(&mut self, other: &dyn Buffer, src_offset: usize, dst_offset: usize, count: usize) -> Result<()>;

    /// # Safety
    /// Requires valid source pointer and matching size_in_bytes with no memory overlap
    unsafe fn copy_from_host(&mut self, src: *const c_void, size_in_bytes: usize, src_offset: usize, dst_offset: usize) -> Result<()>;

    /// # Safety
    /// Requires valid destination pointer and matching size_in_bytes with no memory overlap
    unsafe fn copy_to_host(&self, dest: *mut c_void, size_in_bytes: usize, src_offset: usize, dst_offset: usize) -> Result<()>;

    fn copy_from_with_dtype_cast(&mut self, other: &dyn Buffer, src_offset: usize, dst_offset: usize, count: usize) -> Result<()> {
        if src_offset + count > other.len() || dst_offset + count > self.len() {
            return Err(Error::InvalidArgument("Offset and count exceed buffer dimensions".into()));
        }

        let from_dtype = other.dtype();
        let to_dtype = self.dtype();

        if from_dtype == to_dtype {
            unsafe {
                return self.copy_from(other, src_offset, dst_offset, count);
            }
        }

        macro_rules! convert_buffer {
            ($from_ty:ty => $to_ty:ty, $map:expr) => {{
                let mut temp_buf: Vec<$from_ty> = Vec::with_capacity(count);
                temp_buf.resize(count, Default::default());
                let size = count * from_dtype.size_in_bytes();
                unsafe {
                    other.copy_to_host(temp_buf.as_mut_ptr() as *mut std::ffi::c_void, size, src_offset, 0)?;
                    let converted: Vec<$to_ty> = temp_buf.iter().map($map).collect();
                    self.copy_from_host(
                        converted.as_ptr() as *const std::ffi::c_void,
                        converted.len() * std::mem::size_of::<$to_ty>(),
                        0,
                        dst_offset,
                    )
                }
            }};
        }

        match (from_dtype, to_dtype) {
            // From BF16
            (DType::BF16, DType::F16) => convert_buffer!(half::bf16 => half::f16, |&x| half::f16::from_f32(x.to_f32())),
            (DType::BF16, DType::F32) => convert_buffer!(half::bf16 => f32, |&x| f32::from(x)),
            (DType::BF16, DType::F64) => convert_buffer!(half::bf16 => f64, |&x| f64::from(x)),

            // From F16
            (DType::F16, DType::BF16) => convert_buffer!(half::f16 => half::bf16, |&x| half::bf16::from_f32(x.to_f32())),
            (DType::F16, DType::F32) => convert_buffer!(half::f16 => f32, |&x| f32::from(x)),
            (DType::F16, DType::F64) => convert_buffer!(half::f16 => f64, |&x| f64::from(x)),

            // From F32
            (DType::F32, DType::BF16) => convert_buffer!(f32 => half::bf16, |&x| half::bf16::from_f32(x)),
            (DType::F32, DType::F16) => convert_buffer!(f32 => half::f16, |&x| half::f16::from_f32(x)),
            (DType::F32, DType::F64) => convert_buffer!(f32 => f64, |&x| x as f64),

            // From F64
            (DType::F64, DType::BF16) => convert_buffer!(f64 => half::bf16, |&x| half::bf16::from_f64(x)),
            (DType::F64, DType::F16) => convert_buffer!(f64 => half::f16, |&x| half::f16::from_f64(x)),
            (DType::F64, DType::F32) => convert_buffer!(f64 => f32, |&x| x as f32),

            _ => Err(Error::InvalidArgument(format!(
                "Unsupported dtype conversion from {:?} to {:?}",
                from_dtype, to_dtype
            ))),
        }
    }

    /// Read a scalar value at the specified index
    fn read_scalar(&self, index: usize) -> Result<Scalar> {
        if index >= self.len() {
            return Err(Error::InvalidArgument(format!("Index out of bounds: {} >= {}", index, self.len())));
        }

        match self.device() {
            Device::CPU => {
                let offset = index * self.dtype().size_in_bytes();
                let ptr = unsafe { (self.as_ptr() as *const u8).add(offset) };

                Ok(unsafe { self.dtype().read_scalar(ptr) })
            }
        }
    }

    /// Write a scalar value at the specified index
    fn write_scalar(&mut self, index: usize, value: Scalar) -> Result<()> {
        if index >= self.len() {
            return Err(Error::InvalidArgument(format!("Index out of bounds: {} >= {}", index, self.len())));
        }

        match self.device() {
            Device::CPU => {
                let offset = index * self.dtype().size_in_bytes();
                let ptr = unsafe { (self.as_mut_ptr() as *mut u8).add(offset) };

                unsafe { self.dtype().write_scalar(ptr, value) };
                Ok(())
            }
        }
    }
}
