#![allow(non_upper_case_globals)]

use crate::scalar::Scalar;
pub use half::{bf16, f16};

pub const bfloat16: DType = DType::BF16;
pub const float16: DType = DType::F16;
pub const half: DType = DType::F16;
pub const float32: DType = DType::F32;
pub const float64: DType = DType::F64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DType {
    BF16,
    F16,
    F32,
    F64,
}

impl DType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BF16 => "bf16",
            Self::F16 => "f16",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }

    pub fn size_in_bytes(&self) -> usize {
        match self {
            Self::BF16 => 2,
            Self::F16 => 2,
            Self::F32 => 4,
            Self::F64 => 8,
        }
    }

    /// # Safety
    /// `ptr` must point to a valid value of this dtype.
    pub unsafe fn read_scalar(&self, ptr: *const u8) -> Scalar {
        match self {
            Self::BF16 => Scalar::BF16(std::ptr::read_unaligned(ptr as *const bf16)),
            Self::F16 => Scalar::F16(std::ptr::read_unaligned(ptr as *const f16)),
            Self::F32 => Scalar::F32(std::ptr::read_unaligned(ptr as *const f32)),
            Self::F64 => Scalar::F64(std::ptr::read_unaligned(ptr as *const f64)),
        }
    }

    /// # Safety
    /// `ptr` must be valid for writing a value of this dtype.
    pub unsafe fn write_scalar(&self, ptr: *mut u8, value: Scalar) {
        match self {
            Self::BF16 => std::ptr::write_unaligned(ptr as *mut bf16, value.as_bf16()),
            Self::F16 => std::ptr::write_unaligned(ptr as *mut f16, value.as_f16()),
            Self::F32 => std::ptr::write_unaligned(ptr as *mut f32, value.as_f32()),
            Self::F64 => std::ptr::write_unaligned(ptr as *mut f64, value.as_f64()),
        }
    }
}

thread_local! {
    static DEFAULT_DTYPE: std::cell::Cell<DType> = const { std::cell::Cell::new(DType::F32) };
}

pub fn get_default_dtype() -> DType {
    DEFAULT_DTYPE.with(|d| d.get())
}

pub fn set_default_dtype(dtype: DType) {
    DEFAULT_DTYPE.with(|d| d.set(dtype));
}
