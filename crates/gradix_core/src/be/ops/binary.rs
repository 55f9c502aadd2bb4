use crate::{
    buffer::Buffer,
    device::Device,
    dtype::DType,
    error::Result,
};
use gradix_cpu::ops::binary::*;
use half::{bf16, f16};

#[macro_export]
macro_rules! declare_binary_op {
    ($name:ident, [$($dtype:ident),* $(,)?]) => {
        paste::paste! {
            /// # Safety
            /// This function is unsafe because it performs raw pointer operations.
            pub unsafe fn $name(
                output: &mut dyn Buffer,
                lhs: &dyn Buffer,
                rhs: &dyn Buffer,
                size: usize,
                num_dims: usize,
                metadata: Option<&[usize]>,
            ) -> Result<()> {
                assert_eq!(lhs.dtype(), rhs.dtype(), concat!("DType mismatch in ", stringify!($name)));
                assert_eq!(output.dtype(), lhs.dtype(), "Output dtype must match input dtype");

                let metadata: *const usize = match output.device() {
                    Device::CPU => metadata.map_or(std::ptr::null(), |d| d.as_ptr()),
                };

                match lhs.dtype() {
                    $(
                        DType::$dtype => {
                            [<$name _ $dtype:lower>](
                                size,
                                num_dims,
                                metadata,
                                lhs.as_ptr() as *const [<$dtype:lower>],
                                rhs.as_ptr() as *const [<$dtype:lower>],
                                output.as_mut_ptr() as *mut [<$dtype:lower>],
                            )
                        }
                    )*
                };

                Ok(())
            }
        }
    };
}

declare_binary_op!(add, [BF16, F16, F32, F64]);
declare_binary_op!(sub, [BF16, F16, F32, F64]);
declare_binary_op!(mul, [BF16, F16, F32, F64]);
declare_binary_op!(div, [BF16, F16, F32, F64]);
