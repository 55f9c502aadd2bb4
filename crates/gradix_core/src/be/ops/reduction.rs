use crate::{
    buffer::Buffer,
    device::Device,
    dtype::DType,
    error::Result,
};
use gradix_cpu::ops::reduction::*;
use half::{bf16, f16};

#[macro_export]
macro_rules! declare_reduction_op {
    ($name:ident: over_dims, [$($dtype:ident),* $(,)?]) => {
        paste::paste! {
            /// # Safety
            /// This function is unsafe because it performs raw pointer operations.
            pub unsafe fn $name(
                output: &mut dyn Buffer,
                input: &dyn Buffer,
                num_els: usize,
                num_dims: usize,
                num_red_dims: usize,
                metadata: Option<&[usize]>,
            ) -> Result<()> {
                let metadata: *const usize = match output.device() {
                    Device::CPU => metadata.map_or(std::ptr::null(), |d| d.as_ptr()),
                };

                match input.dtype() {
                    $(
                        DType::$dtype => {
                            [<$name _ $dtype:lower>](
                                num_els,
                                num_dims,
                                num_red_dims,
                                metadata,
                                input.as_ptr() as *const [<$dtype:lower>],
                                output.as_mut_ptr() as *mut [<$dtype:lower>],
                            )
                        }
                    )*
                }

                Ok(())
            }
        }
    };
    ($name:ident: to_shape, [$($dtype:ident),* $(,)?]) => {
        paste::paste! {
            /// # Safety
            /// This function is unsafe because it performs raw pointer operations.
            pub unsafe fn $name(
                output: &mut dyn Buffer,
                input: &dyn Buffer,
                num_els: usize,
                num_dims: usize,
                metadata: Option<&[usize]>,
            ) -> Result<()> {
                let metadata: *const usize = match output.device() {
                    Device::CPU => metadata.map_or(std::ptr::null(), |d| d.as_ptr()),
                };

                match input.dtype() {
                    $(
                        DType::$dtype => {
                            [<$name _ $dtype:lower>](
                                num_els,
                                num_dims,
                                metadata,
                                input.as_ptr() as *const [<$dtype:lower>],
                                output.as_mut_ptr() as *mut [<$dtype:lower>],
                            )
                        }
                    )*
                }

                Ok(())
            }
        }
    };
}

declare_reduction_op!(sum: over_dims, [BF16, F16, F32, F64]);
declare_reduction_op!(sum_to_shape: to_shape, [BF16, F16, F32, F64]);
