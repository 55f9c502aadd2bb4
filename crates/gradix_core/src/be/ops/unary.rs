use crate::{
    buffer::Buffer,
    device::Device,
    dtype::DType,
    error::Result,
    scalar::Scalar,
};
use gradix_cpu::ops::unary::*;
use half::{bf16, f16};

#[macro_export]
macro_rules! declare_unary_op {
    ($name:ident: standard, [$($dtype:ident),* $(,)?]) => {
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
    ($name:ident: with_constant, [$($dtype:ident),* $(,)?]) => {
        paste::paste! {
            /// # Safety
            /// This function is unsafe because it performs raw pointer operations.
            pub unsafe fn $name(
                output: &mut dyn Buffer,
                input: &dyn Buffer,
                num_els: usize,
                num_dims: usize,
                metadata: Option<&[usize]>,
                constant: Scalar,
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
                                constant.[<as_ $dtype:lower>](),
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

declare_unary_op!(neg: standard, [BF16, F16, F32, F64]);
declare_unary_op!(square: standard, [BF16, F16, F32, F64]);
declare_unary_op!(relu: standard, [BF16, F16, F32, F64]);
declare_unary_op!(step: standard, [BF16, F16, F32, F64]);

declare_unary_op!(add_scalar: with_constant, [BF16, F16, F32, F64]);
declare_unary_op!(sub_scalar: with_constant, [BF16, F16, F32, F64]);
declare_unary_op!(mul_scalar: with_constant, [BF16, F16, F32, F64]);
declare_unary_op!(div_scalar: with_constant, [BF16, F16, F32, F64]);

macro_rules! declare_activation_backward_op {
    ($name:ident, [$($dtype:ident),* $(,)?]) => {
        paste::paste! {
            /// # Safety
            /// This function is unsafe because it performs raw pointer operations.
            pub unsafe fn $name(
                grad_input: &mut dyn Buffer,
                input: &dyn Buffer,
                grad_output: &dyn Buffer,
                num_els: usize,
                num_dims: usize,
                metadata: Option<&[usize]>,
            ) -> Result<()> {
                let metadata: *const usize = match grad_input.device() {
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
                                grad_output.as_ptr() as *const [<$dtype:lower>],
                                grad_input.as_mut_ptr() as *mut [<$dtype:lower>],
                            )
                        }
                    )*
                }

                Ok(())
            }
        }
    };
}

declare_activation_backward_op!(relu_backward, [BF16, F16, F32, F64]);
