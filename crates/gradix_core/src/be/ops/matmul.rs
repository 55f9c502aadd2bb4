use crate::{
    buffer::Buffer,
    device::Device,
    dtype::DType,
    error::Result,
};
use gradix_cpu::ops::matmul::*;
use half::{bf16, f16};

#[macro_export]
macro_rules! declare_matmul_op {
    ([$($dtype:ident),* $(,)?]) => {
        paste::paste! {
            /// # Safety
            /// This function is unsafe because it performs raw pointer operations.
            pub unsafe fn matmul(
                output: &mut dyn Buffer,
                lhs: &dyn Buffer,
                rhs: &dyn Buffer,
                num_els: usize,
                metadata: Option<&[usize]>,
            ) -> Result<()> {
                assert_eq!(lhs.dtype(), rhs.dtype(), "DType mismatch in matmul");

                let metadata: *const usize = match output.device() {
                    Device::CPU => metadata.map_or(std::ptr::null(), |d| d.as_ptr()),
                };

                match lhs.dtype() {
                    $(
                        DType::$dtype => {
                            [<matmul_ $dtype:lower>](
                                num_els,
                                metadata,
                                lhs.as_ptr() as *const [<$dtype:lower>],
                                rhs.as_ptr() as *const [<$dtype:lower>],
                                output.as_mut_ptr() as *mut [<$dtype:lower>],
                            )
                        }
                    )*
                }

                Ok(())
            }

            /// # Safety
            /// This function is unsafe because it performs raw pointer operations.
            #[allow(clippy::too_many_arguments)]
            pub unsafe fn matmul_backward(
                grad_lhs: Option<&mut dyn Buffer>,
                grad_rhs: Option<&mut dyn Buffer>,
                grad_output: &dyn Buffer,
                lhs: &dyn Buffer,
                rhs: &dyn Buffer,
                num_els_a: usize,
                num_els_b: usize,
                metadata: Option<&[usize]>,
            ) -> Result<()> {
                assert_eq!(lhs.dtype(), rhs.dtype(), "DType mismatch in matmul_backward");

                let metadata: *const usize = match grad_output.device() {
                    Device::CPU => metadata.map_or(std::ptr::null(), |d| d.as_ptr()),
                };

                match lhs.dtype() {
                    $(
                        DType::$dtype => {
                            [<matmul_backward_ $dtype:lower>](
                                num_els_a,
                                num_els_b,
                                metadata,
                                grad_output.as_ptr() as *const [<$dtype:lower>],
                                lhs.as_ptr() as *const [<$dtype:lower>],
                                rhs.as_ptr() as *const [<$dtype:lower>],
                                grad_lhs.map_or(std::ptr::null_mut(), |buf| buf.as_mut_ptr() as *mut [<$dtype:lower>]),
                                grad_rhs.map_or(std::ptr::null_mut(), |buf| buf.as_mut_ptr() as *mut [<$dtype:lower>]),
                            )
                        }
                    )*
                }

                Ok(())
            }
        }
    };
}

declare_matmul_op!([BF16, F16, F32, F64]);
