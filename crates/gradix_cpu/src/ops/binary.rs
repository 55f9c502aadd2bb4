use half::{bf16, f16};
use rayon::prelude::*;

#[inline(always)]
fn compute_factors(num_dims: usize, dims: &[usize]) -> Vec<usize> {
    let mut factors = vec![1; num_dims];
    // factors[d] = product_{j=d+1}^{num_dims-1} dims[j]
    for d in (0..num_dims).rev() {
        if d + 1 < num_dims {
            factors[d] = factors[d + 1] * dims[d + 1];
        }
    }
    factors
}

#[inline(always)]
fn compute_offset(i: usize, num_dims: usize, factors: &[usize], strides: &[usize]) -> usize {
    let mut offset = 0;
    let mut rem = i;
    for d in 0..num_dims {
        let digit = rem / factors[d];
        offset += digit * strides[d];
        rem %= factors[d];
    }
    offset
}

macro_rules! binary_op {
    ($name:ident, $op:expr, $type:ty) => {
        #[no_mangle]
        /// # Safety
        ///
        /// Caller must guarantee that:
        /// * `dims_and_strides` must be either:
        ///   - null (indicating contiguous arrays) or
        ///   - a valid pointer to an array of `3 * num_dims` elements containing:
        ///     - dims[num_dims]: array dimensions
        ///     - lhs_strides[num_dims]: strides for left-hand side array
        ///     - rhs_strides[num_dims]: strides for right-hand side array
        /// * `lhs` must be a valid pointer to an array of at least `num_els` elements
        /// * `rhs` must be a valid pointer to an array of at least `num_els` elements
        /// * `out` must be a valid pointer to an array of at least `num_els` elements
        /// * The memory regions of `lhs`, `rhs`, and `out` must not overlap
        /// * All array indices calculated from dims and strides must be in bounds
        pub unsafe fn $name(
            num_els: usize,
            num_dims: usize,
            dims_and_strides: *const usize,
            lhs: *const $type,
            rhs: *const $type,
            out: *mut $type,
        ) {
            let dims = if dims_and_strides.is_null() {
                None
            } else {
                Some(std::slice::from_raw_parts(dims_and_strides, num_dims))
            };

            let lhs_strides = if dims_and_strides.is_null() {
                None
            } else {
                Some(std::slice::from_raw_parts(dims_and_strides.add(num_dims), num_dims))
            };

            let rhs_strides = if dims_and_strides.is_null() {
                None
            } else {
                Some(std::slice::from_raw_parts(dims_and_strides.add(2 * num_dims), num_dims))
            };

            let lhs = std::slice::from_raw_parts(lhs, num_els);
            let rhs = std::slice::from_raw_parts(rhs, num_els);
            let out = std::slice::from_raw_parts_mut(out, num_els);

            let is_contiguous = |strides: Option<&[usize]>| -> bool {
                match (dims, strides) {
                    (Some(dims), Some(strides)) => {
                        let mut acc = 1;
                        for d in (0..num_dims).rev() {
                            if strides[d] != acc {
                                return false;
                            }
                            acc *= dims[d];
                        }
                        true
                    }
                    _ => true,
                }
            };

            let lhs_cont = is_contiguous(lhs_strides);
            let rhs_cont = is_contiguous(rhs_strides);

            let factors = if !lhs_cont || !rhs_cont {
                dims.map(|d| compute_factors(num_dims, d))
            } else {
                None
            };

            out.par_iter_mut().enumerate().for_each(|(i, out_val)| {
                let (lhs_idx, rhs_idx) = if !lhs_cont || !rhs_cont {
                    if let (Some(lhs_str), Some(rhs_str), Some(ref fac)) = (lhs_strides, rhs_strides, factors.as_ref()) {
                        (
                            compute_offset(i, num_dims, fac, lhs_str),
                            compute_offset(i, num_dims, fac, rhs_str),
                        )
                    } else {
                        (i, i)
                    }
                } else {
                    (i, i)
                };

                *out_val = $op(lhs[lhs_idx], rhs[rhs_idx]);
            });
        }
    };
}

binary_op!(add_bf16, |a, b| a + b, bf16);
binary_op!(add_f16, |a, b| a + b, f16);
binary_op!(add_f32, |a, b| a + b, f32);
binary_op!(add_f64, |a, b| a + b, f64);

binary_op!(sub_bf16, |a, b| a - b, bf16);
binary_op!(sub_f16, |a, b| a - b, f16);
binary_op!(sub_f32, |a, b| a - b, f32);
binary_op!(sub_f64, |a, b| a - b, f64);

binary_op!(mul_bf16, |a, b| a * b, bf16);
binary_op!(mul_f16, |a, b| a * b, f16);
binary_op!(mul_f32, |a, b| a * b, f32);
binary_op!(mul_f64, |a, b| a * b, f64);

binary_op!(div_bf16, |a, b| a / b, bf16);
binary_op!(div_f16, |a, b| a / b, f16);
binary_op!(div_f32, |a, b| a / b, f32);
binary_op!(div_f64, |a, b| a / b, f64);
