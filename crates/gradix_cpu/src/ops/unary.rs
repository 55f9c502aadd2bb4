use half::{bf16, f16};
use rayon::prelude::*;

macro_rules! unary_op {
    ($name:ident, $type:ty, $func:expr) => {
        #[no_mangle]
        /// # Safety
        ///
        /// * `metadata` must be either:
        ///   - null, indicating contiguous arrays
        ///   - a valid pointer to an array of `2 * num_dims + 1` elements containing:
        ///     * dims[num_dims]: array dimensions
        ///     * strides[num_dims]: strides for array
        ///     * offset: starting offset into the input array
        /// * `input` must be a valid pointer to an array of at least `num_els` elements
        /// * `output` must be a valid pointer to an array of at least `num_els` elements
        /// * The memory regions of input and output must not overlap
        /// * All array indices calculated from dims and strides must be in bounds
        pub unsafe fn $name(num_els: usize, num_dims: usize, metadata: *const usize, input: *const $type, output: *mut $type) {
            let dims = if metadata.is_null() {
                None
            } else {
                Some(std::slice::from_raw_parts(metadata, num_dims))
            };

            let strides = if metadata.is_null() {
                None
            } else {
                Some(std::slice::from_raw_parts(metadata.add(num_dims), num_dims))
            };

            let offset = if metadata.is_null() { 0 } else { *metadata.add(2 * num_dims) };

            let is_contiguous = |strides: Option<&[usize]>| {
                if let (Some(dims), Some(strides)) = (dims, strides) {
                    let mut acc = 1;
                    for d in (0..num_dims).rev() {
                        if strides[d] != acc {
                            return false;
                        }
                        acc *= dims[d];
                    }
                }
                true
            };

            let input_slice = std::slice::from_raw_parts(input, num_els + offset);
            let output_slice = std::slice::from_raw_parts_mut(output, num_els);

            let is_cont = is_contiguous(strides);

            output_slice.par_iter_mut().enumerate().for_each(|(i, out_val)| {
                let idx = if !is_cont {
                    let mut tmp_i = i;
                    let mut strided_i = offset;

                    if let (Some(dims), Some(strides)) = (dims, strides) {
                        for d in (0..num_dims).rev() {
                            let i_dim = tmp_i % dims[d];
                            strided_i += i_dim * strides[d];
                            tmp_i /= dims[d];
                        }
                    }

                    strided_i.min(num_els + offset - 1)
                } else {
                    offset + i
                };

                let x = input_slice[idx];
                *out_val = $func(x);
            });
        }
    };
}

macro_rules! unary_op_with_constant {
    ($name:ident, $type:ty, $func:expr) => {
        #[no_mangle]
        /// # Safety
        ///
        /// * `metadata` must be either:
        ///   - null, indicating contiguous arrays
        ///   - a valid pointer to an array of `2 * num_dims + 1` elements containing:
        ///     * dims[num_dims]: array dimensions
        ///     * strides[num_dims]: strides for array
        ///     * offset: starting offset into the input array
        /// * `input` must be a valid pointer to an array of at least `num_els` elements
        /// * `constant` must be a valid value for the given type
        /// * `output` must be a valid pointer to an array of at least `num_els` elements
        /// * The memory regions of input and output must not overlap
        /// * All array indices calculated from dims and strides must be in bounds
        pub unsafe fn $name(
            num_els: usize,
            num_dims: usize,
            metadata: *const usize,
            input: *const $type,
            constant: $type,
            output: *mut $type,
        ) {
            let dims = if metadata.is_null() {
                None
            } else {
                Some(std::slice::from_raw_parts(metadata, num_dims))
            };

            let strides = if metadata.is_null() {
                None
            } else {
                Some(std::slice::from_raw_parts(metadata.add(num_dims), num_dims))
            };

            let offset = if metadata.is_null() { 0 } else { *metadata.add(2 * num_dims) };

            let is_contiguous = |strides: Option<&[usize]>| {
                if let (Some(dims), Some(strides)) = (dims, strides) {
                    let mut acc = 1;
                    for d in (0..num_dims).rev() {
                        if strides[d] != acc {
                            return false;
                        }
                        acc *= dims[d];
                    }
                }
                true
            };

            let input_slice = std::slice::from_raw_parts(input, num_els + offset);
            let output_slice = std::slice::from_raw_parts_mut(output, num_els);

            let is_cont = is_contiguous(strides);

            output_slice.par_iter_mut().enumerate().for_each(|(i, out_val)| {
                let idx = if !is_cont {
                    let mut tmp_i = i;
                    let mut strided_i = offset;

                    if let (Some(dims), Some(strides)) = (dims, strides) {
                        for d in (0..num_dims).rev() {
                            let i_dim = tmp_i % dims[d];
                            strided_i += i_dim * strides[d];
                            tmp_i /= dims[d];
                        }
                    }

                    strided_i.min(num_els + offset - 1)
                } else {
                    offset + i
                };

                let x = input_slice[idx];
                *out_val = $func(x, constant);
            });
        }
    };
}

// Fused activation backward: grad flows only where the forward input was positive.
macro_rules! relu_backward_op {
    ($name:ident, $type:ty, $zero:expr) => {
        #[no_mangle]
        /// # Safety
        ///
        /// * `metadata` follows the unary kernel layout (dims, strides, offset) for `input`
        /// * `input` must be a valid pointer to an array of at least `num_els` elements
        /// * `grad_output` must be a valid pointer to a contiguous array of `num_els` elements
        /// * `grad_input` must be a valid pointer to an array of `num_els` elements
        /// * The memory regions of the arrays must not overlap
        pub unsafe fn $name(
            num_els: usize,
            num_dims: usize,
            metadata: *const usize,
            input: *const $type,
            grad_output: *const $type,
            grad_input: *mut $type,
        ) {
            let dims = if metadata.is_null() {
                None
            } else {
                Some(std::slice::from_raw_parts(metadata, num_dims))
            };

            let strides = if metadata.is_null() {
                None
            } else {
                Some(std::slice::from_raw_parts(metadata.add(num_dims), num_dims))
            };

            let offset = if metadata.is_null() { 0 } else { *metadata.add(2 * num_dims) };

            let input_slice = std::slice::from_raw_parts(input, num_els + offset);
            let grad_out_slice = std::slice::from_raw_parts(grad_output, num_els);
            let grad_in_slice = std::slice::from_raw_parts_mut(grad_input, num_els);

            grad_in_slice.par_iter_mut().enumerate().for_each(|(i, grad_val)| {
                let idx = if let (Some(dims), Some(strides)) = (dims, strides) {
                    let mut tmp_i = i;
                    let mut strided_i = offset;
                    for d in (0..num_dims).rev() {
                        let i_dim = tmp_i % dims[d];
                        strided_i += i_dim * strides[d];
                        tmp_i /= dims[d];
                    }
                    strided_i.min(num_els + offset - 1)
                } else {
                    offset + i
                };

                *grad_val = if input_slice[idx] > $zero { grad_out_slice[i] } else { $zero };
            });
        }
    };
}

unary_op!(neg_bf16, bf16, |x: bf16| -x);
unary_op!(neg_f16, f16, |x: f16| -x);
unary_op!(neg_f32, f32, |x: f32| -x);
unary_op!(neg_f64, f64, |x: f64| -x);

unary_op!(square_bf16, bf16, |x: bf16| x * x);
unary_op!(square_f16, f16, |x: f16| x * x);
unary_op!(square_f32, f32, |x: f32| x * x);
unary_op!(square_f64, f64, |x: f64| x * x);

unary_op!(relu_bf16, bf16, |x: bf16| if x > bf16::from_f32(0.0) { x } else { bf16::from_f32(0.0) });
unary_op!(relu_f16, f16, |x: f16| if x > f16::from_f32(0.0) { x } else { f16::from_f32(0.0) });
unary_op!(relu_f32, f32, |x: f32| if x > 0.0 { x } else { 0.0 });
unary_op!(relu_f64, f64, |x: f64| if x > 0.0 { x } else { 0.0 });

unary_op!(step_bf16, bf16, |x: bf16| if x > bf16::from_f32(0.0) {
    bf16::from_f32(1.0)
} else {
    bf16::from_f32(0.0)
});
unary_op!(step_f16, f16, |x: f16| if x > f16::from_f32(0.0) {
    f16::from_f32(1.0)
} else {
    f16::from_f32(0.0)
});
unary_op!(step_f32, f32, |x: f32| if x > 0.0 { 1.0 } else { 0.0 });
unary_op!(step_f64, f64, |x: f64| if x > 0.0 { 1.0 } else { 0.0 });

unary_op_with_constant!(add_scalar_bf16, bf16, |x: bf16, c: bf16| x + c);
unary_op_with_constant!(add_scalar_f16, f16, |x: f16, c: f16| x + c);
unary_op_with_constant!(add_scalar_f32, f32, |x: f32, c: f32| x + c);
unary_op_with_constant!(add_scalar_f64, f64, |x: f64, c: f64| x + c);

unary_op_with_constant!(sub_scalar_bf16, bf16, |x: bf16, c: bf16| x - c);
unary_op_with_constant!(sub_scalar_f16, f16, |x: f16, c: f16| x - c);
unary_op_with_constant!(sub_scalar_f32, f32, |x: f32, c: f32| x - c);
unary_op_with_constant!(sub_scalar_f64, f64, |x: f64, c: f64| x - c);

unary_op_with_constant!(mul_scalar_bf16, bf16, |x: bf16, c: bf16| x * c);
unary_op_with_constant!(mul_scalar_f16, f16, |x: f16, c: f16| x * c);
unary_op_with_constant!(mul_scalar_f32, f32, |x: f32, c: f32| x * c);
unary_op_with_constant!(mul_scalar_f64, f64, |x: f64, c: f64| x * c);

unary_op_with_constant!(div_scalar_bf16, bf16, |x: bf16, c: bf16| x / c);
unary_op_with_constant!(div_scalar_f16, f16, |x: f16, c: f16| x / c);
unary_op_with_constant!(div_scalar_f32, f32, |x: f32, c: f32| x / c);
unary_op_with_constant!(div_scalar_f64, f64, |x: f64, c: f64| x / c);

relu_backward_op!(relu_backward_bf16, bf16, bf16::from_f32(0.0));
relu_backward_op!(relu_backward_f16, f16, f16::from_f32(0.0));
relu_backward_op!(relu_backward_f32, f32, 0.0f32);
relu_backward_op!(relu_backward_f64, f64, 0.0f64);
