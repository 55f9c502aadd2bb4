use crate::utils::buffer_span;
use half::{bf16, f16};
use rayon::prelude::*;

macro_rules! matmul_op {
    ($name:ident, $type:ty, $up:expr, $down:expr) => {
        #[no_mangle]
        /// # Safety
        ///
        /// * `metadata` must be a valid pointer to an array containing:
        ///   - out_ndim, a_ndim, b_ndim (all equal, at least 2)
        ///   - out_shape[out_ndim], a_shape[a_ndim], b_shape[b_ndim]
        ///   - a_strides[a_ndim], b_strides[b_ndim]
        ///   - a_offset, b_offset
        /// * `a` and `b` must cover every element reachable through their
        ///   shapes/strides from their offsets
        /// * `c` must hold `num_els` elements
        pub unsafe fn $name(
            num_els: usize,
            metadata: *const usize,
            a: *const $type,
            b: *const $type,
            c: *mut $type,
        ) {
            if metadata.is_null() || a.is_null() || b.is_null() || c.is_null() || num_els == 0 {
                return;
            }

            let nd = *metadata;
            let out_shape = std::slice::from_raw_parts(metadata.add(3), nd);
            let a_shape = std::slice::from_raw_parts(metadata.add(3 + nd), nd);
            let b_shape = std::slice::from_raw_parts(metadata.add(3 + 2 * nd), nd);
            let a_strides = std::slice::from_raw_parts(metadata.add(3 + 3 * nd), nd);
            let b_strides = std::slice::from_raw_parts(metadata.add(3 + 4 * nd), nd);
            let a_offset = *metadata.add(3 + 5 * nd);
            let b_offset = *metadata.add(3 + 5 * nd + 1);

            let m = out_shape[nd - 2];
            let n = out_shape[nd - 1];
            let k = a_shape[nd - 1];
            if m == 0 || n == 0 {
                return;
            }

            let a_data = std::slice::from_raw_parts(a, a_offset + buffer_span(nd, a_shape, a_strides));
            let b_data = std::slice::from_raw_parts(b, b_offset + buffer_span(nd, b_shape, b_strides));
            let c_data = std::slice::from_raw_parts_mut(c, num_els);

            let (a_rs, a_cs) = (a_strides[nd - 2], a_strides[nd - 1]);
            let (b_rs, b_cs) = (b_strides[nd - 2], b_strides[nd - 1]);

            c_data.par_chunks_mut(n).enumerate().for_each(|(row_id, row)| {
                let mi = row_id % m;

                // Walk every leading dim so transposed or sliced batch
                // layouts index correctly.
                let mut a_base = a_offset;
                let mut b_base = b_offset;
                let mut rem = row_id / m;
                for d in (0..nd - 2).rev() {
                    let coord = rem % out_shape[d];
                    rem /= out_shape[d];
                    a_base += coord * a_strides[d];
                    b_base += coord * b_strides[d];
                }

                for (ni, cell) in row.iter_mut().enumerate() {
                    let mut acc = 0.0f64;
                    for ki in 0..k {
                        let lhs = ($up)(a_data[a_base + mi * a_rs + ki * a_cs]);
                        let rhs = ($up)(b_data[b_base + ki * b_rs + ni * b_cs]);
                        acc += lhs * rhs;
                    }
                    *cell = ($down)(acc);
                }
            });
        }
    };
}

macro_rules! matmul_backward_op {
    ($name:ident, $type:ty, $up:expr, $down:expr) => {
        #[no_mangle]
        /// # Safety
        ///
        /// * `metadata` has the layout described on the forward kernel
        /// * `a`, `b` and `grad_output` must be contiguous row-major buffers
        ///   holding `num_els_a`, `num_els_b` and batch*m*n elements past
        ///   their offsets
        /// * `grad_a`/`grad_b` may each be null to skip that operand; when
        ///   non-null they must hold `num_els_a`/`num_els_b` elements
        pub unsafe fn $name(
            num_els_a: usize,
            num_els_b: usize,
            metadata: *const usize,
            grad_output: *const $type,
            a: *const $type,
            b: *const $type,
            grad_a: *mut $type,
            grad_b: *mut $type,
        ) {
            if metadata.is_null() || grad_output.is_null() || a.is_null() || b.is_null() {
                return;
            }

            let nd = *metadata;
            let out_shape = std::slice::from_raw_parts(metadata.add(3), nd);
            let a_shape = std::slice::from_raw_parts(metadata.add(3 + nd), nd);
            let a_offset = *metadata.add(3 + 5 * nd);
            let b_offset = *metadata.add(3 + 5 * nd + 1);

            let m = out_shape[nd - 2];
            let n = out_shape[nd - 1];
            let k = a_shape[nd - 1];
            if m == 0 || n == 0 || k == 0 {
                return;
            }
            let batch: usize = out_shape[..nd - 2].iter().product();

            let go = std::slice::from_raw_parts(grad_output, batch * m * n);
            let a_data = std::slice::from_raw_parts(a.add(a_offset), num_els_a);
            let b_data = std::slice::from_raw_parts(b.add(b_offset), num_els_b);

            // dA[b, mi, ki] = sum_ni dC[b, mi, ni] * B[b, ki, ni]
            if !grad_a.is_null() {
                let ga = std::slice::from_raw_parts_mut(grad_a, num_els_a);
                ga.par_chunks_mut(k).enumerate().for_each(|(row_id, row)| {
                    let bi = row_id / m;
                    let go_row = &go[row_id * n..(row_id + 1) * n];
                    let b_block = &b_data[bi * k * n..(bi + 1) * k * n];
                    for (ki, cell) in row.iter_mut().enumerate() {
                        let mut acc = 0.0f64;
                        for ni in 0..n {
                            acc += ($up)(go_row[ni]) * ($up)(b_block[ki * n + ni]);
                        }
                        *cell = ($down)(acc);
                    }
                });
            }

            // dB[b, ki, ni] = sum_mi A[b, mi, ki] * dC[b, mi, ni]
            if !grad_b.is_null() {
                let gb = std::slice::from_raw_parts_mut(grad_b, num_els_b);
                gb.par_chunks_mut(n).enumerate().for_each(|(row_id, row)| {
                    let bi = row_id / k;
                    let ki = row_id % k;
                    let a_block = &a_data[bi * m * k..(bi + 1) * m * k];
                    let go_block = &go[bi * m * n..(bi + 1) * m * n];
                    for (ni, cell) in row.iter_mut().enumerate() {
                        let mut acc = 0.0f64;
                        for mi in 0..m {
                            acc += ($up)(a_block[mi * k + ki]) * ($up)(go_block[mi * n + ni]);
                        }
                        *cell = ($down)(acc);
                    }
                });
            }
        }
    };
}

matmul_op!(matmul_bf16, bf16, |x: bf16| f32::from(x) as f64, |a: f64| bf16::from_f32(a as f32));
matmul_op!(matmul_f16, f16, |x: f16| f32::from(x) as f64, |a: f64| f16::from_f32(a as f32));
matmul_op!(matmul_f32, f32, |x: f32| x as f64, |a: f64| a as f32);
matmul_op!(matmul_f64, f64, |x: f64| x, |a: f64| a);

matmul_backward_op!(matmul_backward_bf16, bf16, |x: bf16| f32::from(x) as f64, |a: f64| bf16::from_f32(a as f32));
matmul_backward_op!(matmul_backward_f16, f16, |x: f16| f32::from(x) as f64, |a: f64| f16::from_f32(a as f32));
matmul_backward_op!(matmul_backward_f32, f32, |x: f32| x as f64, |a: f64| a as f32);
matmul_backward_op!(matmul_backward_f64, f64, |x: f64| x, |a: f64| a);
