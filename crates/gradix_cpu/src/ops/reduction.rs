use crate::utils::buffer_span;
use half::{bf16, f16};
use rayon::prelude::*;

macro_rules! sum_over_dims_op {
    ($name:ident, $type:ty, $up:expr, $down:expr) => {
        #[no_mangle]
        /// # Safety
        ///
        /// * `metadata` must be a valid pointer to an array containing:
        ///   - dims[num_dims]: input dimensions
        ///   - strides[num_dims]: input strides
        ///   - red_dims[num_red_dims]: indices of the dimensions to sum over
        ///   - offset: starting offset into the input array
        /// * `inp` must cover every element reachable through `dims`/`strides`
        ///   from `offset`
        /// * `out` must hold one element per combination of the kept dimensions
        pub unsafe fn $name(
            num_els: usize,
            num_dims: usize,
            num_red_dims: usize,
            metadata: *const usize,
            inp: *const $type,
            out: *mut $type,
        ) {
            if metadata.is_null() || inp.is_null() || out.is_null() || num_els == 0 {
                return;
            }

            let dims = std::slice::from_raw_parts(metadata, num_dims);
            let strides = std::slice::from_raw_parts(metadata.add(num_dims), num_dims);
            let red_dims = std::slice::from_raw_parts(metadata.add(2 * num_dims), num_red_dims);
            let offset = *metadata.add(2 * num_dims + num_red_dims);

            let mut is_reduced = vec![false; num_dims];
            for &d in red_dims {
                is_reduced[d] = true;
            }
            let kept_dims: Vec<usize> = (0..num_dims).filter(|d| !is_reduced[*d]).collect();

            let out_size: usize = kept_dims.iter().map(|&d| dims[d]).product();
            let red_size: usize = red_dims.iter().map(|&d| dims[d]).product();
            if out_size == 0 || red_size == 0 {
                return;
            }

            let input = std::slice::from_raw_parts(inp, offset + buffer_span(num_dims, dims, strides));
            let output = std::slice::from_raw_parts_mut(out, out_size);

            // Each output cell gathers its own reduction block, so no cell is
            // written from two threads.
            output.par_iter_mut().enumerate().for_each(|(cell_idx, cell)| {
                let mut base = offset;
                let mut rem = cell_idx;
                for &d in kept_dims.iter().rev() {
                    base += (rem % dims[d]) * strides[d];
                    rem /= dims[d];
                }

                let mut acc = 0.0f64;
                for block_idx in 0..red_size {
                    let mut pos = base;
                    let mut rem = block_idx;
                    for &d in red_dims.iter().rev() {
                        pos += (rem % dims[d]) * strides[d];
                        rem /= dims[d];
                    }
                    acc += ($up)(input[pos]);
                }

                *cell = ($down)(acc);
            });
        }
    };
}

macro_rules! sum_to_shape_op {
    ($name:ident, $type:ty, $up:expr, $down:expr) => {
        #[no_mangle]
        /// # Safety
        ///
        /// * `metadata` must be a valid pointer to an array containing:
        ///   - dims[num_dims]: input dimensions
        ///   - strides[num_dims]: input strides
        ///   - out_dims[num_dims]: output dimensions; each input dimension
        ///     must be a multiple of the matching output dimension
        ///   - offset: starting offset into the input array
        /// * `inp` must cover every element reachable through `dims`/`strides`
        ///   from `offset`
        /// * `out` must hold `product(out_dims)` elements
        pub unsafe fn $name(
            num_els: usize,
            num_dims: usize,
            metadata: *const usize,
            inp: *const $type,
            out: *mut $type,
        ) {
            if metadata.is_null() || inp.is_null() || out.is_null() || num_els == 0 {
                return;
            }

            let dims = std::slice::from_raw_parts(metadata, num_dims);
            let strides = std::slice::from_raw_parts(metadata.add(num_dims), num_dims);
            let out_dims = std::slice::from_raw_parts(metadata.add(2 * num_dims), num_dims);
            let offset = *metadata.add(3 * num_dims);

            // How many input cells fold into one output cell along each dimension
            let fold: Vec<usize> = (0..num_dims).map(|d| dims[d] / out_dims[d]).collect();
            let block_size: usize = fold.iter().product();

            let out_size: usize = out_dims.iter().product();
            if out_size == 0 || block_size == 0 {
                return;
            }

            let input = std::slice::from_raw_parts(inp, offset + buffer_span(num_dims, dims, strides));
            let output = std::slice::from_raw_parts_mut(out, out_size);

            output.par_iter_mut().enumerate().for_each(|(cell_idx, cell)| {
                let mut out_coords = vec![0; num_dims];
                let mut rem = cell_idx;
                for d in (0..num_dims).rev() {
                    out_coords[d] = rem % out_dims[d];
                    rem /= out_dims[d];
                }

                let mut acc = 0.0f64;
                for block_idx in 0..block_size {
                    let mut pos = offset;
                    let mut rem = block_idx;
                    for d in (0..num_dims).rev() {
                        let within = rem % fold[d];
                        rem /= fold[d];
                        pos += (out_coords[d] * fold[d] + within) * strides[d];
                    }
                    acc += ($up)(input[pos]);
                }

                *cell = ($down)(acc);
            });
        }
    };
}

sum_over_dims_op!(sum_bf16, bf16, |x: bf16| f32::from(x) as f64, |a: f64| bf16::from_f32(a as f32));
sum_over_dims_op!(sum_f16, f16, |x: f16| f32::from(x) as f64, |a: f64| f16::from_f32(a as f32));
sum_over_dims_op!(sum_f32, f32, |x: f32| x as f64, |a: f64| a as f32);
sum_over_dims_op!(sum_f64, f64, |x: f64| x, |a: f64| a);

sum_to_shape_op!(sum_to_shape_bf16, bf16, |x: bf16| f32::from(x) as f64, |a: f64| bf16::from_f32(a as f32));
sum_to_shape_op!(sum_to_shape_f16, f16, |x: f16| f32::from(x) as f64, |a: f64| f16::from_f32(a as f32));
sum_to_shape_op!(sum_to_shape_f32, f32, |x: f32| x as f64, |a: f64| a as f32);
sum_to_shape_op!(sum_to_shape_f64, f64, |x: f64| x, |a: f64| a);
