/// Number of buffer elements spanned by a strided view, measured from its
/// first element. Zero for an empty view.
#[inline]
pub fn buffer_span(num_dims: usize, dims: &[usize], strides: &[usize]) -> usize {
    if dims[..num_dims].contains(&0) {
        return 0;
    }
    let mut span = 1;
    for d in 0..num_dims {
        span += (dims[d] - 1) * strides[d];
    }
    span
}
