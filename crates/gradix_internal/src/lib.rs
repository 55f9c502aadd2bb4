pub mod prelude;

pub use gradix_core as core;
pub use gradix_tensor as tensor;

pub use gradix_core::dtype::{bf16, bfloat16, f16, float16, float32, float64, half};
