pub mod be;
pub mod buffer;
pub mod device;
pub mod dtype;
pub mod error;
pub mod layout;
pub mod scalar;

pub use gradix_cpu as cpu;
