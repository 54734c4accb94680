pub mod arc;
pub mod signal;
pub mod strng;

pub use arc::{Atomic, AtomicOption};
pub use strng::Strng;
