mod aggregate;
mod future;
mod pool;

pub use future::*;
pub use pool::*;
