pub mod block;
pub mod core;
pub mod error;
pub mod stream;


pub use self::block::*;
pub use self::core::*;
pub use self::error::*;
pub use self::stream::*;
