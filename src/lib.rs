pub mod error;
pub mod factory;
pub mod options;
pub mod splitter;
pub mod tag;
pub mod types;

pub use error::*;
pub use factory::*;
pub use options::*;
pub use splitter::*;
pub use tag::*;
pub use types::*;
