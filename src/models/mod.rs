pub mod common;
pub mod media;
pub mod mode;
pub mod operation;
pub mod request;

pub use common::*;
pub use media::*;
pub use mode::*;
pub use operation::*;
pub use request::*;
