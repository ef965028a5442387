pub mod entity;
pub mod field;
pub mod registry;
pub mod validator;

pub use entity::*;
pub use field::*;
pub use registry::*;
pub use validator::*;
