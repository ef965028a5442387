//! Safe SQL builder: identifiers from entity definitions only, values as parameters.

mod builder;
mod dialect;
pub mod params;
pub mod placeholder;
pub use builder::*;
pub use dialect::Dialect;
pub use params::*;
