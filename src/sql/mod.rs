//! Safe SQL builder: fixed identifiers from the services, values as parameters.

mod builder;
pub mod params;
pub use builder::*;
pub use params::*;
