pub mod forecast;
pub mod sample;

pub use forecast::*;
pub use sample::*;
