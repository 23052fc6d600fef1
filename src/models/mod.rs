pub mod account;
pub mod catalog;
pub mod image;

pub use account::*;
pub use catalog::*;
pub use image::*;
