pub mod layout;
pub mod render;
pub mod surface;
mod styles;
mod utils;
