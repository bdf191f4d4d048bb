mod handler;
mod pipeline;
mod view;

pub use handler::Handler;
pub use pipeline::Waker;
pub use view::{ScreenSize, ScrollPosition};
