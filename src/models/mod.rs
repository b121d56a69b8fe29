pub mod event;
pub mod history;
pub mod image;
pub mod request;

pub use event::*;
pub use history::*;
pub use image::*;
pub use request::*;
