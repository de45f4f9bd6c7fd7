pub mod blog;
pub mod color;
pub mod common;
pub mod render_data;
pub mod section;
pub mod tenant;

pub use blog::*;
pub use color::*;
pub use common::*;
pub use render_data::*;
pub use section::*;
pub use tenant::*;
