pub mod color;
pub mod defaults;
pub mod merge;
pub mod render;
pub mod resolve;

pub use color::*;
pub use defaults::*;
pub use merge::*;
pub use render::*;
pub use resolve::*;
