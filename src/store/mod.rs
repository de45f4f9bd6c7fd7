pub mod editor;
pub mod http;
pub mod memory;
pub mod tenant_cache;
pub mod traits;

pub use editor::*;
pub use http::*;
pub use memory::*;
pub use tenant_cache::*;
pub use traits::*;
