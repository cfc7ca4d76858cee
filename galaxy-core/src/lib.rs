// Host boundary for the Galaxy rendering layer.
//
// Galaxy does not route or parse HTTP itself. These types are the surface a
// host server hands to it (a request with its path and pre-computed values)
// and gets back from it (a complete response), plus the two capabilities a
// host may expose: request handlers and a view engine.

pub mod error;
pub mod http;
pub mod hydration;
pub mod traits;
pub mod view;

pub use error::*;
pub use self::http::*;
pub use hydration::{CONTAINER_ID, STATE_GLOBAL, hydration_script, serialize_state};
pub use traits::*;
pub use view::*;
