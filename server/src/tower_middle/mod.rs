/// Tower middleware module
///
/// Layers wrapped around the router before it is handed to hyper.
pub mod tower_cors;

pub use tower_cors::cors_layer;
