//! JSON-RPC API Layer
//!
//! Exposes repository queries and queue statistics as JSON-RPC 2.0 methods.
//! Bound methods are routed through their named queue by the dispatch bridge.

pub mod error;
pub mod handler;
pub mod methods;
pub mod server;
pub mod types;

pub use handler::RpcHandler;
pub use methods::default_bindings;
pub use server::{RpcServer, RpcServerConfig};
