//! A trie based HTTP request router.
//!
//! Patterns are compiled into a [`Trie`] whose segments may be literals or
//! parameters:
//!
//! | Syntax | Description |
//! |--------|------|
//! | `:name` | named parameter |
//! | `:name*` | named with catch-all parameter |
//! | `:name(regexp)` | named with regexp parameter |
//! | `:name+suffix` | named with suffix parameter |
//! | `::name` | not named parameter, it is literal `:name` |
//!
//! ```no_run
//! use http_types::{Response, StatusCode};
//! use wow_router::Context;
//!
//! async fn user(ctx: Context) -> wow_router::Result<Response> {
//!     let mut res = Response::new(StatusCode::Ok);
//!     res.set_body(format!("user {}", ctx.param("id").unwrap_or_default()));
//!     Ok(res)
//! }
//!
//! #[async_std::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut app = wow_router::new();
//!     app.router_mut().get("/users/:id(\\d+)", user)?;
//!     app.listen("127.0.0.1:8080").await?;
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod core;
pub mod error;
pub mod router;
pub mod wow;

pub use crate::context::context::{BoxFut, Context, Handle};
pub use crate::core::router::router::{Param, Params, Resolution, Router};
pub use crate::error::RouteError;
pub use crate::router::options::Options;
pub use crate::router::trie::{Matched, Node, NodeId, Trie};
pub use crate::wow::Application;

pub use http_types::Result;

pub fn new() -> Application {
    Application::new()
}

pub fn default() -> Application {
    Application::new()
}
