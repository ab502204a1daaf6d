use std::future::Future;
use std::pin::Pin;

use http_types::{Request, Response, Result};

use crate::core::router::router::Params;

pub type BoxFut = Pin<Box<dyn Future<Output = Result<Response>> + Send + 'static>>;

/// A request handler mounted on the router.
pub trait Handle: Send + Sync + 'static {
    fn handle(&self, ctx: Context) -> BoxFut;
}

impl<F, Fut> Handle for F
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    fn handle(&self, ctx: Context) -> BoxFut {
        Box::pin((*self)(ctx))
    }
}

/// The request being handled together with the parameters captured from
/// its path.
pub struct Context {
    request: Request,
    params: Params,
}

impl Context {
    pub fn new(request: Request, params: Params) -> Context {
        Context { request, params }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Shortcut for `ctx.params().by_name(name)`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.by_name(name)
    }

    pub fn into_request(self) -> Request {
        self.request
    }
}
