use std::ops::Index;

use http_types::{Request, Response, StatusCode};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use tracing::{debug, trace};

use crate::context::context::{Context, Handle};
use crate::error::RouteError;
use crate::router::options::Options;
use crate::router::trie::Trie;

// Characters re-escaped when a decoded path goes back into a `Location`.
const PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub key: String,
    pub value: String,
}

impl Param {
    pub fn new(key: &str, value: &str) -> Param {
        Param {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(pub Vec<Param>);

impl Params {
    /// Returns the value of the Param which key matches the given name.
    pub fn by_name(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|param| param.key == name)
            .map(|param| param.value.as_str())
    }

    /// Empty `Params`
    pub fn new() -> Params {
        Params(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.0.iter()
    }

    /// Sets `key` to `value`, overwriting an earlier capture of the same name.
    pub fn set(&mut self, key: &str, value: &str) {
        match self.0.iter_mut().find(|param| param.key == key) {
            Some(param) => param.value = value.to_string(),
            None => self.0.push(Param::new(key, value)),
        }
    }
}

impl Index<usize> for Params {
    type Output = str;

    fn index(&self, i: usize) -> &Self::Output {
        &(self.0)[i].value
    }
}

/// Outcome of routing one request.
pub enum Resolution<'a> {
    /// A handler is registered for the request method.
    Dispatch { handler: &'a dyn Handle, params: Params },

    /// Nothing matched, or the method is not registered, and an
    /// `otherwise` handler is configured.
    Fallback { handler: &'a dyn Handle, params: Params },

    /// `OPTIONS` without a dedicated handler: 204 with `Allow`.
    Options { allow: &'a str },

    /// 405 with `Allow`.
    MethodNotAllowed { allow: &'a str },

    /// 301 for `GET`, 307 otherwise.
    Redirect { location: String, status: StatusCode },

    /// 501, the path matched nothing.
    NotImplemented,
}

/// Router dispatches requests to handlers by method and path.
pub struct Router {
    trie: Trie<Box<dyn Handle>>,

    // Configurable handler which is called when no route matches, or the
    // route has no handler for the request method.
    otherwise: Option<Box<dyn Handle>>,
}

impl Default for Router {
    fn default() -> Router {
        Router::new()
    }
}

impl Router {
    /// New returns a new initialized Router.
    /// Path auto-correction, including trailing slashes, is enabled by default.
    pub fn new() -> Router {
        Router::with_options(Options::default())
    }

    pub fn with_options(options: Options) -> Router {
        Router {
            trie: Trie::with_options(options),
            otherwise: None,
        }
    }

    pub fn trie(&self) -> &Trie<Box<dyn Handle>> {
        &self.trie
    }

    /// get is a shortcut for router.handle("GET", pattern, handler)
    pub fn get(&mut self, pattern: &str, handler: impl Handle) -> Result<&mut Self, RouteError> {
        self.handle("GET", pattern, handler)
    }

    /// head is a shortcut for router.handle("HEAD", pattern, handler)
    pub fn head(&mut self, pattern: &str, handler: impl Handle) -> Result<&mut Self, RouteError> {
        self.handle("HEAD", pattern, handler)
    }

    /// options is a shortcut for router.handle("OPTIONS", pattern, handler)
    pub fn options(
        &mut self,
        pattern: &str,
        handler: impl Handle,
    ) -> Result<&mut Self, RouteError> {
        self.handle("OPTIONS", pattern, handler)
    }

    /// post is a shortcut for router.handle("POST", pattern, handler)
    pub fn post(&mut self, pattern: &str, handler: impl Handle) -> Result<&mut Self, RouteError> {
        self.handle("POST", pattern, handler)
    }

    /// put is a shortcut for router.handle("PUT", pattern, handler)
    pub fn put(&mut self, pattern: &str, handler: impl Handle) -> Result<&mut Self, RouteError> {
        self.handle("PUT", pattern, handler)
    }

    /// patch is a shortcut for router.handle("PATCH", pattern, handler)
    pub fn patch(&mut self, pattern: &str, handler: impl Handle) -> Result<&mut Self, RouteError> {
        self.handle("PATCH", pattern, handler)
    }

    /// delete is a shortcut for router.handle("DELETE", pattern, handler)
    pub fn delete(
        &mut self,
        pattern: &str,
        handler: impl Handle,
    ) -> Result<&mut Self, RouteError> {
        self.handle("DELETE", pattern, handler)
    }

    /// Registers the handler run when no other handler matches.
    pub fn otherwise(&mut self, handler: impl Handle) -> &mut Self {
        self.otherwise = Some(Box::new(handler));
        self
    }

    /// Handle registers a new request handler with the given pattern and method.
    ///
    /// For GET, POST, PUT, PATCH and DELETE requests the respective shortcut
    /// functions can be used.
    ///
    /// This function is intended for bulk loading and to allow the usage of less
    /// frequently used, non-standardized or custom methods (e.g. for internal
    /// communication with a proxy).
    pub fn handle(
        &mut self,
        method: &str,
        pattern: &str,
        handler: impl Handle,
    ) -> Result<&mut Self, RouteError> {
        if method.is_empty() {
            return Err(RouteError::InvalidMethod(method.to_string()));
        }

        let method = method.to_uppercase();
        let id = self.trie.define(pattern)?;
        self.trie.node_mut(id).handle(&method, Box::new(handler))?;
        debug!(method = %method, pattern, "route registered");
        Ok(self)
    }

    /// Resolves a method and path to the action the router takes.
    ///
    /// # Panics
    ///
    /// Panics if `path` does not begin with `/`.
    pub fn resolve(&self, method: &str, path: &str) -> Resolution<'_> {
        let matched = self.trie.matches(path);

        let node = match matched.node {
            Some(node) => node,
            None => {
                if let Some(location) = matched.redirect() {
                    let status = if method == "GET" {
                        StatusCode::MovedPermanently
                    } else {
                        StatusCode::TemporaryRedirect
                    };
                    return Resolution::Redirect {
                        location: location.to_string(),
                        status,
                    };
                }
                return match &self.otherwise {
                    Some(handler) => Resolution::Fallback {
                        handler: &**handler,
                        params: matched.params,
                    },
                    None => Resolution::NotImplemented,
                };
            }
        };

        if let Some(handler) = node.handler(method) {
            return Resolution::Dispatch {
                handler: &**handler,
                params: matched.params,
            };
        }
        if method == "OPTIONS" {
            return Resolution::Options { allow: node.allow() };
        }
        match &self.otherwise {
            Some(handler) => Resolution::Fallback {
                handler: &**handler,
                params: matched.params,
            },
            None => Resolution::MethodNotAllowed { allow: node.allow() },
        }
    }

    /// Routes a request and produces its response.
    ///
    /// Matching runs on the percent-decoded path, so patterns and captured
    /// params are plain text.
    pub async fn route(&self, req: Request) -> http_types::Result<Response> {
        let method = req.method().to_string();
        let path = percent_decode_str(req.url().path())
            .decode_utf8_lossy()
            .into_owned();

        match self.resolve(&method, &path) {
            Resolution::Dispatch { handler, params } | Resolution::Fallback { handler, params } => {
                handler.handle(Context::new(req, params)).await
            }
            Resolution::Options { allow } => {
                trace!(%path, allow, "options");
                let mut res = Response::new(StatusCode::NoContent);
                res.insert_header("Allow", allow);
                Ok(res)
            }
            Resolution::MethodNotAllowed { allow } => {
                trace!(%method, %path, "method not allowed");
                let mut res = Response::new(StatusCode::MethodNotAllowed);
                res.insert_header("Allow", allow);
                res.set_body(format!("\"{}\" not allowed in \"{}\"", method, path));
                Ok(res)
            }
            Resolution::Redirect { location, status } => {
                let mut location = utf8_percent_encode(&location, PATH).to_string();
                if let Some(query) = req.url().query() {
                    location.push('?');
                    location.push_str(query);
                }
                trace!(%path, %location, "redirect");
                let mut res = Response::new(status);
                res.insert_header("Location", location);
                Ok(res)
            }
            Resolution::NotImplemented => {
                trace!(%path, "not implemented");
                let mut res = Response::new(StatusCode::NotImplemented);
                res.set_body(format!("\"{}\" not implemented", path));
                Ok(res)
            }
        }
    }
}
