use std::sync::Arc;

use async_std::io;
use async_std::net::{TcpListener, TcpStream, ToSocketAddrs};
use async_std::task;
use futures::StreamExt;
use http_types::{Request, Response};
use tracing::{debug, info, warn};

use crate::core::router::router::Router;
use crate::router::options::Options;

/// Application serves HTTP/1.1 and hands every request to its [`Router`].
#[derive(Default)]
pub struct Application {
    router: Router,
}

impl Application {
    pub fn new() -> Application {
        Application::default()
    }

    pub fn with_options(options: Options) -> Application {
        Application {
            router: Router::with_options(options),
        }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Routes are registered through the returned router before listening.
    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    /// Responds to a single request without going through a socket.
    pub async fn respond(&self, req: Request) -> http_types::Result<Response> {
        self.router.route(req).await
    }

    /// Accepts connections on `addr` until the listener fails.
    pub async fn listen<A: ToSocketAddrs>(self, addr: A) -> io::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "listening");

        let app = Arc::new(self);
        let mut incoming = listener.incoming();
        while let Some(stream) = incoming.next().await {
            let stream = match stream {
                Ok(stream) => stream,
                Err(err) => {
                    warn!(error = %err, "accept failed");
                    continue;
                }
            };

            let app = app.clone();
            task::spawn(async move {
                if let Err(err) = app.serve(stream).await {
                    warn!(error = %err, "connection error");
                }
            });
        }
        Ok(())
    }

    async fn serve(self: Arc<Self>, stream: TcpStream) -> http_types::Result<()> {
        debug!(peer = ?stream.peer_addr().ok(), "connection accepted");
        async_h1::accept(stream, |req| {
            let app = self.clone();
            async move { app.respond(req).await }
        })
        .await
    }
}
