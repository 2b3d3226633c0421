mod routes;

use crate::api::handler::PodHandler;
use crate::api::ControllerError;
use std::io;
use std::sync::Arc;
use std::thread;
use tiny_http::{Request, Server as TinyServer};
use tracing::{event, Level};

pub struct Server {
    handler: Arc<PodHandler>,
    port: u16,
    workers: usize,
}

impl Server {
    pub fn new(handler: PodHandler, port: u16, workers: usize) -> Server {
        Server {
            handler: Arc::new(handler),
            port,
            workers,
        }
    }

    /// Blocks until every worker thread stops
    pub fn run(&self) -> Result<(), ControllerError> {
        let host = String::from("0.0.0.0");
        let server = TinyServer::http(format!("{}:{}", host, self.port))
            .map_err(|e| ControllerError::Io(io::Error::new(io::ErrorKind::Other, e.to_string())))?;
        let server = Arc::new(server);

        let mut guards = Vec::with_capacity(self.workers);

        for _ in 0..self.workers.max(1) {
            let server = server.clone();
            let handler = self.handler.clone();

            let guard = thread::spawn(move || {
                let router = routes::Router::new();
                loop {
                    let mut req: Request = match server.recv() {
                        Ok(req) => req,
                        Err(e) => {
                            event!(Level::ERROR, "Could not receive request: {}", e);
                            continue;
                        }
                    };

                    let response = match router.handle(&mut req, &handler) {
                        Some(res) => res,
                        None => {
                            event!(Level::WARN, "Route not found: {} {}", req.method(), req.url());
                            tiny_http::Response::from_string("")
                                .with_status_code(tiny_http::StatusCode::from(404))
                        }
                    };
                    if let Err(e) = req.respond(response) {
                        event!(Level::ERROR, "Could not send response: {}", e);
                    }
                }
            });

            guards.push(guard);
        }
        event!(Level::INFO, "Server running on http://{}:{}", host, self.port);

        for guard in guards {
            if guard.join().is_err() {
                event!(Level::ERROR, "A server worker panicked");
            }
        }
        Ok(())
    }
}
