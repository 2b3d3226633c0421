use crate::api::handler::PodHandler;
use crate::api::types::pod::Response;
use crate::api::ControllerError;
use std::io;
use tracing::{event, Level};

mod pod;

pub type HttpResult<T = io::Cursor<Vec<u8>>> = Result<tiny_http::Response<T>, ControllerError>;

type Handler =
    fn(&mut tiny_http::Request, &route_recognizer::Params, &PodHandler) -> HttpResult;

pub struct Router {
    routes: Vec<(tiny_http::Method, route_recognizer::Router<Handler>)>,
}

/// Serialize a payload as a JSON response with the given status
pub fn json_response<T: serde::Serialize>(payload: &T, status: u16) -> HttpResult {
    let body = serde_json::to_string(payload)?;
    Ok(with_json_header(tiny_http::Response::from_string(body))
        .with_status_code(tiny_http::StatusCode::from(status)))
}

fn with_json_header(
    response: tiny_http::Response<io::Cursor<Vec<u8>>>,
) -> tiny_http::Response<io::Cursor<Vec<u8>>> {
    match tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
        Ok(header) => response.with_header(header),
        Err(_) => response,
    }
}

impl Router {
    pub fn new() -> Router {
        let mut get = route_recognizer::Router::<Handler>::new();
        let mut post = route_recognizer::Router::<Handler>::new();

        let base_path = "/api/v0";

        // GET
        get.add(&format!("{}/pods.list", base_path), pod::list);
        get.add(&format!("{}/pods.diverged", base_path), pod::diverged);
        // POST
        post.add(&format!("{}/pods.get", base_path), pod::get);
        post.add(&format!("{}/pods.create", base_path), pod::create);
        post.add(&format!("{}/pods.update", base_path), pod::update);
        post.add(&format!("{}/pods.delete", base_path), pod::delete);

        Router {
            routes: vec![
                (tiny_http::Method::Get, get),
                (tiny_http::Method::Post, post),
            ],
        }
    }

    pub fn handle(
        &self,
        request: &mut tiny_http::Request,
        handler: &PodHandler,
    ) -> Option<tiny_http::Response<io::Cursor<Vec<u8>>>> {
        let (_, routes) = self
            .routes
            .iter()
            .find(|(method, _)| method == request.method())?;
        let matched = routes.recognize(request.url()).ok()?;

        Some(
            (matched.handler())(request, matched.params(), handler).unwrap_or_else(|error| {
                event!(Level::ERROR, "{}", error);
                let status = error.status_code();
                let body = serde_json::to_string(&Response::new(error.to_string()))
                    .unwrap_or_else(|_| error.to_string());
                with_json_header(tiny_http::Response::from_string(body))
                    .with_status_code(tiny_http::StatusCode::from(status))
            }),
        )
    }
}
