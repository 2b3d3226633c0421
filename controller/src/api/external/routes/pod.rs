use crate::api::external::routes::{json_response, HttpResult};
use crate::api::handler::PodHandler;
use crate::api::types::pod::{PodId, PodInfo};
use crate::api::ControllerError;
use serde::de::DeserializeOwned;
use std::io::Read;

fn read_body<T: DeserializeOwned>(req: &mut tiny_http::Request) -> Result<T, ControllerError> {
    let mut content = String::new();
    req.as_reader().read_to_string(&mut content)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn list(
    _: &mut tiny_http::Request,
    _: &route_recognizer::Params,
    handler: &PodHandler,
) -> HttpResult {
    json_response(&handler.find_all_pods()?, 200)
}

pub fn diverged(
    _: &mut tiny_http::Request,
    _: &route_recognizer::Params,
    handler: &PodHandler,
) -> HttpResult {
    json_response(&handler.find_diverged_pods()?, 200)
}

pub fn get(
    req: &mut tiny_http::Request,
    _: &route_recognizer::Params,
    handler: &PodHandler,
) -> HttpResult {
    let id: PodId = read_body(req)?;
    json_response(&handler.find_pod_by_id(id)?, 200)
}

pub fn create(
    req: &mut tiny_http::Request,
    _: &route_recognizer::Params,
    handler: &PodHandler,
) -> HttpResult {
    let info: PodInfo = read_body(req)?;
    json_response(&handler.add_pod(info)?, 201)
}

pub fn update(
    req: &mut tiny_http::Request,
    _: &route_recognizer::Params,
    handler: &PodHandler,
) -> HttpResult {
    let info: PodInfo = read_body(req)?;
    json_response(&handler.update_pod(info)?, 200)
}

pub fn delete(
    req: &mut tiny_http::Request,
    _: &route_recognizer::Params,
    handler: &PodHandler,
) -> HttpResult {
    let id: PodId = read_body(req)?;
    json_response(&handler.delete_pod(id)?, 200)
}
