#![deny(missing_docs)]
//! CodeGuard server executable.
//!
//! Exposes the analysis, validation, page-speed and improvement engines over
//! HTTP with JSON payloads.

mod openapi;
mod routes;

#[cfg(not(test))]
use actix_cors::Cors;
#[cfg(not(test))]
use actix_web::{App, HttpResponse, HttpServer, error, http::header, web};
#[cfg(not(test))]
use dotenvy::dotenv;

#[allow(unused_imports)]
use std::str::FromStr;

#[cfg(not(test))]
use crate::routes::{
    ErrorResponse, analyze, compare, health, improve, openapi_json, performance, validate,
};

/// Default JSON body limit: 8 MiB.
#[cfg_attr(test, allow(dead_code))]
const DEFAULT_MAX_PAYLOAD: usize = 8 * 1024 * 1024;

#[cfg(not(test))]
fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let origins = std::env::var("CODEGUARD_UI_ORIGINS")
        .unwrap_or_else(|_| "http://127.0.0.1:4200,http://localhost:4200".to_string());
    let allowed_origins: Vec<String> = origins
        .split(',')
        .map(|value| value.trim())
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect();

    let listen_addr = std::env::var("CODEGUARD_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let listen_port =
        u16::from_str(&std::env::var("CODEGUARD_PORT").unwrap_or_else(|_| "8080".to_string()))
            .map_err(|err| std::io::Error::other(format!("CODEGUARD_PORT must be a u16: {err}")))?;
    let max_payload = match std::env::var("CODEGUARD_MAX_PAYLOAD") {
        Ok(value) => usize::from_str(value.trim()).map_err(|err| {
            std::io::Error::other(format!("CODEGUARD_MAX_PAYLOAD must be a byte count: {err}"))
        })?,
        Err(_) => DEFAULT_MAX_PAYLOAD,
    };
    log::info!("listening on {listen_addr}:{listen_port}, payload limit {max_payload} bytes");

    actix_web::rt::System::new().block_on(async move {
        HttpServer::new(move || {
            let mut cors = Cors::default()
                .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                .allowed_headers(vec![header::CONTENT_TYPE])
                .max_age(3600);
            for origin in &allowed_origins {
                cors = cors.allowed_origin(origin);
            }
            let json_config = web::JsonConfig::default()
                .limit(max_payload)
                .error_handler(|err, _req| {
                    let message = err.to_string();
                    error::InternalError::from_response(
                        err,
                        HttpResponse::BadRequest().json(ErrorResponse { message }),
                    )
                    .into()
                });
            App::new()
                .wrap(actix_web::middleware::Logger::default())
                .wrap(cors)
                .app_data(json_config)
                .service(health)
                .service(analyze)
                .service(validate)
                .service(performance)
                .service(improve)
                .service(compare)
                .service(openapi_json)
        })
        .bind((listen_addr, listen_port))?
        .run()
        .await
    })
}

#[cfg(test)]
fn main() {}
