#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Standalone entry point for the dissident score API server.
//!
//! Reads the pipeline configuration from `DISSIDENT_CONFIG` (or the
//! bundled defaults) and the bind address from `BIND_ADDR`/`PORT`.

use dissident_pipeline::PipelineConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = PipelineConfig::load(None).map_err(std::io::Error::other)?;

    dissident_server::run_server(config).await
}
