use std::path::Path;
use std::process::ExitCode;

use gpgpu_flow::source::DEFAULT_MODEL_PATH;
use gpgpu_flow::{ParticleSource, Simulation};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let source = if Path::new(DEFAULT_MODEL_PATH).exists() {
        ParticleSource::model(DEFAULT_MODEL_PATH)
    } else {
        log::info!("{} not found, using the procedural sphere", DEFAULT_MODEL_PATH);
        ParticleSource::sphere()
    };

    match Simulation::new().with_source(source).run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
