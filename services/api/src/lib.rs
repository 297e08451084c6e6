mod cli;
mod infra;
mod routes;
mod server;

use autopilot_studio::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
