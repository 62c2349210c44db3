// src/utils/env.rs - .env loading
use log::{debug, info};

/// Loads a `.env` file from the working directory or its parents, if present.
/// Variables already set in the process environment win.
pub fn load_env() {
    match dotenv::dotenv() {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) => debug!("No .env file loaded: {}", e),
    }
}
