//! Server startup utilities.

use tracing::info;

/// Prints the startup banner.
pub fn print_banner() {
    info!(r#"
  _____     _           _
 |_   _| __(_)_ __ ___ | |_   _
   | || '__| | '_ ` _ \| | | | |
   | || |  | | | | | | | | |_| |
   |_||_|  |_|_| |_| |_|_|\__, |
                          |___/
          Salon back office
    "#);
}

/// Prints server startup information.
pub fn print_startup_info(rest_addr: &str) {
    let separator = "=".repeat(60);
    info!("{}", separator);
    info!("REST API:  http://{}/api/v1", rest_addr);
    info!("Health:    http://{}/health", rest_addr);
    info!("Ready:     http://{}/ready", rest_addr);
    info!("{}", separator);
}
