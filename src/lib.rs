//! Message bridge daemon
//!
//! Exposes a small authenticated HTTP API for sending text messages
//! through a phone-number-addressed network, and replays a file of
//! pre-recorded messages at their scheduled times in the background.
//! Credentials and the schedule are plain JSON files under the bridge
//! directory; actual network delivery is delegated to a local gateway.

pub mod auth;
pub mod validate;
pub mod transport;
pub mod store;
pub mod scheduler;
pub mod server;
pub mod config;
pub mod error;

pub use error::{AuthError, Error, Result, ValidationError};

use auth::AuthGate;
use config::Config;
use store::ScheduleStore;

/// Startup state: everything loaded from disk before serving begins
#[derive(Debug)]
pub struct Bridge {
    pub auth: AuthGate,
    pub schedule: ScheduleStore,
}

/// Load credentials and the schedule. Both files are required; any
/// missing or malformed file aborts startup with the offending path.
pub fn bootstrap(config: &Config) -> Result<Bridge> {
    let credentials = store::load_credentials(&config.credentials_file)?;

    let mut schedule = ScheduleStore::new(config);
    let scheduled = schedule.load()?;
    tracing::info!(scheduled, "startup state loaded");

    Ok(Bridge {
        auth: AuthGate::new(credentials),
        schedule,
    })
}
