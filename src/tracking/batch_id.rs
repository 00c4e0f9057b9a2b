//! Batch id extraction from acknowledgement messages
//!
//! The backend's synchronous acknowledgement does not always carry a
//! structured batch identifier; parsing the human-readable message is a
//! legacy-compatibility shim. It lives behind this module so a structured
//! field can replace it without touching the rest of the core.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;

static BATCH_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"kb_batch_\d+").expect("batch token pattern"));

/// Resolve a batch id from a free-text acknowledgement message.
///
/// Falls back to a synthetic `kb_batch_<unix-seconds>` id so polling can
/// still begin deterministically when no token is embedded.
pub fn resolve(message: &str) -> String {
    if let Some(found) = BATCH_TOKEN.find(message) {
        return found.as_str().to_string();
    }

    let synthetic = format!("kb_batch_{}", Utc::now().timestamp());
    tracing::warn!(
        "No batch token in acknowledgement message, synthesized {}",
        synthetic
    );
    synthetic
}
