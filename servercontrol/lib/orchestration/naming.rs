use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

use crate::{ServerControlError, ServerControlResult};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The last timestamp handed out, so names stay unique within the process.
static LAST_STAMP: AtomicU64 = AtomicU64::new(0);

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Generates `prefix` followed by the current time in microseconds since the Unix epoch.
///
/// Two calls in the same microsecond get consecutive stamps.
pub fn generate_instance_name(prefix: &str) -> ServerControlResult<String> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| ServerControlError::NameGeneration(e.to_string()))?;
    let now = u64::try_from(now.as_micros())
        .map_err(|e| ServerControlError::NameGeneration(e.to_string()))?;

    let previous = LAST_STAMP
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or_else(|last| last);
    let stamp = now.max(previous + 1);

    Ok(format!("{prefix}{stamp}"))
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
