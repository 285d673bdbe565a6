//! Process-wide log output

use tracing::Level;

/// Install a `tracing-subscriber` fmt subscriber at `level`
///
/// Returns false when a global subscriber was already installed (by an
/// earlier call or by the host application); that subscriber stays.
pub fn init(level: Level) -> bool {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init()
        .is_ok()
}
