//! Write throttling around vendor endpoints that race on concurrent writes.
//!
//! Waiting-room writes are serialized process wide with a short pause.
//! Maintenance, maintenance-template and tag WAF rule writes settle for
//! 200 ms first.

use std::sync::LazyLock;
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};

pub const WAITING_ROOM_PAUSE: Duration = Duration::from_millis(10);
pub const SETTLE_DELAY: Duration = Duration::from_millis(200);

static WAITING_ROOM_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

/// Hold the waiting-room lock for the duration of one create/update.
pub async fn waiting_room_guard() -> MutexGuard<'static, ()> {
    let guard = WAITING_ROOM_LOCK.lock().await;
    tokio::time::sleep(WAITING_ROOM_PAUSE).await;
    guard
}

/// Pause before a write to an endpoint that needs to settle.
pub async fn settle() {
    tokio::time::sleep(SETTLE_DELAY).await;
}
