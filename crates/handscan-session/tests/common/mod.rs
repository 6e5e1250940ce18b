//! Shared helpers for session integration tests.
//!
//! The background dispatcher handles driver events on its own task, so tests
//! observe its effects by polling with a deadline instead of asserting right
//! after the simulated hardware action.

#![allow(dead_code)]

use std::time::Duration;

use handscan_hardware::mock::{MockReader, MockReaderHandle};
use handscan_session::{InventoryState, Notification, Session};
use tokio::sync::broadcast;

/// Upper bound for any single wait.
pub const DEADLINE: Duration = Duration::from_secs(2);

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// A mock transport with one visible reader, "RFD1" at "AA:BB".
pub fn single_reader() -> (MockReader, MockReaderHandle) {
    let (driver, handle) = MockReader::new();
    handle.add_device("RFD1", "AA:BB");
    (driver, handle)
}

/// Session with the background dispatcher, discovered and connected to RFD1.
pub async fn connected_session(page_size: usize) -> (Session, MockReaderHandle) {
    let (driver, handle) = single_reader();
    let session = Session::builder(driver)
        .with_tag_page_size(page_size)
        .build()
        .expect("valid session config");
    session.discover().await.expect("discover");
    session.connect("RFD1").await.expect("connect");
    (session, handle)
}

/// Wait until a synchronous condition on the mock holds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(DEADLINE, async {
        while !condition() {
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    })
    .await
    .expect("condition not met before deadline");
}

/// Wait until the session reaches `state`.
pub async fn wait_for_state(session: &Session, state: InventoryState) {
    tokio::time::timeout(DEADLINE, async {
        while session.inventory_state().await != state {
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("inventory did not reach {state}"));
}

/// Receive the next notification or fail after the deadline.
pub async fn next_notification(rx: &mut broadcast::Receiver<Notification>) -> Notification {
    tokio::time::timeout(DEADLINE, rx.recv())
        .await
        .expect("no notification before deadline")
        .expect("notification channel closed")
}
