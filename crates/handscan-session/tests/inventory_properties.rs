//! Property-based tests for the inventory controller.
//!
//! For any trigger sequence the controller state follows the trigger: it ends
//! SCANNING exactly when the last effective event was a press, and start and
//! stop commands always alternate.

use handscan_hardware::TriggerEvent;
use handscan_session::{InventoryCommand, InventoryController, InventoryState};
use proptest::prelude::*;

/// Strategy for generating trigger events.
fn trigger_event() -> impl Strategy<Value = TriggerEvent> {
    prop_oneof![Just(TriggerEvent::Pressed), Just(TriggerEvent::Released)]
}

proptest! {
    /// Property: the final state is SCANNING iff the last event was a press.
    ///
    /// Repeated presses while scanning and releases while idle are no-ops, so
    /// only the last event decides the state.
    #[test]
    fn prop_final_state_follows_last_event(
        events in prop::collection::vec(trigger_event(), 0..64)
    ) {
        let mut controller = InventoryController::new();
        for event in &events {
            controller.on_trigger(*event);
        }

        let expected = match events.last() {
            Some(TriggerEvent::Pressed) => InventoryState::Scanning,
            _ => InventoryState::Idle,
        };
        prop_assert_eq!(controller.current_state(), expected);
    }

    /// Property: commands alternate start/stop, beginning with start.
    #[test]
    fn prop_commands_alternate(
        events in prop::collection::vec(trigger_event(), 0..64)
    ) {
        let mut controller = InventoryController::new();
        let commands: Vec<_> = events
            .iter()
            .filter_map(|event| controller.on_trigger(*event))
            .collect();

        for (i, command) in commands.iter().enumerate() {
            let expected = if i % 2 == 0 {
                InventoryCommand::Start
            } else {
                InventoryCommand::Stop
            };
            prop_assert_eq!(*command, expected);
        }

        let outstanding = controller.starts() - controller.stops();
        prop_assert!(outstanding <= 1);
        prop_assert_eq!(outstanding == 1, controller.is_scanning());
    }

    /// Property: a reset always leaves the controller idle without counting a stop.
    #[test]
    fn prop_reset_returns_to_idle(
        events in prop::collection::vec(trigger_event(), 0..32)
    ) {
        let mut controller = InventoryController::new();
        for event in &events {
            controller.on_trigger(*event);
        }
        let stops_before = controller.stops();

        let transition = controller.reset();

        prop_assert_eq!(controller.current_state(), InventoryState::Idle);
        prop_assert_eq!(controller.stops(), stops_before);
        prop_assert_eq!(transition.is_some(), events.last() == Some(&TriggerEvent::Pressed));
    }
}
