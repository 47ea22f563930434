//! Property-based tests for the connection manager.
//!
//! Arbitrary interleavings of joins, sends, closes and transport events must
//! never leave more than one live connection, never deliver for a superseded
//! connection, and never report anything after `Closed`.

use std::{
    collections::HashSet,
    time::{Duration, Instant},
};

use parley_client::{
    CloseReason, ConnectionAction, ConnectionId, ConnectionManager, Credential, Endpoint,
    RoomAddress, TransportEvent, Variant,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Step {
    Open(String),
    Send(u64, String),
    Close(u64),
    Opened(u64),
    Frame(u64, String),
    PeerClose(u64, u16),
    Fail(u64),
    Tick(u64),
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        2 => "[a-z]{1,6}".prop_map(Step::Open),
        3 => (1u64..8, "[ a-z]{0,8}").prop_map(|(id, text)| Step::Send(id, text)),
        1 => (1u64..8).prop_map(Step::Close),
        3 => (1u64..8).prop_map(Step::Opened),
        4 => (1u64..8, "[a-z]{1,8}").prop_map(|(id, text)| Step::Frame(id, text)),
        1 => (1u64..8, prop::sample::select(vec![1000u16, 1001, 1008, 1011]))
            .prop_map(|(id, code)| Step::PeerClose(id, code)),
        1 => (1u64..8).prop_map(Step::Fail),
        1 => (0u64..30).prop_map(Step::Tick),
    ]
}

fn manager() -> ConnectionManager {
    ConnectionManager::new(Endpoint::parse("ws://relay", Variant::RoomScoped).unwrap())
        .with_connect_timeout(Some(Duration::from_secs(10)))
}

proptest! {
    #[test]
    fn prop_lifecycle_invariants(steps in prop::collection::vec(step_strategy(), 0..60)) {
        let mut manager = manager();
        let credential = Credential::new("T1", "alice");
        let start = Instant::now();
        let mut now = start;
        let mut closed: HashSet<ConnectionId> = HashSet::new();

        for step in steps {
            let actions = match step {
                Step::Open(room) => {
                    manager.open(RoomAddress::new(room, "alice"), Some(&credential), now).1
                },
                Step::Send(id, text) => {
                    manager.send(ConnectionId::new(id), &text).unwrap_or_default()
                },
                Step::Close(id) => manager.close(ConnectionId::new(id)),
                Step::Opened(id) => manager.handle(TransportEvent::opened(ConnectionId::new(id))),
                Step::Frame(id, text) => {
                    manager.handle(TransportEvent::frame(ConnectionId::new(id), text))
                },
                Step::PeerClose(id, code) => manager.handle(TransportEvent::closed(
                    ConnectionId::new(id),
                    Some(CloseReason::new(code, "")),
                )),
                Step::Fail(id) => {
                    manager.handle(TransportEvent::failed(ConnectionId::new(id), "boom"))
                },
                Step::Tick(secs) => {
                    now += Duration::from_secs(secs);
                    manager.tick(now)
                },
            };

            prop_assert!(manager.live_count() <= 1);

            let current = manager.current().map(|c| c.id());
            for (i, action) in actions.iter().enumerate() {
                prop_assert!(
                    !closed.contains(&action.id()),
                    "action after close: {:?}", action
                );

                match action {
                    ConnectionAction::Deliver { id, .. } | ConnectionAction::Opened { id } => {
                        prop_assert_eq!(Some(*id), current);
                    },
                    ConnectionAction::Failed { id, .. } => {
                        let closes_next = actions[i + 1..].first().is_some_and(|next| {
                            matches!(next, ConnectionAction::Closed { id: c, .. } if c == id)
                        });
                        prop_assert!(closes_next, "Failed not followed by Closed");
                    },
                    ConnectionAction::Transmit { text, .. } => {
                        prop_assert!(!text.trim().is_empty());
                    },
                    _ => {},
                }

                if let ConnectionAction::Closed { id, .. } = action {
                    closed.insert(*id);
                }
            }
        }
    }

    #[test]
    fn prop_frames_delivered_in_order(frames in prop::collection::vec("[a-z]{1,10}", 0..40)) {
        let mut manager = manager();
        let (id, _) = manager.open(RoomAddress::new("lobby", "alice"), None, Instant::now());
        let _ = manager.handle(TransportEvent::opened(id));

        let mut delivered = Vec::new();
        for frame in &frames {
            for action in manager.handle(TransportEvent::frame(id, frame.clone())) {
                if let ConnectionAction::Deliver { text, .. } = action {
                    delivered.push(text);
                }
            }
        }

        prop_assert_eq!(delivered, frames);
    }

    #[test]
    fn prop_ids_strictly_increase(rooms in prop::collection::vec("[a-z]{1,6}", 1..20)) {
        let mut manager = manager();
        let mut last = None;

        for room in rooms {
            let (id, _) = manager.open(RoomAddress::new(room, "alice"), None, Instant::now());
            if let Some(previous) = last {
                prop_assert!(id > previous);
            }
            last = Some(id);
        }
    }
}
