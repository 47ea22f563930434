//! Property-based tests for form key handling.

use std::time::Instant;

use parley_app::{Session, SessionConfig};
use parley_client::MemoryCredentialStore;
use parley_core::{Endpoint, Variant};
use parley_tui::{Field, FormState, KeyInput, TextInput};
use proptest::prelude::*;

/// Generate random printable characters for input.
fn printable_char() -> impl Strategy<Value = char> {
    prop_oneof![prop::char::range(' ', '~'), Just('é'), Just('ß')]
}

fn edit_key() -> impl Strategy<Value = KeyInput> {
    prop_oneof![
        4 => printable_char().prop_map(KeyInput::Char),
        1 => Just(KeyInput::Backspace),
        1 => Just(KeyInput::Delete),
        1 => Just(KeyInput::Left),
        1 => Just(KeyInput::Right),
        1 => Just(KeyInput::Home),
        1 => Just(KeyInput::End),
    ]
}

fn form_key() -> impl Strategy<Value = KeyInput> {
    prop_oneof![
        8 => edit_key(),
        1 => Just(KeyInput::Enter),
        1 => Just(KeyInput::Tab),
        1 => Just(KeyInput::BackTab),
        1 => Just(KeyInput::Ctrl('d')),
        1 => Just(KeyInput::Ctrl('l')),
    ]
}

proptest! {
    /// Cursor never leaves the buffer.
    #[test]
    fn prop_cursor_within_buffer(keys in prop::collection::vec(edit_key(), 0..100)) {
        let mut input = TextInput::new();

        for key in keys {
            input.edit(key);
            prop_assert!(input.cursor() <= input.len());
        }
    }

    /// Typing then deleting everything leaves an empty buffer.
    #[test]
    fn prop_backspace_undoes_typing(text in "[a-zé ]{0,20}") {
        let mut input = TextInput::new();
        for c in text.chars() {
            input.edit(KeyInput::Char(c));
        }
        prop_assert_eq!(input.text(), text.as_str());

        for _ in 0..text.chars().count() {
            input.edit(KeyInput::Backspace);
        }
        prop_assert!(input.is_empty());
    }

    /// The message field and the session draft never disagree.
    #[test]
    fn prop_message_field_mirrors_draft(keys in prop::collection::vec(form_key(), 0..60)) {
        let endpoint = Endpoint::parse("wss://host", Variant::RoomScoped).unwrap();
        let mut session = Session::new(SessionConfig::new(endpoint), MemoryCredentialStore::new());
        let mut form = FormState::new();

        for key in keys {
            let _ = form.handle_key(key, &mut session, Instant::now());
            prop_assert_eq!(form.input(Field::Message).text(), session.draft());
        }
    }
}
