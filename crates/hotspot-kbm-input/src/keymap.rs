//! Static keymap: symbolic wire names → Linux evdev key codes.
//!
//! The handheld sends Linux evdev key names verbatim (`KEY <state>
//! <KEY_NAME>`), so the table is a direct name-to-constant mapping. Unknown
//! names are dropped by the control server before they reach the keyboard
//! device. Every key listed here is enabled on the virtual keyboard at
//! creation time; registering the full table is a one-shot startup cost.

use evdev::Key;

/// All keys the virtual keyboard understands, by wire name.
pub static KEYMAP: &[(&str, Key)] = &[
    // Letters
    ("KEY_A", Key::KEY_A),
    ("KEY_B", Key::KEY_B),
    ("KEY_C", Key::KEY_C),
    ("KEY_D", Key::KEY_D),
    ("KEY_E", Key::KEY_E),
    ("KEY_F", Key::KEY_F),
    ("KEY_G", Key::KEY_G),
    ("KEY_H", Key::KEY_H),
    ("KEY_I", Key::KEY_I),
    ("KEY_J", Key::KEY_J),
    ("KEY_K", Key::KEY_K),
    ("KEY_L", Key::KEY_L),
    ("KEY_M", Key::KEY_M),
    ("KEY_N", Key::KEY_N),
    ("KEY_O", Key::KEY_O),
    ("KEY_P", Key::KEY_P),
    ("KEY_Q", Key::KEY_Q),
    ("KEY_R", Key::KEY_R),
    ("KEY_S", Key::KEY_S),
    ("KEY_T", Key::KEY_T),
    ("KEY_U", Key::KEY_U),
    ("KEY_V", Key::KEY_V),
    ("KEY_W", Key::KEY_W),
    ("KEY_X", Key::KEY_X),
    ("KEY_Y", Key::KEY_Y),
    ("KEY_Z", Key::KEY_Z),
    // Digit row
    ("KEY_1", Key::KEY_1),
    ("KEY_2", Key::KEY_2),
    ("KEY_3", Key::KEY_3),
    ("KEY_4", Key::KEY_4),
    ("KEY_5", Key::KEY_5),
    ("KEY_6", Key::KEY_6),
    ("KEY_7", Key::KEY_7),
    ("KEY_8", Key::KEY_8),
    ("KEY_9", Key::KEY_9),
    ("KEY_0", Key::KEY_0),
    // Editing
    ("KEY_ENTER", Key::KEY_ENTER),
    ("KEY_SPACE", Key::KEY_SPACE),
    ("KEY_BACKSPACE", Key::KEY_BACKSPACE),
    ("KEY_TAB", Key::KEY_TAB),
    ("KEY_ESC", Key::KEY_ESC),
    ("KEY_DELETE", Key::KEY_DELETE),
    ("KEY_INSERT", Key::KEY_INSERT),
    // Modifiers
    ("KEY_LEFTSHIFT", Key::KEY_LEFTSHIFT),
    ("KEY_RIGHTSHIFT", Key::KEY_RIGHTSHIFT),
    ("KEY_LEFTCTRL", Key::KEY_LEFTCTRL),
    ("KEY_RIGHTCTRL", Key::KEY_RIGHTCTRL),
    ("KEY_LEFTALT", Key::KEY_LEFTALT),
    ("KEY_RIGHTALT", Key::KEY_RIGHTALT),
    ("KEY_LEFTMETA", Key::KEY_LEFTMETA),
    ("KEY_RIGHTMETA", Key::KEY_RIGHTMETA),
    ("KEY_CAPSLOCK", Key::KEY_CAPSLOCK),
    ("KEY_NUMLOCK", Key::KEY_NUMLOCK),
    ("KEY_SCROLLLOCK", Key::KEY_SCROLLLOCK),
    ("KEY_COMPOSE", Key::KEY_COMPOSE),
    // Navigation
    ("KEY_UP", Key::KEY_UP),
    ("KEY_DOWN", Key::KEY_DOWN),
    ("KEY_LEFT", Key::KEY_LEFT),
    ("KEY_RIGHT", Key::KEY_RIGHT),
    ("KEY_HOME", Key::KEY_HOME),
    ("KEY_END", Key::KEY_END),
    ("KEY_PAGEUP", Key::KEY_PAGEUP),
    ("KEY_PAGEDOWN", Key::KEY_PAGEDOWN),
    // Function row
    ("KEY_F1", Key::KEY_F1),
    ("KEY_F2", Key::KEY_F2),
    ("KEY_F3", Key::KEY_F3),
    ("KEY_F4", Key::KEY_F4),
    ("KEY_F5", Key::KEY_F5),
    ("KEY_F6", Key::KEY_F6),
    ("KEY_F7", Key::KEY_F7),
    ("KEY_F8", Key::KEY_F8),
    ("KEY_F9", Key::KEY_F9),
    ("KEY_F10", Key::KEY_F10),
    ("KEY_F11", Key::KEY_F11),
    ("KEY_F12", Key::KEY_F12),
    ("KEY_SYSRQ", Key::KEY_SYSRQ),
    ("KEY_PAUSE", Key::KEY_PAUSE),
    // Punctuation
    ("KEY_MINUS", Key::KEY_MINUS),
    ("KEY_EQUAL", Key::KEY_EQUAL),
    ("KEY_LEFTBRACE", Key::KEY_LEFTBRACE),
    ("KEY_RIGHTBRACE", Key::KEY_RIGHTBRACE),
    ("KEY_BACKSLASH", Key::KEY_BACKSLASH),
    ("KEY_SEMICOLON", Key::KEY_SEMICOLON),
    ("KEY_APOSTROPHE", Key::KEY_APOSTROPHE),
    ("KEY_GRAVE", Key::KEY_GRAVE),
    ("KEY_COMMA", Key::KEY_COMMA),
    ("KEY_DOT", Key::KEY_DOT),
    ("KEY_SLASH", Key::KEY_SLASH),
    ("KEY_102ND", Key::KEY_102ND),
    // Keypad
    ("KEY_KP0", Key::KEY_KP0),
    ("KEY_KP1", Key::KEY_KP1),
    ("KEY_KP2", Key::KEY_KP2),
    ("KEY_KP3", Key::KEY_KP3),
    ("KEY_KP4", Key::KEY_KP4),
    ("KEY_KP5", Key::KEY_KP5),
    ("KEY_KP6", Key::KEY_KP6),
    ("KEY_KP7", Key::KEY_KP7),
    ("KEY_KP8", Key::KEY_KP8),
    ("KEY_KP9", Key::KEY_KP9),
    ("KEY_KPDOT", Key::KEY_KPDOT),
    ("KEY_KPENTER", Key::KEY_KPENTER),
    ("KEY_KPPLUS", Key::KEY_KPPLUS),
    ("KEY_KPMINUS", Key::KEY_KPMINUS),
    ("KEY_KPASTERISK", Key::KEY_KPASTERISK),
    ("KEY_KPSLASH", Key::KEY_KPSLASH),
    // Media
    ("KEY_MUTE", Key::KEY_MUTE),
    ("KEY_VOLUMEDOWN", Key::KEY_VOLUMEDOWN),
    ("KEY_VOLUMEUP", Key::KEY_VOLUMEUP),
    ("KEY_PLAYPAUSE", Key::KEY_PLAYPAUSE),
    ("KEY_NEXTSONG", Key::KEY_NEXTSONG),
    ("KEY_PREVIOUSSONG", Key::KEY_PREVIOUSSONG),
    ("KEY_STOPCD", Key::KEY_STOPCD),
];

/// Resolve an uppercased wire name to its evdev key.
pub fn lookup(name: &str) -> Option<Key> {
    KEYMAP.iter().find(|(n, _)| *n == name).map(|&(_, key)| key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names_resolve() {
        assert_eq!(lookup("KEY_A"), Some(Key::KEY_A));
        assert_eq!(lookup("KEY_ENTER"), Some(Key::KEY_ENTER));
        assert_eq!(lookup("KEY_LEFTSHIFT"), Some(Key::KEY_LEFTSHIFT));
        assert_eq!(lookup("KEY_F12"), Some(Key::KEY_F12));
    }

    #[test]
    fn unknown_names_do_not_resolve() {
        assert_eq!(lookup("KEY_FNORD"), None);
        assert_eq!(lookup("key_a"), None, "lookup is exact-case; callers uppercase");
        assert_eq!(lookup(""), None);
    }

    #[test]
    fn table_has_no_duplicate_names() {
        let mut names: Vec<&str> = KEYMAP.iter().map(|&(n, _)| n).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), KEYMAP.len());
    }
}
