use egui::{Event, Key, Modifiers};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shortcut {
    TogglePlay,
    SkipForward,
    SkipBackward,
    ExitFullscreen,
}

impl Shortcut {
    pub fn from_key(key: Key) -> Option<Self> {
        match key {
            Key::Space => Some(Shortcut::TogglePlay),
            Key::ArrowRight => Some(Shortcut::SkipForward),
            Key::ArrowLeft => Some(Shortcut::SkipBackward),
            Key::Escape => Some(Shortcut::ExitFullscreen),
            _ => None,
        }
    }
}

/// Shortcuts pressed this frame.
///
/// Nothing fires while a text field owns the keyboard, and chords with
/// Ctrl/Alt/Cmd are left to the application.
pub fn pressed_shortcuts(events: &[Event], text_focus: bool) -> Vec<Shortcut> {
    if text_focus {
        return Vec::new();
    }

    events
        .iter()
        .filter_map(|event| match event {
            Event::Key {
                key,
                pressed: true,
                modifiers,
                ..
            } if !has_chord(modifiers) => Shortcut::from_key(*key),
            _ => None,
        })
        .collect()
}

fn has_chord(modifiers: &Modifiers) -> bool {
    modifiers.ctrl || modifiers.alt || modifiers.command || modifiers.mac_cmd
}
