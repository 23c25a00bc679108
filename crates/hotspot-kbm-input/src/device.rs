use std::sync::Mutex;

use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, BusType, EventType, InputEvent, InputId, Key, RelativeAxisType};
use tracing::info;

use hotspot_kbm_core::{InputError, KeyState, MouseButton};

use crate::keymap::KEYMAP;

pub const MOUSE_DEVICE_NAME: &str = "Hotspot KBM Mouse";
pub const KEYBOARD_DEVICE_NAME: &str = "Hotspot KBM Keyboard";

fn device_id() -> InputId {
    InputId::new(BusType::BUS_USB, 0x1234, 0x5678, 0x1)
}

// ── VirtualMouse ───────────────────────────────────────────────────────────────

/// Relative-motion virtual mouse.
///
/// Written to by two threads (the pointer discharge loop and the TCP click
/// path); the mutex keeps their event groups from interleaving.
pub struct VirtualMouse {
    device: Mutex<VirtualDevice>,
}

fn build_mouse() -> std::io::Result<VirtualDevice> {
    let mut buttons = AttributeSet::<Key>::new();
    buttons.insert(Key::BTN_LEFT);
    buttons.insert(Key::BTN_RIGHT);
    buttons.insert(Key::BTN_MIDDLE);

    let mut axes = AttributeSet::<RelativeAxisType>::new();
    axes.insert(RelativeAxisType::REL_X);
    axes.insert(RelativeAxisType::REL_Y);
    axes.insert(RelativeAxisType::REL_WHEEL);
    axes.insert(RelativeAxisType::REL_HWHEEL);

    VirtualDeviceBuilder::new()?
        .name(MOUSE_DEVICE_NAME)
        .input_id(device_id())
        .with_keys(&buttons)?
        .with_relative_axes(&axes)?
        .build()
}

impl VirtualMouse {
    pub fn create() -> Result<Self, InputError> {
        let device = build_mouse().map_err(|source| InputError::DeviceCreation { source })?;
        info!("[uinput] Created virtual mouse '{MOUSE_DEVICE_NAME}'");
        Ok(Self { device: Mutex::new(device) })
    }

    /// Move the cursor by a relative delta. Zero axes are omitted from the
    /// event group; a fully zero delta writes nothing.
    pub fn move_rel(&self, dx: i32, dy: i32) -> Result<(), InputError> {
        let mut events = Vec::with_capacity(2);
        if dx != 0 {
            events.push(InputEvent::new(EventType::RELATIVE, RelativeAxisType::REL_X.0, dx));
        }
        if dy != 0 {
            events.push(InputEvent::new(EventType::RELATIVE, RelativeAxisType::REL_Y.0, dy));
        }
        self.emit(&events)
    }

    /// Turn the wheels. Positive vertical scrolls up, positive horizontal
    /// scrolls right.
    pub fn scroll(&self, vertical: i32, horizontal: i32) -> Result<(), InputError> {
        let mut events = Vec::with_capacity(2);
        if vertical != 0 {
            events.push(InputEvent::new(
                EventType::RELATIVE,
                RelativeAxisType::REL_WHEEL.0,
                vertical,
            ));
        }
        if horizontal != 0 {
            events.push(InputEvent::new(
                EventType::RELATIVE,
                RelativeAxisType::REL_HWHEEL.0,
                horizontal,
            ));
        }
        self.emit(&events)
    }

    /// Press or release a mouse button.
    pub fn click(&self, button: MouseButton, state: KeyState) -> Result<(), InputError> {
        let code = match button {
            MouseButton::Left => Key::BTN_LEFT,
            MouseButton::Right => Key::BTN_RIGHT,
            MouseButton::Middle => Key::BTN_MIDDLE,
        };
        self.emit(&[InputEvent::new(EventType::KEY, code.code(), state.value())])
    }

    fn emit(&self, events: &[InputEvent]) -> Result<(), InputError> {
        if events.is_empty() {
            return Ok(());
        }
        self.device.lock().unwrap().emit(events)?;
        Ok(())
    }
}

// ── VirtualKeyboard ────────────────────────────────────────────────────────────

/// Virtual keyboard with every key of the static keymap enabled.
pub struct VirtualKeyboard {
    device: Mutex<VirtualDevice>,
}

fn build_keyboard() -> std::io::Result<VirtualDevice> {
    let mut keys = AttributeSet::<Key>::new();
    for &(_, key) in KEYMAP {
        keys.insert(key);
    }

    VirtualDeviceBuilder::new()?
        .name(KEYBOARD_DEVICE_NAME)
        .input_id(device_id())
        .with_keys(&keys)?
        .build()
}

impl VirtualKeyboard {
    pub fn create() -> Result<Self, InputError> {
        let device = build_keyboard().map_err(|source| InputError::DeviceCreation { source })?;
        info!(
            "[uinput] Created virtual keyboard '{KEYBOARD_DEVICE_NAME}' ({} keys)",
            KEYMAP.len()
        );
        Ok(Self { device: Mutex::new(device) })
    }

    /// Press or release one key.
    pub fn key(&self, key: Key, state: KeyState) -> Result<(), InputError> {
        self.device
            .lock()
            .unwrap()
            .emit(&[InputEvent::new(EventType::KEY, key.code(), state.value())])?;
        Ok(())
    }

    /// Convenience: press and release in one call.
    pub fn type_key(&self, key: Key) -> Result<(), InputError> {
        self.key(key, KeyState::Down)?;
        self.key(key, KeyState::Up)
    }
}
