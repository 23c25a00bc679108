//! Virtual input sink — synthetic mouse and keyboard via `/dev/uinput`.
//!
//! # Requirements
//!
//! - The process must have write access to `/dev/uinput`.
//!   Either run as root or add the user to the `input` group:
//!   ```text
//!   sudo usermod -aG input $USER
//!   sudo chmod 0660 /dev/uinput
//!   ```
//! - Kernel module must be loaded: `sudo modprobe uinput`
//!
//! # Devices created
//!
//! Two virtual devices are registered once at startup and destroyed on drop:
//! - **Hotspot KBM Mouse** — REL_X/REL_Y motion, vertical + horizontal
//!   wheels, BTN_LEFT/RIGHT/MIDDLE
//! - **Hotspot KBM Keyboard** — every key in the static [`keymap`]
//!
//! Both identify as `bus 0x03 (USB), vendor 0x1234, product 0x5678,
//! version 1`.
//!
//! The mouse device has two writers (the pointer discharge thread and the
//! TCP click path), so each device guards its handle with a mutex; `emit`
//! terminates each event group with a SYN_REPORT.

pub mod keymap;

mod device;

pub use device::{VirtualKeyboard, VirtualMouse, MOUSE_DEVICE_NAME, KEYBOARD_DEVICE_NAME};
pub use evdev::Key;
