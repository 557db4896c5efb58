//! Input abstraction layer.
//!
//! Normalizes mouse, touch, and pen pointer events plus wheel events into a
//! unified `InputEvent` enum consumed by the interaction state machine.
//! Coordinates are page (screen) pixels; timestamps are milliseconds on any
//! monotonic clock.

/// Keyboard modifiers held during an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        ..Self::NONE
    };

    /// Ctrl on Linux/Windows or ⌘ on macOS turns the wheel into zoom.
    pub fn zoom(&self) -> bool {
        self.ctrl || self.meta
    }

    /// Primary + this modifier pans even over a note.
    pub fn pan(&self) -> bool {
        self.alt || self.ctrl || self.meta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

/// A normalized input event from any pointing device.
#[derive(Debug, Clone)]
pub enum InputEvent {
    PointerDown {
        x: f64,
        y: f64,
        button: PointerButton,
        modifiers: Modifiers,
        time_ms: f64,
    },

    PointerMove {
        x: f64,
        y: f64,
        modifiers: Modifiers,
        time_ms: f64,
    },

    PointerUp {
        x: f64,
        y: f64,
        modifiers: Modifiers,
        time_ms: f64,
    },

    /// Wheel notch(es). Positive `delta_y` scrolls down / zooms out.
    Wheel {
        x: f64,
        y: f64,
        delta_y: f64,
        modifiers: Modifiers,
    },

    DoubleClick {
        x: f64,
        y: f64,
        modifiers: Modifiers,
    },
}

impl InputEvent {
    pub fn pointer_down(x: f64, y: f64, button: PointerButton, modifiers: Modifiers, time_ms: f64) -> Self {
        Self::PointerDown {
            x,
            y,
            button,
            modifiers,
            time_ms,
        }
    }

    pub fn pointer_move(x: f64, y: f64, time_ms: f64) -> Self {
        Self::PointerMove {
            x,
            y,
            modifiers: Modifiers::NONE,
            time_ms,
        }
    }

    pub fn pointer_up(x: f64, y: f64, time_ms: f64) -> Self {
        Self::PointerUp {
            x,
            y,
            modifiers: Modifiers::NONE,
            time_ms,
        }
    }

    pub fn wheel(x: f64, y: f64, delta_y: f64, modifiers: Modifiers) -> Self {
        Self::Wheel {
            x,
            y,
            delta_y,
            modifiers,
        }
    }

    /// Extract the screen position of any event.
    pub fn position(&self) -> (f64, f64) {
        match self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y, .. }
            | Self::PointerUp { x, y, .. }
            | Self::Wheel { x, y, .. }
            | Self::DoubleClick { x, y, .. } => (*x, *y),
        }
    }

    /// Events carrying NaN/∞ coordinates are dropped before dispatch.
    pub fn is_finite(&self) -> bool {
        let (x, y) = self.position();
        let extra = match self {
            Self::Wheel { delta_y, .. } => delta_y.is_finite(),
            _ => true,
        };
        x.is_finite() && y.is_finite() && extra
    }
}
