//! Single-button menu state machine.
//!
//! | Mode   | Short click            | Long press                      |
//! |--------|------------------------|---------------------------------|
//! | Normal | run calibration        | enter menu, selection = 0       |
//! | Menu   | advance selection 0..3 | run selected item, back to Normal |
//!
//! The caller feeds debounced `Pressed` / `Released` edges plus a
//! periodic [`MenuMachine::poll`] while held, so a long press fires as
//! soon as the threshold is crossed rather than on release.  Each
//! press/release cycle produces at most one outcome.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MenuMode {
    #[default]
    Normal,
    Menu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum MenuItem {
    #[default]
    Close = 0,
    ClearCalibration = 1,
    ToggleCell1 = 2,
    ToggleCell2 = 3,
}

impl MenuItem {
    pub const COUNT: u8 = 4;

    pub fn from_index(index: u8) -> Self {
        match index % Self::COUNT {
            0 => Self::Close,
            1 => Self::ClearCalibration,
            2 => Self::ToggleCell1,
            _ => Self::ToggleCell2,
        }
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Close => "Close menu",
            Self::ClearCalibration => "Clear calibration",
            Self::ToggleCell1 => "Toggle cell 1",
            Self::ToggleCell2 => "Toggle cell 2",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MenuState {
    pub mode: MenuMode,
    pub selected: MenuItem,
}

/// Debounced level change on the menu button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEdge {
    Pressed,
    Released,
}

/// What a completed gesture asks the control core to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOutcome {
    /// Short click in normal mode.
    Calibrate,
    /// Long press in normal mode.
    Opened,
    /// Short click in menu mode; carries the new selection.
    Selected(MenuItem),
    /// Long press in menu mode; the machine is back in normal mode.
    Execute(MenuItem),
}

#[derive(Debug, Clone)]
pub struct MenuMachine {
    state: MenuState,
    long_press_ms: u32,
    pressed_at: Option<u32>,
    acted: bool,
}

impl MenuMachine {
    pub fn new(long_press_ms: u32) -> Self {
        Self {
            state: MenuState::default(),
            long_press_ms,
            pressed_at: None,
            acted: false,
        }
    }

    pub fn on_press(&mut self, now_ms: u32) {
        if self.pressed_at.is_none() {
            self.pressed_at = Some(now_ms);
            self.acted = false;
        }
    }

    /// Fire the long-press action once the hold exceeds the threshold.
    pub fn poll(&mut self, now_ms: u32) -> Option<MenuOutcome> {
        if self.acted || !self.is_long(now_ms) {
            return None;
        }
        self.acted = true;
        Some(self.long_press())
    }

    pub fn on_release(&mut self, now_ms: u32) -> Option<MenuOutcome> {
        if self.pressed_at.is_none() {
            return None;
        }
        let outcome = if self.acted {
            None
        } else if self.is_long(now_ms) {
            Some(self.long_press())
        } else {
            Some(self.short_click())
        };
        self.pressed_at = None;
        self.acted = false;
        outcome
    }

    /// Feed an optional edge, then check for a long press in progress.
    pub fn on_edge(&mut self, edge: Option<ButtonEdge>, now_ms: u32) -> Option<MenuOutcome> {
        match edge {
            Some(ButtonEdge::Pressed) => {
                self.on_press(now_ms);
                None
            }
            Some(ButtonEdge::Released) => self.on_release(now_ms),
            None => self.poll(now_ms),
        }
    }

    pub fn state(&self) -> MenuState {
        self.state
    }

    pub fn is_menu(&self) -> bool {
        self.state.mode == MenuMode::Menu
    }

    fn is_long(&self, now_ms: u32) -> bool {
        self.pressed_at
            .is_some_and(|t| now_ms.wrapping_sub(t) > self.long_press_ms)
    }

    fn long_press(&mut self) -> MenuOutcome {
        match self.state.mode {
            MenuMode::Normal => {
                self.state = MenuState {
                    mode: MenuMode::Menu,
                    selected: MenuItem::Close,
                };
                MenuOutcome::Opened
            }
            MenuMode::Menu => {
                let item = self.state.selected;
                self.state.mode = MenuMode::Normal;
                MenuOutcome::Execute(item)
            }
        }
    }

    fn short_click(&mut self) -> MenuOutcome {
        match self.state.mode {
            MenuMode::Normal => MenuOutcome::Calibrate,
            MenuMode::Menu => {
                self.state.selected = self.state.selected.next();
                MenuOutcome::Selected(self.state.selected)
            }
        }
    }
}
