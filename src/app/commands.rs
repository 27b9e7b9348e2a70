//! Inbound commands to the control core.
//!
//! Produced by the menu machine from button gestures; the
//! [`ControlCore`](super::service::ControlCore) interprets and acts on them.

use crate::fusion::CellId;
use crate::menu::MenuItem;

/// Commands that the button menu can send into the control core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Run the blocking calibration capture.
    Calibrate,

    /// Erase persisted calibration.
    ClearCalibration,

    /// Flip a cell's user-disable flag.
    ToggleCell(CellId),
}

impl AppCommand {
    /// Command behind a menu item, if executing it has a side effect.
    pub fn from_menu_item(item: MenuItem) -> Option<Self> {
        match item {
            MenuItem::Close => None,
            MenuItem::ClearCalibration => Some(Self::ClearCalibration),
            MenuItem::ToggleCell1 => Some(Self::ToggleCell(CellId::First)),
            MenuItem::ToggleCell2 => Some(Self::ToggleCell(CellId::Second)),
        }
    }
}
