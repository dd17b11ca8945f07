//! Pin-drop mode.
//!
//! While armed, the next map click is consumed to record a pinned
//! location instead of reaching the normal map handlers; the mode then
//! disarms itself. A previous pin stays visible while re-armed until it is
//! superseded by the next drop or the mode is toggled off.

use mapd_permit_models::LngLat;
use serde::Serialize;
use strum_macros::{AsRefStr, Display};

/// Observable pin-drop state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PinDropState {
    /// No mode active and no pin recorded.
    Idle,
    /// The next map click will be consumed.
    Armed,
    /// A location is recorded.
    Pinned(LngLat),
}

/// Pointer cursor the map canvas should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, AsRefStr)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Cursor {
    /// Normal map interaction.
    #[default]
    Default,
    /// Clicks drop a pin.
    Crosshair,
}

/// Pin-drop controller.
#[derive(Debug, Clone, Default)]
pub struct PinDrop {
    armed: bool,
    pinned: Option<LngLat>,
}

impl PinDrop {
    /// Current state; an armed controller reports [`PinDropState::Armed`]
    /// even while an older pin is still shown.
    #[must_use]
    pub fn state(&self) -> PinDropState {
        match (self.armed, self.pinned) {
            (true, _) => PinDropState::Armed,
            (false, Some(at)) => PinDropState::Pinned(at),
            (false, None) => PinDropState::Idle,
        }
    }

    /// Whether the next map click will be consumed.
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.armed
    }

    /// The recorded location, if any.
    #[must_use]
    pub const fn pinned(&self) -> Option<LngLat> {
        self.pinned
    }

    /// Arms the mode, or disarms it and drops any stale pin when already
    /// armed.
    pub fn toggle(&mut self) -> PinDropState {
        if self.armed {
            self.armed = false;
            self.pinned = None;
            log::debug!("Pin-drop mode disarmed");
        } else {
            self.armed = true;
            log::debug!("Pin-drop mode armed");
        }
        self.state()
    }

    /// Offers a map click to the controller. Returns `true` when the click
    /// was consumed as a pin drop.
    pub fn handle_click(&mut self, at: LngLat) -> bool {
        if !self.armed {
            return false;
        }
        self.armed = false;
        self.pinned = Some(at);
        log::info!("Pin dropped at [{}, {}]", at.lon, at.lat);
        true
    }

    /// Removes the pin and disarms.
    pub fn clear(&mut self) {
        self.armed = false;
        self.pinned = None;
    }

    /// The cursor for the current mode.
    #[must_use]
    pub const fn cursor(&self) -> Cursor {
        if self.armed {
            Cursor::Crosshair
        } else {
            Cursor::Default
        }
    }
}
