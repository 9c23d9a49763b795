//! crates/edusync_core/src/selection.rs
//!
//! State machine behind the floating selection menu: when to show it, where
//! to anchor it, and the copy / enhance actions.

use serde::{Deserialize, Serialize};

use crate::domain::EnhanceRequest;

/// Vertical gap between the selection and the menu, in pixels.
const MENU_OFFSET_Y: f64 = 10.0;

/// The element a pointer-up landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerTarget {
    Content,
    Input,
    TextArea,
    Menu,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub x: f64,
    pub y: f64,
}

impl Anchor {
    /// Centred above the selection, in page coordinates.
    pub fn above(rect: &BoundingBox, scroll_y: f64) -> Self {
        Self {
            x: rect.left + rect.width / 2.0,
            y: rect.top + scroll_y - MENU_OFFSET_Y,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerUp {
    pub target: PointerTarget,
    pub selected_text: String,
    pub rect: BoundingBox,
    pub scroll_y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MenuState {
    Hidden,
    Open { anchor: Anchor, text: String },
    Enhancing { original: String },
    ShowingResult { original: String, enhanced: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionMenu {
    state: MenuState,
}

impl Default for SelectionMenu {
    fn default() -> Self {
        Self {
            state: MenuState::Hidden,
        }
    }
}

impl SelectionMenu {
    pub fn state(&self) -> &MenuState {
        &self.state
    }

    /// Opens, moves or closes the menu. Clicks on the menu itself are ignored,
    /// as is anything while an enhancement is running or its result is shown.
    pub fn on_pointer_up(&mut self, event: &PointerUp) {
        if event.target == PointerTarget::Menu {
            return;
        }
        if matches!(
            self.state,
            MenuState::Enhancing { .. } | MenuState::ShowingResult { .. }
        ) {
            return;
        }
        let text = event.selected_text.trim();
        if text.is_empty() {
            self.state = MenuState::Hidden;
            return;
        }
        if matches!(event.target, PointerTarget::Input | PointerTarget::TextArea) {
            return;
        }
        self.state = MenuState::Open {
            anchor: Anchor::above(&event.rect, event.scroll_y),
            text: text.to_string(),
        };
    }

    /// Returns the text to put on the clipboard and closes the menu.
    pub fn copy(&mut self) -> Option<String> {
        match std::mem::replace(&mut self.state, MenuState::Hidden) {
            MenuState::Open { text, .. } => Some(text),
            other => {
                self.state = other;
                None
            }
        }
    }

    /// Closes the menu and opens the result modal in its loading state.
    /// Returns `None` unless the menu is open, so only one request is ever in flight.
    pub fn begin_enhance(&mut self) -> Option<EnhanceRequest> {
        match std::mem::replace(&mut self.state, MenuState::Hidden) {
            MenuState::Open { text, .. } => {
                self.state = MenuState::Enhancing {
                    original: text.clone(),
                };
                Some(EnhanceRequest { text })
            }
            other => {
                self.state = other;
                None
            }
        }
    }

    /// Applies the enhancement reply. A failed request closes the modal.
    pub fn finish_enhance<E>(&mut self, result: Result<String, E>) -> Result<(), E> {
        let MenuState::Enhancing { original } =
            std::mem::replace(&mut self.state, MenuState::Hidden)
        else {
            return Ok(());
        };
        let enhanced = result?;
        self.state = MenuState::ShowingResult { original, enhanced };
        Ok(())
    }

    pub fn close(&mut self) {
        self.state = MenuState::Hidden;
    }
}
