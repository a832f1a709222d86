//! Pointer, wheel and key handling
//!
//! Two modes: `Idle` (hovering previews a cell, primary click places) and
//! `Panning` (a pan button is held and pointer motion drags the view).
//! The controller mutates the viewport directly and reports everything else
//! to the engine as an [`InputAction`].

use crate::pixel::CellCoord;
use crate::viewport::{Point, Viewport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

impl PointerButton {
    /// Buttons that start a pan drag
    #[inline]
    pub fn pans(self) -> bool {
        matches!(self, PointerButton::Middle | PointerButton::Secondary)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    /// `G`
    ToggleGrid,
    /// `R`: take the colour of the hovered pixel
    PickColor,
}

impl KeyCommand {
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'g' => Some(KeyCommand::ToggleGrid),
            'r' => Some(KeyCommand::PickColor),
            _ => None,
        }
    }
}

/// Positions are relative to the canvas's top-left corner, which is how
/// winit reports them for both the desktop window and the web canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { button: PointerButton, position: Point },
    PointerUp { button: PointerButton, position: Point },
    PointerMove { position: Point },
    PointerLeave,
    /// DOM-style wheel delta: positive scrolls down (zooms out)
    Wheel { delta_y: f64, position: Point },
    Key(KeyCommand),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// Pointer hovers this cell
    Hover(CellCoord),
    /// Remove the preview (pan started, pointer left)
    ClearPreview,
    /// Primary click on this cell; the engine checks bounds
    Place(CellCoord),
    ToggleGrid,
    PickColor(CellCoord),
    /// Pan or zoom changed
    ViewportChanged,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Idle,
    Panning { anchor: Point },
}

#[derive(Debug, Clone)]
pub struct InputController {
    mode: InputMode,
    /// Last pointer position relative to the canvas
    cursor: Option<Point>,
}

impl Default for InputController {
    fn default() -> Self {
        Self::new()
    }
}

impl InputController {
    pub fn new() -> Self {
        Self {
            mode: InputMode::Idle,
            cursor: None,
        }
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.mode, InputMode::Panning { .. })
    }

    pub fn cursor(&self) -> Option<Point> {
        self.cursor
    }

    /// Cell under the last known pointer position
    pub fn hovered_cell(&self, viewport: &Viewport) -> Option<CellCoord> {
        self.cursor.map(|p| viewport.screen_to_world(p))
    }

    pub fn handle(&mut self, event: InputEvent, viewport: &mut Viewport) -> Option<InputAction> {
        match event {
            InputEvent::PointerDown { button, position } => {
                self.cursor = Some(position);
                if button.pans() {
                    self.mode = InputMode::Panning { anchor: position };
                    return Some(InputAction::ClearPreview);
                }
                None
            }
            InputEvent::PointerUp { button, position } => {
                self.cursor = Some(position);
                match (self.mode, button) {
                    (InputMode::Panning { .. }, b) if b.pans() => {
                        self.mode = InputMode::Idle;
                        Some(InputAction::Hover(viewport.screen_to_world(position)))
                    }
                    // clicks during a drag are ignored
                    (InputMode::Panning { .. }, _) => None,
                    (InputMode::Idle, PointerButton::Primary) => {
                        Some(InputAction::Place(viewport.screen_to_world(position)))
                    }
                    (InputMode::Idle, _) => None,
                }
            }
            InputEvent::PointerMove { position } => {
                self.cursor = Some(position);
                match self.mode {
                    InputMode::Panning { anchor } => {
                        viewport.pan_by(position.x - anchor.x, position.y - anchor.y);
                        self.mode = InputMode::Panning { anchor: position };
                        Some(InputAction::ViewportChanged)
                    }
                    InputMode::Idle => Some(InputAction::Hover(viewport.screen_to_world(position))),
                }
            }
            InputEvent::PointerLeave => {
                self.mode = InputMode::Idle;
                self.cursor = None;
                Some(InputAction::ClearPreview)
            }
            InputEvent::Wheel { delta_y, position } => {
                self.cursor = Some(position);
                viewport.zoom_at(position, delta_y);
                Some(InputAction::ViewportChanged)
            }
            InputEvent::Key(KeyCommand::ToggleGrid) => Some(InputAction::ToggleGrid),
            InputEvent::Key(KeyCommand::PickColor) => {
                self.hovered_cell(viewport).map(InputAction::PickColor)
            }
        }
    }
}
