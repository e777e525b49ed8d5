//! Suggestion popup state and placement.

use crate::error::OverlayError;
use crate::{Match, MatchKey};

pub const DEFAULT_MAX_SUGGESTIONS: usize = 3;

/// Horizontal space the popup needs next to its anchor.
const POPUP_WIDTH_BUDGET: f64 = 400.0;
const POPUP_RECENTER_SHIFT: f64 = 200.0;
const VIEWPORT_MARGIN: f64 = 10.0;

/// Bounding box of a marker on screen.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn right(&self) -> f64 {
        self.left + self.width
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Vertical {
    /// Popup bottom edge, measured from the viewport bottom.
    Above { bottom: f64 },
    /// Popup top edge, measured from the viewport top.
    Below { top: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Horizontal {
    Left { left: f64 },
    Right { right: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub vertical: Vertical,
    pub horizontal: Horizontal,
}

impl Placement {
    /// Keep the popup on screen next to `anchor`.
    pub fn compute(anchor: Rect, viewport: Viewport) -> Self {
        let vertical = if anchor.top > viewport.height / 2.0 {
            Vertical::Above {
                bottom: viewport.height - anchor.top,
            }
        } else {
            Vertical::Below {
                top: anchor.top + anchor.height,
            }
        };

        let horizontal = if anchor.left > POPUP_WIDTH_BUDGET {
            Horizontal::Right {
                right: viewport.width - anchor.right(),
            }
        } else if viewport.width - anchor.left > POPUP_WIDTH_BUDGET {
            Horizontal::Left { left: anchor.left }
        } else {
            Horizontal::Left {
                left: (anchor.left - POPUP_RECENTER_SHIFT).max(VIEWPORT_MARGIN),
            }
        };

        Self {
            vertical,
            horizontal,
        }
    }

    /// CSS position declarations, e.g. `top: 40px;left: 12px`.
    pub fn style(&self) -> String {
        let vertical = match self.vertical {
            Vertical::Above { bottom } => format!("bottom: {}px", bottom),
            Vertical::Below { top } => format!("top: {}px", top),
        };
        let horizontal = match self.horizontal {
            Horizontal::Left { left } => format!("left: {}px", left),
            Horizontal::Right { right } => format!("right: {}px", right),
        };
        format!("{};{}", vertical, horizontal)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpenPopup {
    pub key: MatchKey,
    pub title: String,
    pub message: String,
    pub choices: Vec<String>,
    pub anchor: Rect,
    pub placement: Placement,
}

/// At most one popup at a time.
#[derive(Debug, Clone)]
pub struct SuggestionPopup {
    max_choices: usize,
    open: Option<OpenPopup>,
}

impl SuggestionPopup {
    pub fn new(max_choices: usize) -> Self {
        Self {
            max_choices,
            open: None,
        }
    }

    /// Open for `m`, replacing any popup already open.
    pub fn open(&mut self, m: &Match, anchor: Rect, viewport: Viewport) -> &OpenPopup {
        let popup = OpenPopup {
            key: m.key(),
            title: m.short_message.clone(),
            message: m.message.clone(),
            choices: m
                .replacements
                .iter()
                .take(self.max_choices)
                .cloned()
                .collect(),
            anchor,
            placement: Placement::compute(anchor, viewport),
        };
        self.open.insert(popup)
    }

    pub fn close(&mut self) {
        self.open = None;
    }

    pub fn reposition(&mut self, viewport: Viewport) {
        if let Some(popup) = &mut self.open {
            popup.placement = Placement::compute(popup.anchor, viewport);
        }
    }

    pub fn current(&self) -> Option<&OpenPopup> {
        self.open.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn choice(&self, index: usize) -> Result<&str, OverlayError> {
        let popup = self.current().ok_or(OverlayError::PopupClosed)?;
        popup
            .choices
            .get(index)
            .map(String::as_str)
            .ok_or(OverlayError::NoSuchChoice {
                index,
                available: popup.choices.len(),
            })
    }
}

impl Default for SuggestionPopup {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SUGGESTIONS)
    }
}
