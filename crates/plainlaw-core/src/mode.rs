//! Input mode selection and simplicity levels.

use std::fmt;

/// Where the document to simplify comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Text,
    Pdf,
}

impl InputMode {
    pub fn label(&self) -> &'static str {
        match self {
            InputMode::Text => "Paste Text",
            InputMode::Pdf => "Upload PDF",
        }
    }

    pub fn all() -> [InputMode; 2] {
        [InputMode::Text, InputMode::Pdf]
    }

    pub fn toggled(&self) -> Self {
        match self {
            InputMode::Text => InputMode::Pdf,
            InputMode::Pdf => InputMode::Text,
        }
    }

    /// The one input surface shown while this mode is active.
    pub fn surface(&self) -> InputSurface {
        match self {
            InputMode::Text => InputSurface::TextArea,
            InputMode::Pdf => InputSurface::FilePicker,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSurface {
    TextArea,
    FilePicker,
}

/// Holds the active mode. Exactly one input surface is visible at a time.
#[derive(Debug, Clone, Default)]
pub struct InputModeSelector {
    mode: InputMode,
}

impl InputModeSelector {
    pub fn new(mode: InputMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    /// Returns true when the mode actually changed.
    pub fn set_mode(&mut self, mode: InputMode) -> bool {
        let changed = self.mode != mode;
        self.mode = mode;
        changed
    }

    pub fn is_visible(&self, surface: InputSurface) -> bool {
        self.mode.surface() == surface
    }

    pub fn visible_surface(&self) -> InputSurface {
        self.mode.surface()
    }
}

/// Reading-level options offered by the backend, in display order.
pub const LEVEL_OPTIONS: [&str; 3] = [
    "Quick Summary (ELI5)",
    "Standard View",
    "Detailed Breakdown",
];

/// Opaque level string; passed to the backend as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SimplicityLevel(String);

impl SimplicityLevel {
    pub fn new(level: impl Into<String>) -> Self {
        Self(level.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn options() -> Vec<SimplicityLevel> {
        LEVEL_OPTIONS.iter().map(|l| SimplicityLevel::new(*l)).collect()
    }

    /// Index into [`LEVEL_OPTIONS`], if this is one of the fixed options.
    pub fn option_index(&self) -> Option<usize> {
        LEVEL_OPTIONS.iter().position(|l| *l == self.0)
    }
}

impl Default for SimplicityLevel {
    fn default() -> Self {
        Self::new(LEVEL_OPTIONS[0])
    }
}

impl fmt::Display for SimplicityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
