use ratatui::style::Color;

/// Parsed color theme for the TUI
#[derive(Debug, Clone)]
pub struct Theme {
    pub background: Color,
    pub text: Color,
    pub text_bright: Color,
    pub highlight: Color,
    pub dim: Color,
    pub comment: Color,
    pub selection_bg: Color,
    pub selection_marker: Color,
    pub grid_on: Color,
    pub grid_off: Color,
    pub unknown: Color,
    pub compute: Color,
    pub send: Color,
    pub reduce: Color,
    pub synchronize: Color,
    pub block: Color,
    pub error: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            background: Color::Rgb(0x0B, 0x10, 0x21),
            text: Color::Rgb(0xAA, 0xB8, 0xE8),
            text_bright: Color::Rgb(0xFF, 0xFF, 0xFF),
            highlight: Color::Rgb(0x41, 0xC9, 0xFB),
            dim: Color::Rgb(0x6A, 0x74, 0x9E),
            comment: Color::Rgb(0x5F, 0x87, 0x5F),
            selection_bg: Color::Rgb(0x14, 0x2E, 0x3D),
            selection_marker: Color::Rgb(0x41, 0xC9, 0xFB),
            grid_on: Color::Rgb(0x44, 0xFF, 0x88),
            grid_off: Color::Rgb(0x2E, 0x38, 0x55),
            unknown: Color::Rgb(0xFF, 0xD7, 0x00),
            compute: Color::Rgb(0x44, 0x88, 0xFF),
            send: Color::Rgb(0xCC, 0x66, 0xFF),
            reduce: Color::Rgb(0x44, 0xDD, 0xFF),
            synchronize: Color::Rgb(0x44, 0xFF, 0x88),
            block: Color::Rgb(0xFF, 0x9E, 0x64),
            error: Color::Rgb(0xFF, 0x44, 0x44),
        }
    }
}

impl Theme {
    /// Color for a statement or block kind name.
    pub fn kind_color(&self, kind_name: &str) -> Color {
        match kind_name {
            "compute" => self.compute,
            "send" => self.send,
            "reduce" => self.reduce,
            "synchronize" => self.synchronize,
            _ => self.block,
        }
    }
}
