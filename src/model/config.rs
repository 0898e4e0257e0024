use serde::{Deserialize, Serialize};

/// Configuration from weft.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditorConfig {
    #[serde(default)]
    pub program: ProgramDefaults,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramDefaults {
    /// Task count for newly scaffolded programs
    #[serde(default = "default_tasks")]
    pub default_tasks: usize,
    /// Upper bound accepted by resize and check
    #[serde(default = "default_max_tasks")]
    pub max_tasks: usize,
}

impl Default for ProgramDefaults {
    fn default() -> Self {
        ProgramDefaults {
            default_tasks: 4,
            max_tasks: 512,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Show the per-task participation grid next to each statement
    #[serde(default = "default_true")]
    pub show_grid: bool,
    /// Write the file after every successful edit
    #[serde(default)]
    pub autosave: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            show_grid: true,
            autosave: false,
        }
    }
}

fn default_tasks() -> usize {
    4
}

fn default_max_tasks() -> usize {
    512
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gets_defaults() {
        let config: EditorConfig = toml::from_str("").unwrap();
        assert_eq!(config.program.default_tasks, 4);
        assert_eq!(config.program.max_tasks, 512);
        assert!(config.ui.show_grid);
        assert!(!config.ui.autosave);
    }

    #[test]
    fn partial_sections_fill_in() {
        let config: EditorConfig = toml::from_str(
            "[program]\ndefault_tasks = 16\n\n[ui]\nautosave = true\n",
        )
        .unwrap();
        assert_eq!(config.program.default_tasks, 16);
        assert_eq!(config.program.max_tasks, 512);
        assert!(config.ui.autosave);
    }
}
