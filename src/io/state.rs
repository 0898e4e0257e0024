use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted TUI state for one program file (written to a sidecar json)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UiState {
    /// Cursor row in the body view
    #[serde(default)]
    pub cursor: usize,
    /// Scroll offset
    #[serde(default)]
    pub scroll_offset: usize,
    /// Per-session participation-grid override (None = use config default)
    #[serde(default)]
    pub show_grid_override: Option<bool>,
}

/// Sidecar path: `prog.wft` → `.prog.wft.state.json`
pub fn state_path(program_path: &Path) -> PathBuf {
    let name = program_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("program");
    program_path.with_file_name(format!(".{name}.state.json"))
}

/// Read the sidecar state. Missing or corrupt files read as None.
pub fn read_ui_state(program_path: &Path) -> Option<UiState> {
    let content = fs::read_to_string(state_path(program_path)).ok()?;
    serde_json::from_str(&content).ok()
}

/// Write the sidecar state. Best-effort; failures are ignored.
pub fn write_ui_state(program_path: &Path, state: &UiState) {
    if let Ok(json) = serde_json::to_string_pretty(state) {
        let _ = fs::write(state_path(program_path), json);
    }
}

// ---------------------------------------------------------------------------
// Recent files registry
// ---------------------------------------------------------------------------

const RECENT_LIMIT: usize = 50;

/// One entry in the global recent-files registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentEntry {
    pub path: String,
    pub last_opened: DateTime<Utc>,
}

/// The global recent-files registry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecentFiles {
    #[serde(default)]
    pub entries: Vec<RecentEntry>,
}

/// Registry file path, respecting XDG_CONFIG_HOME
pub fn recent_path() -> PathBuf {
    let config_dir = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"));
    config_dir.join("weft").join("recent.json")
}

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/"))
}

/// Read the registry from a specific path. Missing or corrupt files read
/// as an empty registry.
pub fn read_recent_from(path: &Path) -> RecentFiles {
    fs::read_to_string(path)
        .ok()
        .and_then(|text| serde_json::from_str(&text).ok())
        .unwrap_or_default()
}

/// Record that `program_path` was opened now: moves it to the front,
/// dedupes, and caps the list. Best-effort write.
pub fn touch_recent_at(registry_path: &Path, program_path: &Path, now: DateTime<Utc>) {
    let mut recent = read_recent_from(registry_path);
    let display = program_path.display().to_string();
    recent.entries.retain(|e| e.path != display);
    recent.entries.insert(
        0,
        RecentEntry {
            path: display,
            last_opened: now,
        },
    );
    recent.entries.truncate(RECENT_LIMIT);

    if let Some(parent) = registry_path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    if let Ok(json) = serde_json::to_string_pretty(&recent) {
        let _ = fs::write(registry_path, json);
    }
}

/// Record an open in the default registry.
pub fn touch_recent(program_path: &Path) {
    touch_recent_at(&recent_path(), program_path, Utc::now());
}
