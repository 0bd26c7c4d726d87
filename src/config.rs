use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tunable timings and thresholds for the interaction layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub drag: DragConfig,
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// How long a touch must stay put before it becomes a drag session.
    pub long_press_ms: u64,
    /// Movement beyond this many pixels while pressed is treated as a scroll.
    pub move_threshold_px: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Interval of the simulated transfer-progress ticker.
    pub progress_tick_ms: u64,
    /// Delay before an error-free upload/delete batch auto-dismisses.
    pub upload_dismiss_ms: u64,
    /// Delay before an error-free move batch auto-dismisses.
    pub move_dismiss_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            drag: DragConfig::default(),
            batch: BatchConfig::default(),
        }
    }
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            long_press_ms: 500,
            move_threshold_px: 8.0,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            progress_tick_ms: 200,
            upload_dismiss_ms: 3000,
            move_dismiss_ms: 2000,
        }
    }
}

impl DragConfig {
    pub fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }
}

impl BatchConfig {
    pub fn progress_tick(&self) -> Duration {
        Duration::from_millis(self.progress_tick_ms)
    }

    pub fn upload_dismiss(&self) -> Duration {
        Duration::from_millis(self.upload_dismiss_ms)
    }

    pub fn move_dismiss(&self) -> Duration {
        Duration::from_millis(self.move_dismiss_ms)
    }
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults for
    /// missing fields.
    pub fn load<P: AsRef<Path>>(path: P) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
