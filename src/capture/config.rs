//! Capture and session configuration.
//!
//! Only operational knobs live here. The exposure, glare, angle and hold
//! thresholds are compile-time constants in their own modules.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for camera capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Camera device index or identifier.
    pub device_id: u32,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Target frames per second.
    pub fps: u32,
    /// Mirror stills horizontally (front-facing camera convention).
    pub mirror_stills: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device_id: 0,
            width: 640,
            height: 480,
            fps: 30,
            mirror_stills: true,
        }
    }
}

impl CaptureConfig {
    /// Creates a new configuration with the specified dimensions.
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Interval between frames at the configured rate.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps.max(1)))
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        if self.fps == 0 || self.fps > 120 {
            return Err(ConfigError::InvalidFrameRate);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Width or height is zero.
    #[error("invalid frame dimensions")]
    InvalidDimensions,
    /// Frame rate outside 1 to 120.
    #[error("invalid frame rate (must be 1-120 fps)")]
    InvalidFrameRate,
    /// Detector cadence is zero.
    #[error("detector cadence must be at least 1 frame")]
    InvalidDetectorCadence,
    /// Tick period outside 1 to 1000 ms.
    #[error("tick period must be between 1 and 1000 ms")]
    InvalidTickPeriod,
    /// Required capture count is zero.
    #[error("required capture count must be at least 1")]
    InvalidCaptureCount,
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// The file is not valid TOML for this schema.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Camera settings.
    #[serde(default)]
    pub capture: CaptureConfig,
    /// Analysis cadence.
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Session rules.
    #[serde(default)]
    pub session: SessionConfig,
    /// User feedback.
    #[serde(default)]
    pub feedback: FeedbackConfig,
    /// Demo and exporter settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Face geometry stage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Run the face detector on every Nth delivered frame.
    pub detector_every_n: u32,
    /// Frames allowed to wait for the detector before new ones are dropped.
    pub detector_queue_depth: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            detector_every_n: 3,
            detector_queue_depth: 1,
        }
    }
}

/// Gate, sequencer and store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Evaluation tick period in milliseconds.
    pub tick_ms: u64,
    /// Captures handed to the completion callback on finish.
    pub required_captures: usize,
    /// Treat more than one visible face as "no usable face".
    pub block_multiple_faces: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_ms: 50,
            required_captures: 3,
            block_multiple_faces: true,
        }
    }
}

impl SessionConfig {
    /// Tick period as a duration.
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

/// User feedback configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// Speak guidance prompts.
    pub voice_enabled: bool,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self { voice_enabled: true }
    }
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Metrics server port (0 to disable).
    pub metrics_port: u16,
    /// How long the demo session may run before giving up, in seconds.
    pub session_seconds: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            metrics_port: 0,
            session_seconds: 30,
        }
    }
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.capture.validate()?;
        if self.analysis.detector_every_n == 0 || self.analysis.detector_queue_depth == 0 {
            return Err(ConfigError::InvalidDetectorCadence);
        }
        if self.session.tick_ms == 0 || self.session.tick_ms > 1000 {
            return Err(ConfigError::InvalidTickPeriod);
        }
        if self.session.required_captures == 0 {
            return Err(ConfigError::InvalidCaptureCount);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(FileConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_dimensions_invalid() {
        let mut config = CaptureConfig::default();
        config.width = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDimensions)
        ));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = FileConfig::from_toml(
            r#"
            [capture]
            fps = 60

            [feedback]
            voice_enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.capture.fps, 60);
        assert_eq!(config.capture.width, 640);
        assert!(!config.feedback.voice_enabled);
        assert_eq!(config.analysis.detector_every_n, 3);
        assert_eq!(config.session.tick_period(), Duration::from_millis(50));
    }

    #[test]
    fn test_zero_cadence_rejected() {
        let result = FileConfig::from_toml("[analysis]\ndetector_every_n = 0\n");
        assert!(matches!(result, Err(ConfigError::InvalidDetectorCadence)));
    }

    #[test]
    fn test_malformed_toml() {
        let result = FileConfig::from_toml("[capture\nfps = ");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
