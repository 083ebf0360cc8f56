use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::localization::domain::bbox_stabilizer::RelocalizationPolicy;
use crate::localization::infrastructure::localizer_factory::LocalizerKind;
use crate::shared::constants::{
    DEFAULT_CHANNEL_CAPACITY, DEFAULT_DILATION_RADIUS, DEFAULT_INPAINT_RADIUS, DEFAULT_THRESHOLD,
};
use crate::shared::error::WatermarkError;

/// Settings for one removal run, resolved before the first frame.
///
/// Missing fields in a JSON file take their defaults, so a file may set
/// only what it wants to change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub template_path: PathBuf,
    pub output_path: PathBuf,
    /// Minimum first-frame confidence, in `[0, 1]`.
    pub threshold: f64,
    pub dilation_radius: u32,
    pub inpaint_radius: u32,
    pub relocalization: RelocalizationPolicy,
    pub localizer: LocalizerKind,
    /// Decode and encode on their own threads.
    pub threaded: bool,
    pub channel_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            template_path: PathBuf::new(),
            output_path: PathBuf::new(),
            threshold: DEFAULT_THRESHOLD,
            dilation_radius: DEFAULT_DILATION_RADIUS,
            inpaint_radius: DEFAULT_INPAINT_RADIUS,
            relocalization: RelocalizationPolicy::default(),
            localizer: LocalizerKind::default(),
            threaded: true,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl PipelineConfig {
    pub fn new(template_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            template_path: template_path.into(),
            output_path: output_path.into(),
            ..Self::default()
        }
    }

    /// Reads a JSON config file. The result is not validated.
    pub fn from_json_file(path: &Path) -> Result<Self, WatermarkError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            WatermarkError::InvalidConfig(format!("cannot read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            WatermarkError::InvalidConfig(format!("cannot parse {}: {e}", path.display()))
        })
    }

    pub fn validate(&self) -> Result<(), WatermarkError> {
        let invalid = |msg: String| Err(WatermarkError::InvalidConfig(msg));

        if self.template_path.as_os_str().is_empty() {
            return invalid("template path is required".to_string());
        }
        if self.output_path.as_os_str().is_empty() {
            return invalid("output path is required".to_string());
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return invalid(format!(
                "threshold must be within [0, 1], got {}",
                self.threshold
            ));
        }
        if self.inpaint_radius == 0 {
            return invalid("inpaint radius must be >= 1".to_string());
        }
        if self.channel_capacity == 0 {
            return invalid("channel capacity must be >= 1".to_string());
        }
        if let RelocalizationPolicy::Refine { interval: 0 } = self.relocalization {
            return invalid("refine interval must be >= 1".to_string());
        }
        Ok(())
    }
}
