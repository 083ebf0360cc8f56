use serde::{Deserialize, Serialize};

use crate::localization::domain::localizer::Localizer;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::error::WatermarkError;
use crate::shared::frame::Frame;
use crate::template::domain::template::Template;

/// When, after the first frame, the localizer runs again.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "mode")]
pub enum RelocalizationPolicy {
    /// Localize once; the box is fixed for the rest of the clip.
    #[default]
    Static,
    /// Re-run every `interval` frames and keep the more confident box.
    Refine { interval: usize },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StabilizerState {
    Uninitialized,
    Located(BoundingBox),
}

/// Decides per frame whether to localize or reuse the last accepted box.
///
/// The first frame is always localized and must clear the threshold. Once
/// located the stabilizer never returns to `Uninitialized`; later frames
/// reuse the stored box, optionally refined per [`RelocalizationPolicy`].
pub struct BboxStabilizer {
    localizer: Box<dyn Localizer>,
    policy: RelocalizationPolicy,
    state: StabilizerState,
    frames_seen: usize,
    localization_calls: usize,
}

impl BboxStabilizer {
    pub fn new(
        localizer: Box<dyn Localizer>,
        policy: RelocalizationPolicy,
    ) -> Result<Self, WatermarkError> {
        if let RelocalizationPolicy::Refine { interval: 0 } = policy {
            return Err(WatermarkError::InvalidConfig(
                "refine interval must be >= 1".to_string(),
            ));
        }
        Ok(Self {
            localizer,
            policy,
            state: StabilizerState::Uninitialized,
            frames_seen: 0,
            localization_calls: 0,
        })
    }

    pub fn state(&self) -> StabilizerState {
        self.state
    }

    /// How many times the wrapped localizer has run.
    pub fn localization_calls(&self) -> usize {
        self.localization_calls
    }

    pub fn resolve(
        &mut self,
        frame: &Frame,
        template: &Template,
        threshold: f64,
    ) -> Result<BoundingBox, WatermarkError> {
        let frame_number = self.frames_seen;
        self.frames_seen += 1;

        match self.state {
            StabilizerState::Uninitialized => {
                let found = self.locate(frame, template)?;
                if found.confidence < threshold {
                    return Err(WatermarkError::WatermarkNotFound {
                        confidence: found.confidence,
                        threshold,
                    });
                }
                log::info!(
                    "Watermark located at ({}, {}) size {}x{} with confidence {:.3}",
                    found.x,
                    found.y,
                    found.width,
                    found.height,
                    found.confidence
                );
                self.state = StabilizerState::Located(found);
                Ok(found)
            }
            StabilizerState::Located(stored) => match self.policy {
                RelocalizationPolicy::Static => Ok(stored),
                RelocalizationPolicy::Refine { interval } => {
                    if frame_number % interval != 0 {
                        return Ok(stored);
                    }
                    let candidate = self.locate(frame, template)?;
                    if candidate.confidence >= threshold
                        && candidate.confidence >= stored.confidence
                    {
                        if !candidate.same_region(&stored) {
                            log::debug!(
                                "Frame {}: watermark moved to ({}, {}), confidence {:.3}",
                                frame.index(),
                                candidate.x,
                                candidate.y,
                                candidate.confidence
                            );
                        }
                        self.state = StabilizerState::Located(candidate);
                        Ok(candidate)
                    } else {
                        Ok(stored)
                    }
                }
            },
        }
    }

    fn locate(&mut self, frame: &Frame, template: &Template) -> Result<BoundingBox, WatermarkError> {
        self.localization_calls += 1;
        self.localizer.locate(frame, template)
    }
}
