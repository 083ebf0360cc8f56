use std::sync::Arc;
use std::time::Instant;

use crate::inpainting::domain::inpainter::Inpainter;
use crate::inpainting::infrastructure::telea_inpainter::TeleaInpainter;
use crate::localization::domain::bbox_stabilizer::{BboxStabilizer, StabilizerState};
use crate::localization::domain::localizer::Localizer;
use crate::localization::infrastructure::localizer_factory::create_localizer;
use crate::masking::domain::mask_builder::MaskBuilder;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::error::WatermarkError;
use crate::shared::frame::Frame;
use crate::template::domain::template::Template;

use super::pipeline_config::PipelineConfig;
use super::pipeline_logger::{PipelineLogger, STAGE_INPAINT, STAGE_LOCALIZE, STAGE_MASK};

/// Wall-clock cost of the last cleaned frame, in milliseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StageTimings {
    pub localize_ms: f64,
    pub mask_ms: f64,
    pub inpaint_ms: f64,
}

impl StageTimings {
    pub fn report(&self, logger: &mut dyn PipelineLogger) {
        logger.timing(STAGE_LOCALIZE, self.localize_ms);
        logger.timing(STAGE_MASK, self.mask_ms);
        logger.timing(STAGE_INPAINT, self.inpaint_ms);
    }
}

/// Localize or reuse, mask, inpaint: everything that happens to one frame
/// between decode and encode.
///
/// Owns the only cross-frame state of a run (the stabilizer), so one
/// cleaner serves exactly one clip.
pub struct FrameCleaner {
    template: Arc<Template>,
    stabilizer: BboxStabilizer,
    mask_builder: MaskBuilder,
    inpainter: Box<dyn Inpainter>,
    threshold: f64,
    timings: StageTimings,
}

impl FrameCleaner {
    pub fn new(
        template: Arc<Template>,
        localizer: Box<dyn Localizer>,
        inpainter: Box<dyn Inpainter>,
        config: &PipelineConfig,
    ) -> Result<Self, WatermarkError> {
        Ok(Self {
            template,
            stabilizer: BboxStabilizer::new(localizer, config.relocalization)?,
            mask_builder: MaskBuilder::new(config.dilation_radius),
            inpainter,
            threshold: config.threshold,
            timings: StageTimings::default(),
        })
    }

    /// Cleaner with the localizer and inpainter the config asks for.
    pub fn from_config(
        template: Arc<Template>,
        config: &PipelineConfig,
    ) -> Result<Self, WatermarkError> {
        Self::new(
            template,
            create_localizer(config.localizer),
            Box::new(TeleaInpainter::new(config.inpaint_radius)),
            config,
        )
    }

    pub fn clean(&mut self, frame: &Frame) -> Result<Frame, WatermarkError> {
        let start = Instant::now();
        let bbox = self
            .stabilizer
            .resolve(frame, &self.template, self.threshold)?;
        let localize_ms = elapsed_ms(start);

        let start = Instant::now();
        let mask = self
            .mask_builder
            .build(&bbox, frame.width(), frame.height());
        let mask_ms = elapsed_ms(start);

        let start = Instant::now();
        let cleaned = self.inpainter.inpaint(frame, &mask)?;
        let inpaint_ms = elapsed_ms(start);

        self.timings = StageTimings {
            localize_ms,
            mask_ms,
            inpaint_ms,
        };
        Ok(cleaned)
    }

    /// Box used for the most recently cleaned frame.
    pub fn current_box(&self) -> Option<BoundingBox> {
        match self.stabilizer.state() {
            StabilizerState::Located(bbox) => Some(bbox),
            StabilizerState::Uninitialized => None,
        }
    }

    pub fn localization_calls(&self) -> usize {
        self.stabilizer.localization_calls()
    }

    pub fn timings(&self) -> StageTimings {
        self.timings
    }
}

pub(crate) fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
