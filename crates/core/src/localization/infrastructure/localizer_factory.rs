use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::localization::domain::localizer::Localizer;

use super::fft_ncc_localizer::FftNccLocalizer;
use super::ncc_localizer::NccLocalizer;

/// Correlation strategy preference.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocalizerKind {
    /// Spatial-domain correlation.
    #[default]
    Direct,
    /// Frequency-domain correlation, faster for large templates.
    Fft,
}

impl fmt::Display for LocalizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalizerKind::Direct => write!(f, "direct"),
            LocalizerKind::Fft => write!(f, "fft"),
        }
    }
}

impl FromStr for LocalizerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "direct" => Ok(LocalizerKind::Direct),
            "fft" => Ok(LocalizerKind::Fft),
            other => Err(format!("Localizer must be 'direct' or 'fft', got '{other}'")),
        }
    }
}

pub fn create_localizer(kind: LocalizerKind) -> Box<dyn Localizer> {
    log::info!("Using {kind} correlation localizer");
    match kind {
        LocalizerKind::Direct => Box::new(NccLocalizer::new()),
        LocalizerKind::Fft => Box::new(FftNccLocalizer::new()),
    }
}
