// Types module - feature selection flags and the extracted vector

use serde::{Deserialize, Serialize};

use crate::config::FeatureConfig;

/// Which sub-vectors to compute
///
/// The output order is always MFCC, chroma, mel regardless of which are set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSelection {
    pub mfcc: bool,
    pub chroma: bool,
    pub mel: bool,
}

impl FeatureSelection {
    pub const ALL: Self = Self {
        mfcc: true,
        chroma: true,
        mel: true,
    };

    pub const NONE: Self = Self {
        mfcc: false,
        chroma: false,
        mel: false,
    };

    pub fn any(&self) -> bool {
        self.mfcc || self.chroma || self.mel
    }

    /// Length of the vector this selection produces
    pub fn dimension(&self, config: &FeatureConfig) -> usize {
        let mut len = 0;
        if self.mfcc {
            len += config.n_mfcc;
        }
        if self.chroma {
            len += config.n_chroma;
        }
        if self.mel {
            len += config.n_mels;
        }
        len
    }
}

impl Default for FeatureSelection {
    fn default() -> Self {
        Self::ALL
    }
}

/// Concatenated, frame-averaged feature vector
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    pub values: Vec<f32>,
    pub selection: FeatureSelection,
}

impl FeatureVector {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f32> {
        self.values
    }
}
