//! Options for building a detector.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use crate::common::DecoderType;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Width of the model input image, in pixels.
    pub model_width: u32,
    /// Height of the model input image, in pixels.
    pub model_height: u32,
    /// Forces a decode backend instead of the one recommended for the device.
    pub decoder: Option<DecoderType>,
    /// Log per stage timings of every detection.
    pub profile: bool,
}

impl DetectorConfig {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_model_width(mut self, n: u32) -> Self {
        self.model_width = n;
        self
    }

    pub fn with_model_height(mut self, n: u32) -> Self {
        self.model_height = n;
        self
    }

    pub fn with_model_size(self, width: u32, height: u32) -> Self {
        self.with_model_width(width).with_model_height(height)
    }

    pub fn with_decoder(mut self, decoder: DecoderType) -> Self {
        self.decoder = Some(decoder);
        self
    }

    pub fn with_profile(mut self, profile: bool) -> Self {
        self.profile = profile;
        self
    }

    /// Checks that the model input size has been configured.
    pub fn validate(&self) -> Result<()> {
        if self.model_width == 0 || self.model_height == 0 {
            anyhow::bail!(
                "Model input size is not configured ({}x{}). Use `with_model_size(width, height)`.",
                self.model_width,
                self.model_height
            );
        }
        Ok(())
    }

    pub fn summary(&self) -> String {
        format!("Model Input Resolution: {}x{}\n\
        Decoder: {}\n\
        Profile: {}",
                self.model_width, self.model_height,
                self.decoder.map(|d| d.str()).unwrap_or("Recommended"),
                self.profile)
    }
}
