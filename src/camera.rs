//! Camera configuration accessor.
//!
//! The capture hardware lives outside this process.  The responder only asks
//! it for the values it reports in media answers; it never drives capture.

use crate::config::ResponderConfig;

/// Video source area in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoBounds {
    pub left:   u32,
    pub top:    u32,
    pub width:  u32,
    pub height: u32,
}

/// Current encoder settings of the single outbound stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncoderSettings {
    pub width:            u32,
    pub height:           u32,
    pub quality:          f32,
    pub frame_rate_limit: u32,
    /// 0 = no bitrate limit.
    pub bitrate_limit:    u32,
}

/// Read access to the camera's current configuration.
pub trait Camera {
    fn video_bounds(&self) -> VideoBounds;
    fn encoder_settings(&self) -> EncoderSettings;
}

/// A camera whose settings never change after startup.
#[derive(Debug, Clone)]
pub struct StaticCamera {
    bounds:  VideoBounds,
    encoder: EncoderSettings,
}

impl StaticCamera {
    pub fn from_config(cfg: &ResponderConfig) -> Self {
        Self {
            bounds: VideoBounds {
                left:   0,
                top:    0,
                width:  cfg.width,
                height: cfg.height,
            },
            encoder: EncoderSettings {
                width:            cfg.width,
                height:           cfg.height,
                quality:          cfg.quality,
                frame_rate_limit: cfg.frame_rate_limit,
                bitrate_limit:    0,
            },
        }
    }
}

impl Camera for StaticCamera {
    fn video_bounds(&self) -> VideoBounds {
        self.bounds
    }

    fn encoder_settings(&self) -> EncoderSettings {
        self.encoder
    }
}
