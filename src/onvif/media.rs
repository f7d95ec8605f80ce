//! Media service (`trt`): the single fixed profile and its stream URI.

use log::debug;

use crate::camera::Camera;
use crate::config::ResponderConfig;

use super::request::SoapRequest;
use super::soap::{build_response, xml_escape};
use super::{not_implemented, unsupported_in, Action, Service};

const VIDEO_SOURCE_CONFIG_TOKEN:  &str = "VideoSourceConfig_1";
const VIDEO_ENCODER_CONFIG_TOKEN: &str = "VideoEncoderConfig_1";

pub fn handle(
    cfg:    &ResponderConfig,
    camera: &dyn Camera,
    action: Action,
    req:    &SoapRequest,
) -> String {
    match action {
        Action::GetProfiles  => get_profiles(cfg, camera),
        Action::GetStreamUri => {
            if let Some(token) = req.profile_token().filter(|t| *t != cfg.profile_token) {
                debug!("GetStreamUri for unknown profile {token}, answering {}", cfg.profile_token);
            }
            get_stream_uri(cfg)
        }
        Action::GetVideoSources
        | Action::GetVideoSourceConfigurations => not_implemented(),
        _ => unsupported_in(Service::Media),
    }
}

/// The one non-removable profile: a JPEG encoder over the full video source.
pub fn get_profiles(cfg: &ResponderConfig, camera: &dyn Camera) -> String {
    let bounds  = camera.video_bounds();
    let encoder = camera.encoder_settings();
    let profile = xml_escape(&cfg.profile_token);
    let source  = xml_escape(&cfg.video_source_token);

    let body = format!(
        r#"
            <trt:Profiles token="{profile}" fixed="true">
                <tt:Name>{profile}</tt:Name>
                <tt:VideoSourceConfiguration token="{VIDEO_SOURCE_CONFIG_TOKEN}">
                    <tt:Name>{VIDEO_SOURCE_CONFIG_TOKEN}</tt:Name>
                    <tt:UseCount>1</tt:UseCount>
                    <tt:SourceToken>{source}</tt:SourceToken>
                    <tt:Bounds>
                        <tt:left>{}</tt:left>
                        <tt:top>{}</tt:top>
                        <tt:width>{}</tt:width>
                        <tt:height>{}</tt:height>
                    </tt:Bounds>
                </tt:VideoSourceConfiguration>
                <tt:VideoEncoderConfiguration token="{VIDEO_ENCODER_CONFIG_TOKEN}">
                    <tt:Name>{VIDEO_ENCODER_CONFIG_TOKEN}</tt:Name>
                    <tt:UseCount>1</tt:UseCount>
                    <tt:Encoding>JPEG</tt:Encoding>
                    <tt:Resolution>
                        <tt:Width>{}</tt:Width>
                        <tt:Height>{}</tt:Height>
                    </tt:Resolution>
                    <tt:Quality>{}</tt:Quality>
                    <tt:RateControl>
                        <tt:FrameRateLimit>{}</tt:FrameRateLimit>
                        <tt:BitrateLimit>{}</tt:BitrateLimit>
                    </tt:RateControl>
                </tt:VideoEncoderConfiguration>
            </trt:Profiles>
        "#,
        bounds.left,
        bounds.top,
        bounds.width,
        bounds.height,
        encoder.width,
        encoder.height,
        encoder.quality,
        encoder.frame_rate_limit,
        encoder.bitrate_limit,
    );
    build_response("trt:GetProfilesResponse", &body)
}

/// RTSP location of the stream.  There is only one profile, so the requested
/// token never changes the answer.
pub fn get_stream_uri(cfg: &ResponderConfig) -> String {
    let body = format!(
        r#"
            <trt:MediaUri>
                <tt:Uri>{}</tt:Uri>
                <tt:InvalidAfterConnect>false</tt:InvalidAfterConnect>
                <tt:InvalidAfterReboot>false</tt:InvalidAfterReboot>
                <tt:Timeout>PT{}S</tt:Timeout>
            </trt:MediaUri>
        "#,
        xml_escape(&cfg.stream_uri()),
        cfg.uri_timeout_secs,
    );
    build_response("trt:GetStreamUriResponse", &body)
}
