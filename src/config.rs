//! Responder configuration file parser.
//!
//! Parses a `key = value` file (`#` comments).  Every key is optional; the
//! compiled-in defaults describe the stock ESP32-CAM identity and its single
//! 640x480 MJPEG stream.

use std::fs;
use std::path::{Path, PathBuf};

use url::Url;

use crate::error::{OnvifError, Result};

// Default ports and stream parameters
const PORT:             u16 = 8080;
const RTSP_PORT:        u16 = 554;
const WIDTH:            u32 = 640;
const HEIGHT:           u32 = 480;
const QUALITY:          f32 = 0.8;
const FRAME_RATE_LIMIT: u32 = 5;
const URI_TIMEOUT:      u32 = 60;
const TICK_MS:          u64 = 10;
const WRITE_TIMEOUT_MS: u64 = 2000;

/// Full responder configuration.  Built once at startup, then shared
/// read-only with the connection manager and the service handlers.
#[derive(Debug, Clone)]
pub struct ResponderConfig {
    // ── Network ───────────────────────────────────────────────────────────────
    /// Local address the SOAP listener binds to.
    pub bind_addr: String,
    /// SOAP/HTTP listening port (default 8080).
    pub port: u16,
    /// Host written into service and stream URIs.  Auto-detected when empty.
    pub advertise_host: String,
    // ── Media stream (served elsewhere, only referenced here) ─────────────────
    pub rtsp_port: u16,
    pub rtsp_path: String,
    /// Validity of a `GetStreamUri` answer, in seconds.
    pub uri_timeout_secs: u32,
    // ── Device identity ───────────────────────────────────────────────────────
    pub manufacturer:     String,
    pub model:            String,
    pub firmware_version: String,
    pub serial_number:    String,
    pub hardware_id:      String,
    // ── Media profile ─────────────────────────────────────────────────────────
    /// Token of the single, fixed media profile.
    pub profile_token:      String,
    pub video_source_token: String,
    pub width:              u32,
    pub height:             u32,
    /// JPEG quality in `0.0..=1.0`.
    pub quality:            f32,
    pub frame_rate_limit:   u32,
    // ── Process ───────────────────────────────────────────────────────────────
    /// Interval between connection-manager ticks, in milliseconds.
    pub tick_ms:          u64,
    /// Upper bound on writing one response; must be non-zero.
    pub write_timeout_ms: u64,
    /// PID file path; empty disables it.
    pub pid_file:   PathBuf,
    pub log_syslog: bool,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            bind_addr:          "0.0.0.0".to_string(),
            port:               PORT,
            advertise_host:     String::new(),
            rtsp_port:          RTSP_PORT,
            rtsp_path:          "/mjpeg/1".to_string(),
            uri_timeout_secs:   URI_TIMEOUT,
            manufacturer:       "ESP32-CAM".to_string(),
            model:              "ESP32-CAM-RTSP-ONVIF".to_string(),
            firmware_version:   "2.0".to_string(),
            serial_number:      "ESP32CAM".to_string(),
            hardware_id:        "ESP32-CAM".to_string(),
            profile_token:      "Profile_1".to_string(),
            video_source_token: "VideoSource_1".to_string(),
            width:              WIDTH,
            height:             HEIGHT,
            quality:            QUALITY,
            frame_rate_limit:   FRAME_RATE_LIMIT,
            tick_ms:            TICK_MS,
            write_timeout_ms:   WRITE_TIMEOUT_MS,
            pid_file:           PathBuf::new(),
            log_syslog:         false,
        }
    }
}

impl ResponderConfig {
    /// Base URL of this responder's SOAP services, e.g. `http://10.0.0.5:8080`.
    pub fn service_base(&self) -> String {
        format!("http://{}:{}", host_for_uri(&self.advertise_host), self.port)
    }

    /// Full RTSP URI of the single media stream.
    pub fn stream_uri(&self) -> String {
        format!(
            "rtsp://{}:{}{}",
            host_for_uri(&self.advertise_host),
            self.rtsp_port,
            self.rtsp_path
        )
    }
}

/// Bracket bare IPv6 literals so they can sit in front of `:port`.
fn host_for_uri(host: &str) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]")
    } else {
        host.to_string()
    }
}

fn parse_bool(val: &str) -> bool {
    val == "true" || val == "1" || val == "yes"
}

/// Parse `path` as a responder `key = value` configuration file.
pub fn load_config(path: &Path) -> Result<ResponderConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| OnvifError::Config(format!("cannot read {}: {e}", path.display())))?;
    Ok(parse_config(&content))
}

/// Apply every recognised `key = value` line of `content` over the defaults.
pub fn parse_config(content: &str) -> ResponderConfig {
    let mut cfg = ResponderConfig::default();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, val)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let val = val.trim().to_string();
        if val.is_empty() {
            continue;
        }

        match key.as_str() {
            "bind_addr"          => cfg.bind_addr          = val,
            "port"               => cfg.port               = val.parse().unwrap_or(PORT),
            "advertise_host"     => cfg.advertise_host     = val,
            "rtsp_port"          => cfg.rtsp_port          = val.parse().unwrap_or(RTSP_PORT),
            "rtsp_path"          => cfg.rtsp_path          = val,
            "uri_timeout_secs"   => cfg.uri_timeout_secs   = val.parse().unwrap_or(URI_TIMEOUT),
            "manufacturer"       => cfg.manufacturer       = val,
            "model"              => cfg.model              = val,
            "firmware_version"   => cfg.firmware_version   = val,
            "serial_number"      => cfg.serial_number      = val,
            "hardware_id"        => cfg.hardware_id        = val,
            "profile_token"      => cfg.profile_token      = val,
            "video_source_token" => cfg.video_source_token = val,
            "width"              => cfg.width              = val.parse().unwrap_or(WIDTH),
            "height"             => cfg.height             = val.parse().unwrap_or(HEIGHT),
            "quality"            => cfg.quality            = val.parse().unwrap_or(QUALITY),
            "frame_rate_limit"   => cfg.frame_rate_limit   = val.parse().unwrap_or(FRAME_RATE_LIMIT),
            "tick_ms"            => cfg.tick_ms            = val.parse().unwrap_or(TICK_MS),
            "write_timeout_ms"   => cfg.write_timeout_ms   = val.parse().unwrap_or(WRITE_TIMEOUT_MS),
            "pid_file"           => cfg.pid_file           = PathBuf::from(&val),
            "log_syslog"         => cfg.log_syslog         = parse_bool(&val),
            _ => {} // ignore unknown keys
        }
    }

    cfg
}

/// Validate that the configuration can produce well-formed answers.
pub fn validate_config(cfg: &ResponderConfig) -> Result<()> {
    if cfg.port == 0 {
        return Err(OnvifError::Config("port must be non-zero".into()));
    }
    if cfg.rtsp_port == 0 {
        return Err(OnvifError::Config("rtsp_port must be non-zero".into()));
    }
    if cfg.width == 0 || cfg.height == 0 {
        return Err(OnvifError::Config(format!(
            "invalid video bounds {}x{}",
            cfg.width, cfg.height
        )));
    }
    if !(0.0..=1.0).contains(&cfg.quality) {
        return Err(OnvifError::Config(format!(
            "quality {} outside 0.0..=1.0",
            cfg.quality
        )));
    }
    if cfg.tick_ms == 0 {
        return Err(OnvifError::Config("tick_ms must be non-zero".into()));
    }
    if cfg.write_timeout_ms == 0 {
        return Err(OnvifError::Config("write_timeout_ms must be non-zero".into()));
    }
    if cfg.profile_token.is_empty() {
        return Err(OnvifError::Config("profile_token is required".into()));
    }
    if !cfg.advertise_host.is_empty() {
        Url::parse(&cfg.service_base())?;
        Url::parse(&cfg.stream_uri())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_stock_camera() {
        let cfg = ResponderConfig::default();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.rtsp_port, 554);
        assert_eq!(cfg.manufacturer, "ESP32-CAM");
        assert_eq!((cfg.width, cfg.height), (640, 480));
        assert_eq!(cfg.frame_rate_limit, 5);
        assert!(validate_config(&cfg).is_ok());
    }

    #[test]
    fn parse_overrides_and_ignores_noise() {
        let cfg = parse_config(
            "# identity\n\
             Manufacturer = Acme\n\
             port = 9000\n\
             rtsp_port = not-a-number\n\
             bogus_key = 1\n\
             serial_number =\n\
             log_syslog = yes\n",
        );
        assert_eq!(cfg.manufacturer, "Acme");
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.rtsp_port, 554);
        assert_eq!(cfg.serial_number, "ESP32CAM");
        assert!(cfg.log_syslog);
    }

    #[test]
    fn ipv6_hosts_are_bracketed() {
        let cfg = ResponderConfig {
            advertise_host: "fe80::1".into(),
            ..ResponderConfig::default()
        };
        assert_eq!(cfg.service_base(), "http://[fe80::1]:8080");
        assert_eq!(cfg.stream_uri(), "rtsp://[fe80::1]:554/mjpeg/1");
    }

    #[test]
    fn validation_rejects_bad_values() {
        let bad_quality = ResponderConfig { quality: 1.5, ..ResponderConfig::default() };
        assert!(validate_config(&bad_quality).is_err());

        let bad_port = ResponderConfig { port: 0, ..ResponderConfig::default() };
        assert!(validate_config(&bad_port).is_err());

        let unbounded_writes = parse_config("write_timeout_ms = 0\n");
        assert_eq!(unbounded_writes.write_timeout_ms, 0);
        assert!(validate_config(&unbounded_writes).is_err());

        let bad_host = ResponderConfig {
            advertise_host: "bad host".into(),
            ..ResponderConfig::default()
        };
        assert!(validate_config(&bad_host).is_err());
    }
}
