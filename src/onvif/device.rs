//! Device service (`tds`): identity and service capabilities.

use crate::config::ResponderConfig;

use super::soap::{build_response, xml_escape};
use super::{not_implemented, unsupported_in, Action, Service};

pub const DEVICE_SERVICE_PATH:  &str = "/onvif/device_service";
pub const MEDIA_SERVICE_PATH:   &str = "/onvif/media_service";
pub const IMAGING_SERVICE_PATH: &str = "/onvif/imaging_service";

pub fn handle(cfg: &ResponderConfig, action: Action) -> String {
    match action {
        Action::GetDeviceInformation => get_device_information(cfg),
        Action::GetCapabilities      => get_capabilities(cfg),
        Action::GetNetworkInterfaces
        | Action::GetSystemDateAndTime => not_implemented(),
        _ => unsupported_in(Service::Device),
    }
}

/// Static identity of the device.
pub fn get_device_information(cfg: &ResponderConfig) -> String {
    let body = format!(
        r#"
            <tds:Manufacturer>{}</tds:Manufacturer>
            <tds:Model>{}</tds:Model>
            <tds:FirmwareVersion>{}</tds:FirmwareVersion>
            <tds:SerialNumber>{}</tds:SerialNumber>
            <tds:HardwareId>{}</tds:HardwareId>
        "#,
        xml_escape(&cfg.manufacturer),
        xml_escape(&cfg.model),
        xml_escape(&cfg.firmware_version),
        xml_escape(&cfg.serial_number),
        xml_escape(&cfg.hardware_id),
    );
    build_response("tds:GetDeviceInformationResponse", &body)
}

/// Service addresses and capability flags.  Only RTP over TCP and RTSP over
/// TCP streaming are advertised.
pub fn get_capabilities(cfg: &ResponderConfig) -> String {
    let base = cfg.service_base();
    let body = format!(
        r#"
            <tds:Capabilities>
                <tt:Device>
                    <tt:XAddr>{base}{DEVICE_SERVICE_PATH}</tt:XAddr>
                    <tt:Network>
                        <tt:IPFilter>false</tt:IPFilter>
                        <tt:ZeroConfiguration>false</tt:ZeroConfiguration>
                        <tt:IPVersion6>false</tt:IPVersion6>
                        <tt:DynDNS>false</tt:DynDNS>
                    </tt:Network>
                    <tt:System>
                        <tt:DiscoveryResolve>false</tt:DiscoveryResolve>
                        <tt:DiscoveryBye>false</tt:DiscoveryBye>
                        <tt:RemoteDiscovery>false</tt:RemoteDiscovery>
                        <tt:SystemBackup>false</tt:SystemBackup>
                        <tt:SystemLogging>false</tt:SystemLogging>
                        <tt:FirmwareUpgrade>false</tt:FirmwareUpgrade>
                    </tt:System>
                </tt:Device>
                <tt:Media>
                    <tt:XAddr>{base}{MEDIA_SERVICE_PATH}</tt:XAddr>
                    <tt:StreamingCapabilities>
                        <tt:RTPMulticast>false</tt:RTPMulticast>
                        <tt:RTP_TCP>true</tt:RTP_TCP>
                        <tt:RTP_RTSP_TCP>true</tt:RTP_RTSP_TCP>
                    </tt:StreamingCapabilities>
                </tt:Media>
                <tt:Imaging>
                    <tt:XAddr>{base}{IMAGING_SERVICE_PATH}</tt:XAddr>
                </tt:Imaging>
            </tds:Capabilities>
        "#
    );
    build_response("tds:GetCapabilitiesResponse", &body)
}
