//! ONVIF device-management subset: action resolution and dispatch.
//!
//! Actions are resolved once per request by case-sensitive substring
//! containment, first against the service table and then against that
//! service's action table.  Table order is significant: the first entry
//! contained in the action identifier wins.

pub mod device;
pub mod imaging;
pub mod media;
pub mod request;
pub mod soap;

use std::sync::Arc;

use log::info;

use crate::camera::Camera;
use crate::config::ResponderConfig;

use request::SoapRequest;
use soap::{build_fault, FaultCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Device,
    Media,
    Imaging,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    // Device
    GetDeviceInformation,
    GetCapabilities,
    GetNetworkInterfaces,
    GetSystemDateAndTime,
    // Media
    GetProfiles,
    GetStreamUri,
    GetVideoSources,
    GetVideoSourceConfigurations,
    // Imaging
    GetImagingSettings,
    SetImagingSettings,
    GetImagingOptions,
}

/// Where a request's action identifier leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Action(Action),
    /// The service matched but none of its actions did.
    UnknownAction(Service),
    /// No service matched.
    Unsupported,
}

const SERVICES: &[(&str, Service)] = &[
    ("Device",  Service::Device),
    ("Media",   Service::Media),
    ("Imaging", Service::Imaging),
];

const DEVICE_ACTIONS: &[(&str, Action)] = &[
    ("GetDeviceInformation", Action::GetDeviceInformation),
    ("GetCapabilities",      Action::GetCapabilities),
    ("GetNetworkInterfaces", Action::GetNetworkInterfaces),
    ("GetSystemDateAndTime", Action::GetSystemDateAndTime),
];

const MEDIA_ACTIONS: &[(&str, Action)] = &[
    ("GetProfiles",                  Action::GetProfiles),
    ("GetStreamUri",                 Action::GetStreamUri),
    ("GetVideoSources",              Action::GetVideoSources),
    ("GetVideoSourceConfigurations", Action::GetVideoSourceConfigurations),
];

const IMAGING_ACTIONS: &[(&str, Action)] = &[
    ("GetImagingSettings", Action::GetImagingSettings),
    ("SetImagingSettings", Action::SetImagingSettings),
    ("GetImagingOptions",  Action::GetImagingOptions),
];

impl Service {
    pub fn name(self) -> &'static str {
        match self {
            Service::Device  => "Device",
            Service::Media   => "Media",
            Service::Imaging => "Imaging",
        }
    }

    fn actions(self) -> &'static [(&'static str, Action)] {
        match self {
            Service::Device  => DEVICE_ACTIONS,
            Service::Media   => MEDIA_ACTIONS,
            Service::Imaging => IMAGING_ACTIONS,
        }
    }
}

impl Action {
    pub fn service(self) -> Service {
        match self {
            Action::GetDeviceInformation
            | Action::GetCapabilities
            | Action::GetNetworkInterfaces
            | Action::GetSystemDateAndTime => Service::Device,
            Action::GetProfiles
            | Action::GetStreamUri
            | Action::GetVideoSources
            | Action::GetVideoSourceConfigurations => Service::Media,
            Action::GetImagingSettings
            | Action::SetImagingSettings
            | Action::GetImagingOptions => Service::Imaging,
        }
    }
}

fn first_match<T: Copy>(table: &[(&str, T)], action: &str) -> Option<T> {
    table
        .iter()
        .find(|(needle, _)| action.contains(needle))
        .map(|&(_, target)| target)
}

/// Resolve an action identifier to its route.
pub fn resolve(action: &str) -> Route {
    let Some(service) = first_match(SERVICES, action) else {
        return Route::Unsupported;
    };
    match first_match(service.actions(), action) {
        Some(found) => Route::Action(found),
        None        => Route::UnknownAction(service),
    }
}

/// Fault for actions that are recognised but not offered by this device.
pub fn not_implemented() -> String {
    build_fault(FaultCode::Server, "Not implemented")
}

/// Fault for an action the named service does not know.
pub fn unsupported_in(service: Service) -> String {
    build_fault(
        FaultCode::Client,
        &format!("Unsupported {} action", service.name()),
    )
}

/// Answers parsed requests with complete SOAP documents.
pub struct Responder {
    cfg:    Arc<ResponderConfig>,
    camera: Box<dyn Camera>,
}

impl Responder {
    pub fn new(cfg: Arc<ResponderConfig>, camera: Box<dyn Camera>) -> Self {
        Self { cfg, camera }
    }

    /// Build the SOAP document (success or fault) answering `req`.
    pub fn handle(&self, req: &SoapRequest) -> String {
        let route = resolve(&req.action);
        info!("ONVIF request {}: {} ({route:?})", req.path, req.action);

        match route {
            Route::Action(action) => match action.service() {
                Service::Device  => device::handle(&self.cfg, action),
                Service::Media   => media::handle(&self.cfg, self.camera.as_ref(), action, req),
                Service::Imaging => imaging::handle(action),
            },
            Route::UnknownAction(service) => unsupported_in(service),
            Route::Unsupported => build_fault(FaultCode::Client, "Unsupported action"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::StaticCamera;

    fn responder() -> Responder {
        let cfg = Arc::new(ResponderConfig {
            advertise_host: "192.168.1.100".into(),
            ..ResponderConfig::default()
        });
        let camera = Box::new(StaticCamera::from_config(&cfg));
        Responder::new(cfg, camera)
    }

    fn post(action: &str) -> SoapRequest {
        SoapRequest {
            path:   "/onvif/device_service".into(),
            action: action.into(),
            body:   String::new(),
        }
    }

    #[test]
    fn services_match_anywhere_in_the_identifier() {
        assert_eq!(
            resolve("http://www.onvif.org/ver10/device/wsdl/GetDeviceInformation"),
            Route::Action(Action::GetDeviceInformation)
        );
        assert_eq!(resolve("xxGetDeviceInformationyy"), Route::Action(Action::GetDeviceInformation));
        assert_eq!(resolve("urn:Media/GetProfiles"), Route::Action(Action::GetProfiles));
        assert_eq!(resolve("Imaging#GetImagingOptions"), Route::Action(Action::GetImagingOptions));
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert_eq!(resolve("http://www.onvif.org/ver10/media/wsdl/GetFoo"), Route::Unsupported);
        assert_eq!(resolve("getdeviceinformation"), Route::Unsupported);
    }

    #[test]
    fn service_priority_is_device_media_imaging() {
        // "Device" wins even when the identifier also names another service.
        assert_eq!(resolve("MediaDeviceGetProfiles"), Route::UnknownAction(Service::Device));
        assert_eq!(resolve("ImagingMedia/GetStreamUri"), Route::Action(Action::GetStreamUri));
    }

    #[test]
    fn unknown_action_within_service() {
        assert_eq!(resolve("DeviceGetFoo"), Route::UnknownAction(Service::Device));
        assert_eq!(resolve("Media/GetAudioSources"), Route::UnknownAction(Service::Media));
        assert_eq!(resolve("Imaging/Move"), Route::UnknownAction(Service::Imaging));
    }

    #[test]
    fn every_table_entry_routes_to_its_own_service() {
        for (_, service) in SERVICES {
            for (needle, action) in service.actions() {
                assert_eq!(action.service(), *service);
                let id = format!("{}/{needle}", service.name());
                assert_eq!(resolve(&id), Route::Action(*action), "{id}");
            }
        }
    }

    #[test]
    fn unsupported_action_is_client_fault() {
        let doc = responder().handle(&post("http://example.com/GetFoo"));
        assert!(doc.contains("<soap:Value>soap:Client</soap:Value>"));
        assert!(doc.contains("<soap:Text>Unsupported action</soap:Text>"));
    }

    #[test]
    fn empty_action_is_client_fault() {
        let doc = responder().handle(&post(""));
        assert!(doc.contains("<soap:Text>Unsupported action</soap:Text>"));
    }

    #[test]
    fn unknown_service_action_names_the_service() {
        let doc = responder().handle(&post("Device/GetFoo"));
        assert!(doc.contains("<soap:Value>soap:Client</soap:Value>"));
        assert!(doc.contains("<soap:Text>Unsupported Device action</soap:Text>"));

        let doc = responder().handle(&post("Imaging/GetFoo"));
        assert!(doc.contains("<soap:Text>Unsupported Imaging action</soap:Text>"));
    }

    #[test]
    fn stubbed_actions_are_server_faults() {
        for action in [
            "Device/GetNetworkInterfaces",
            "Device/GetSystemDateAndTime",
            "Media/GetVideoSources",
            "Media/GetVideoSourceConfigurations",
            "Imaging/GetImagingSettings",
            "Imaging/SetImagingSettings",
            "http://www.onvif.org/ver20/Imaging/wsdl/GetImagingOptions",
        ] {
            let doc = responder().handle(&post(action));
            assert!(doc.contains("<soap:Value>soap:Server</soap:Value>"), "{action}");
            assert!(doc.contains("<soap:Text>Not implemented</soap:Text>"), "{action}");
        }
    }

    #[test]
    fn device_information_is_answered() {
        let doc = responder().handle(&post(
            "http://www.onvif.org/ver10/device/wsdl/GetDeviceInformation",
        ));
        assert!(doc.contains("<tds:GetDeviceInformationResponse>"));
        assert!(doc.contains("<tds:Manufacturer>ESP32-CAM</tds:Manufacturer>"));
    }
}
