//! Imaging service (`timg`).  Recognised, but no imaging control is offered:
//! every known action answers with a server fault.

use super::{not_implemented, unsupported_in, Action, Service};

pub fn handle(action: Action) -> String {
    match action {
        Action::GetImagingSettings
        | Action::SetImagingSettings
        | Action::GetImagingOptions => not_implemented(),
        _ => unsupported_in(Service::Imaging),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imaging_options_not_implemented() {
        let doc = handle(Action::GetImagingOptions);
        assert!(doc.contains("<soap:Value>soap:Server</soap:Value>"));
        assert!(doc.contains("<soap:Text>Not implemented</soap:Text>"));
    }
}
