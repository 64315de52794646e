//! Canned SOAP payloads.
//!
//! Everything here is a pure function of its inputs. Element and attribute
//! names follow what existing ONVIF client tooling expects and should not be
//! renamed.

pub mod device;
pub mod discovery;
pub mod media;

use crate::soap::{RequestContext, SoapAction};
use std::borrow::Cow;

pub const NS_SOAP: &str = "http://www.w3.org/2003/05/soap-envelope";
pub const NS_WSA: &str = "http://schemas.xmlsoap.org/ws/2004/08/addressing";
pub const NS_WSD: &str = "http://schemas.xmlsoap.org/ws/2005/04/discovery";
pub const NS_DN: &str = "http://www.onvif.org/ver10/network/wsdl";
pub const NS_TDS: &str = "http://www.onvif.org/ver10/device/wsdl";
pub const NS_TRT: &str = "http://www.onvif.org/ver10/media/wsdl";
pub const NS_TT: &str = "http://www.onvif.org/ver10/schema";
pub const NS_TEV: &str = "http://www.onvif.org/ver10/events/wsdl";
pub const NS_TIMG: &str = "http://www.onvif.org/ver20/imaging/wsdl";
pub const NS_TPTZ: &str = "http://www.onvif.org/ver20/ptz/wsdl";

/// Renders the reply body for one action
pub type ResponseBuilder = fn(&RequestContext) -> String;

/// The fixed action table. `None` for actions this device does not serve.
pub fn builder_for(action: SoapAction) -> Option<ResponseBuilder> {
    let builder: ResponseBuilder = match action {
        SoapAction::GetSystemDateAndTime => device::system_date_and_time,
        SoapAction::GetCapabilities => device::capabilities,
        SoapAction::GetServices => device::services,
        SoapAction::GetDeviceInformation => device::device_information,
        SoapAction::GetProfiles => media::profiles,
        SoapAction::GetStreamUri => media::stream_uri,
        SoapAction::Unknown => return None,
    };

    Some(builder)
}

/// Wraps `body` (and an optional `header`) in a SOAP 1.2 envelope using the
/// `env` prefix plus the given `(prefix, uri)` declarations.
pub(crate) fn envelope(namespaces: &[(&str, &str)], header: Option<&str>, body: &str) -> String {
    let xmlns: String = namespaces
        .iter()
        .map(|(prefix, uri)| format!(" xmlns:{prefix}=\"{uri}\""))
        .collect();

    let header = match header {
        Some(header) => format!("\n    <env:Header>{header}\n    </env:Header>"),
        None => String::new(),
    };

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<env:Envelope xmlns:env="{NS_SOAP}"{xmlns}>{header}
    <env:Body>{body}
    </env:Body>
</env:Envelope>"#
    )
}

pub(crate) fn escape(text: &str) -> Cow<'_, str> {
    xml::escape::escape_str_pcdata(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::body_action;

    #[test]
    fn every_known_action_has_a_builder() {
        let known = [
            SoapAction::GetSystemDateAndTime,
            SoapAction::GetCapabilities,
            SoapAction::GetServices,
            SoapAction::GetDeviceInformation,
            SoapAction::GetProfiles,
            SoapAction::GetStreamUri,
        ];

        for action in known {
            assert!(builder_for(action).is_some(), "{action:?}");
        }
        assert!(builder_for(SoapAction::Unknown).is_none());
    }

    #[test]
    fn envelope_is_well_formed() {
        let xml = envelope(
            &[("tds", NS_TDS)],
            Some("<tds:Marker/>"),
            "<tds:Reply>a &amp; b</tds:Reply>",
        );

        assert_eq!(body_action(xml.as_bytes()).unwrap(), "Reply");
    }

    #[test]
    fn text_is_escaped() {
        assert_eq!(escape("AT&T <cam>"), "AT&amp;T &lt;cam&gt;");
    }
}
