use super::{envelope, escape, NS_DN, NS_WSA, NS_WSD};
use crate::device::DeviceContext;
use crate::utils::DiscoveryMessage;

use uuid::Uuid;

const ACTION_PROBE_MATCHES: &str = "http://schemas.xmlsoap.org/ws/2005/04/discovery/ProbeMatches";
const ACTION_HELLO: &str = "http://schemas.xmlsoap.org/ws/2005/04/discovery/Hello";
const ACTION_BYE: &str = "http://schemas.xmlsoap.org/ws/2005/04/discovery/Bye";
const TO_ANONYMOUS: &str = "http://schemas.xmlsoap.org/ws/2004/08/addressing/role/anonymous";
const TO_DISCOVERY: &str = "urn:schemas-xmlsoap-org:ws:2005:04:discovery";
const DEVICE_TYPES: &str = "dn:NetworkVideoTransmitter";

/// Bumped whenever the advertised metadata changes
pub const METADATA_VERSION: u32 = 1;

const NAMESPACES: [(&str, &str); 3] = [("wsa", NS_WSA), ("d", NS_WSD), ("dn", NS_DN)];

/// Reply to a single Probe. Sent once, never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
#[rustfmt::skip]
pub struct ProbeMatchResponse {
    pub message_id:           Uuid,
    pub relates_to:           String,
    pub endpoint_device_id:   Uuid,
    pub x_addrs:              Vec<String>,
    pub scopes:               Vec<String>,
}

impl ProbeMatchResponse {
    /// `relates_to` is the probe's MessageID, copied verbatim.
    pub fn new(probe: &DiscoveryMessage, context: &DeviceContext) -> Self {
        ProbeMatchResponse {
            message_id: Uuid::new_v4(),
            relates_to: probe.message_id.clone(),
            endpoint_device_id: context.identity.uuid,
            x_addrs: context.x_addrs(),
            scopes: context.scopes.clone(),
        }
    }

    pub fn to_xml(&self) -> String {
        let header = format!(
            r#"
        <wsa:MessageID>urn:uuid:{}</wsa:MessageID>
        <wsa:RelatesTo>{}</wsa:RelatesTo>
        <wsa:To>{TO_ANONYMOUS}</wsa:To>
        <wsa:Action>{ACTION_PROBE_MATCHES}</wsa:Action>"#,
            self.message_id,
            escape(&self.relates_to),
        );

        let body = format!(
            r#"
        <d:ProbeMatches>
            <d:ProbeMatch>
                {}
            </d:ProbeMatch>
        </d:ProbeMatches>"#,
            endpoint_block(self.endpoint_device_id, &self.scopes, &self.x_addrs),
        );

        envelope(&NAMESPACES, Some(&header), &body)
    }
}

/// WS-Discovery AppSequence header values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[rustfmt::skip]
pub struct AppSequence {
    pub instance_id:      u64,
    pub sequence_id:      Uuid,
    pub message_number:   u64,
}

/// Multicast announcement sent while the device is discoverable
pub fn hello(context: &DeviceContext, message_id: Uuid, sequence: &AppSequence) -> String {
    let body = format!(
        r#"
        <d:Hello>
            {}
        </d:Hello>"#,
        endpoint_block(context.identity.uuid, &context.scopes, &context.x_addrs()),
    );

    envelope(
        &NAMESPACES,
        Some(&announcement_header(ACTION_HELLO, message_id, sequence)),
        &body,
    )
}

/// Multicast farewell sent once when the device leaves the network
pub fn bye(context: &DeviceContext, message_id: Uuid, sequence: &AppSequence) -> String {
    let body = format!(
        r#"
        <d:Bye>
            <wsa:EndpointReference>
                <wsa:Address>urn:uuid:{}</wsa:Address>
            </wsa:EndpointReference>
        </d:Bye>"#,
        context.identity.uuid,
    );

    envelope(
        &NAMESPACES,
        Some(&announcement_header(ACTION_BYE, message_id, sequence)),
        &body,
    )
}

fn announcement_header(action: &str, message_id: Uuid, sequence: &AppSequence) -> String {
    format!(
        r#"
        <wsa:MessageID>urn:uuid:{message_id}</wsa:MessageID>
        <wsa:To>{TO_DISCOVERY}</wsa:To>
        <wsa:Action>{action}</wsa:Action>
        <d:AppSequence InstanceId="{}" SequenceId="urn:uuid:{}" MessageNumber="{}"/>"#,
        sequence.instance_id, sequence.sequence_id, sequence.message_number,
    )
}

fn endpoint_block(device_id: Uuid, scopes: &[String], x_addrs: &[String]) -> String {
    format!(
        r#"<wsa:EndpointReference>
                    <wsa:Address>urn:uuid:{device_id}</wsa:Address>
                </wsa:EndpointReference>
                <d:Types>{DEVICE_TYPES}</d:Types>
                <d:Scopes>{}</d:Scopes>
                <d:XAddrs>{}</d:XAddrs>
                <d:MetadataVersion>{METADATA_VERSION}</d:MetadataVersion>"#,
        escape(&scopes.join(" ")),
        escape(&x_addrs.join(" ")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::tests::sample_context;
    use crate::utils::{inspect_envelope, element_text};

    fn probe(message_id: &str) -> DiscoveryMessage {
        DiscoveryMessage {
            message_id: message_id.to_string(),
            action: String::new(),
            body_element: "Probe".to_string(),
            raw_envelope: String::new(),
        }
    }

    #[test]
    fn probe_match_relates_to_the_probe() {
        let context = sample_context();
        let reply = ProbeMatchResponse::new(&probe("uuid:1234"), &context);
        let xml = reply.to_xml();

        assert_eq!(element_text(xml.as_bytes(), "RelatesTo", None, true), ["uuid:1234"]);
        assert_eq!(
            element_text(xml.as_bytes(), "XAddrs", None, true),
            ["http://10.0.0.5:8080/onvif/device_service"]
        );
        assert_eq!(
            element_text(xml.as_bytes(), "Address", Some("EndpointReference"), true),
            ["urn:uuid:5f0c1a2e-8c4b-4d43-9d0e-6a1b2c3d4e5f"]
        );
        assert_eq!(element_text(xml.as_bytes(), "MetadataVersion", None, true), ["1"]);

        let summary = inspect_envelope(xml.as_bytes()).unwrap();
        assert_eq!(summary.message_id, Some(format!("urn:uuid:{}", reply.message_id)));
        assert_eq!(summary.body_element.as_deref(), Some("ProbeMatches"));
    }

    #[test]
    fn each_probe_match_gets_a_fresh_message_id() {
        let context = sample_context();
        let first = ProbeMatchResponse::new(&probe("uuid:1"), &context);
        let second = ProbeMatchResponse::new(&probe("uuid:1"), &context);

        assert_ne!(first.message_id, second.message_id);
    }

    #[test]
    fn hostile_message_ids_stay_inside_relates_to() {
        let context = sample_context();
        let reply = ProbeMatchResponse::new(&probe("uuid:<x>&"), &context).to_xml();

        assert_eq!(element_text(reply.as_bytes(), "RelatesTo", None, true), ["uuid:<x>&"]);
    }

    #[test]
    fn hello_and_bye_carry_the_app_sequence() {
        let context = sample_context();
        let sequence = AppSequence {
            instance_id: 7,
            sequence_id: Uuid::new_v4(),
            message_number: 3,
        };

        let hello = hello(&context, Uuid::new_v4(), &sequence);
        let summary = inspect_envelope(hello.as_bytes()).unwrap();
        assert_eq!(summary.body_element.as_deref(), Some("Hello"));
        assert_eq!(summary.action.as_deref(), Some(ACTION_HELLO));
        assert!(hello.contains(r#"InstanceId="7""#));
        assert!(hello.contains(r#"MessageNumber="3""#));

        let bye = bye(&context, Uuid::new_v4(), &sequence);
        let summary = inspect_envelope(bye.as_bytes()).unwrap();
        assert_eq!(summary.body_element.as_deref(), Some("Bye"));
        assert_eq!(summary.action.as_deref(), Some(ACTION_BYE));
        assert!(element_text(bye.as_bytes(), "XAddrs", None, true).is_empty());
    }
}
