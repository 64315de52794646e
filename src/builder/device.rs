//! Device service (`tds`) responses

use super::{envelope, escape, NS_TDS, NS_TEV, NS_TIMG, NS_TPTZ, NS_TRT, NS_TT};
use crate::device::Service;
use crate::soap::RequestContext;

use chrono::{Datelike, Timelike};
use log::debug;

pub fn system_date_and_time(ctx: &RequestContext) -> String {
    debug!("[Builder][GetSystemDateAndTime] TZ {}", ctx.time_zone);
    let now = ctx.now;

    let body = format!(
        r#"
        <tds:GetSystemDateAndTimeResponse>
            <tds:SystemDateAndTime>
                <tt:DateTimeType>Manual</tt:DateTimeType>
                <tt:DaylightSavings>false</tt:DaylightSavings>
                <tt:TimeZone>
                    <tt:TZ>{}</tt:TZ>
                </tt:TimeZone>
                <tt:UTCDateTime>
                    <tt:Time>
                        <tt:Hour>{}</tt:Hour>
                        <tt:Minute>{}</tt:Minute>
                        <tt:Second>{}</tt:Second>
                    </tt:Time>
                    <tt:Date>
                        <tt:Year>{}</tt:Year>
                        <tt:Month>{}</tt:Month>
                        <tt:Day>{}</tt:Day>
                    </tt:Date>
                </tt:UTCDateTime>
            </tds:SystemDateAndTime>
        </tds:GetSystemDateAndTimeResponse>"#,
        escape(&ctx.time_zone),
        now.hour(),
        now.minute(),
        now.second(),
        now.year(),
        now.month(),
        now.day(),
    );

    envelope(&[("tds", NS_TDS), ("tt", NS_TT)], None, &body)
}

pub fn capabilities(ctx: &RequestContext) -> String {
    let endpoint = &ctx.device.endpoint;

    let body = format!(
        r#"
        <tds:GetCapabilitiesResponse>
            <tds:Capabilities>
                <tt:Analytics>
                    <tt:XAddr>{analytics}</tt:XAddr>
                    <tt:RuleSupport>true</tt:RuleSupport>
                    <tt:AnalyticsModuleSupport>true</tt:AnalyticsModuleSupport>
                </tt:Analytics>
                <tt:Device>
                    <tt:XAddr>{device}</tt:XAddr>
                    <tt:Network>
                        <tt:IPFilter>true</tt:IPFilter>
                        <tt:ZeroConfiguration>true</tt:ZeroConfiguration>
                        <tt:IPVersion6>false</tt:IPVersion6>
                        <tt:DynDNS>true</tt:DynDNS>
                        <tt:Extension>
                            <tt:Dot11Configuration>false</tt:Dot11Configuration>
                            <tt:Extension>
                                <tt:DHCPv6>true</tt:DHCPv6>
                                <tt:Dot1XConfigurations>0</tt:Dot1XConfigurations>
                            </tt:Extension>
                        </tt:Extension>
                    </tt:Network>
                    <tt:System>
                        <tt:DiscoveryResolve>false</tt:DiscoveryResolve>
                        <tt:DiscoveryBye>true</tt:DiscoveryBye>
                        <tt:RemoteDiscovery>true</tt:RemoteDiscovery>
                        <tt:SystemBackup>true</tt:SystemBackup>
                        <tt:SystemLogging>true</tt:SystemLogging>
                        <tt:FirmwareUpgrade>true</tt:FirmwareUpgrade>
                        {versions}
                        <tt:Extension>
                            <tt:HttpFirmwareUpgrade>false</tt:HttpFirmwareUpgrade>
                            <tt:HttpSystemBackup>true</tt:HttpSystemBackup>
                            <tt:HttpSystemLogging>false</tt:HttpSystemLogging>
                            <tt:HttpSupportInformation>false</tt:HttpSupportInformation>
                        </tt:Extension>
                    </tt:System>
                    <tt:IO>
                        <tt:InputConnectors>1</tt:InputConnectors>
                        <tt:RelayOutputs>1</tt:RelayOutputs>
                    </tt:IO>
                    <tt:Security>
                        <tt:TLS1.1>false</tt:TLS1.1>
                        <tt:TLS1.2>false</tt:TLS1.2>
                        <tt:OnboardKeyGeneration>false</tt:OnboardKeyGeneration>
                        <tt:AccessPolicyConfig>false</tt:AccessPolicyConfig>
                        <tt:X.509Token>false</tt:X.509Token>
                        <tt:SAMLToken>false</tt:SAMLToken>
                        <tt:KerberosToken>false</tt:KerberosToken>
                        <tt:RELToken>false</tt:RELToken>
                    </tt:Security>
                </tt:Device>
                <tt:Events>
                    <tt:XAddr>{events}</tt:XAddr>
                    <tt:WSSubscriptionPolicySupport>true</tt:WSSubscriptionPolicySupport>
                    <tt:WSPullPointSupport>true</tt:WSPullPointSupport>
                    <tt:WSPausableSubscriptionManagerInterfaceSupport>false</tt:WSPausableSubscriptionManagerInterfaceSupport>
                </tt:Events>
                <tt:Imaging>
                    <tt:XAddr>{imaging}</tt:XAddr>
                </tt:Imaging>
                <tt:Media>
                    <tt:XAddr>{media}</tt:XAddr>
                    <tt:StreamingCapabilities>
                        <tt:RTPMulticast>true</tt:RTPMulticast>
                        <tt:RTP_TCP>true</tt:RTP_TCP>
                        <tt:RTP_RTSP_TCP>true</tt:RTP_RTSP_TCP>
                    </tt:StreamingCapabilities>
                    <tt:Extension>
                        <tt:ProfileCapabilities>
                            <tt:MaximumNumberOfProfiles>10</tt:MaximumNumberOfProfiles>
                        </tt:ProfileCapabilities>
                    </tt:Extension>
                </tt:Media>
            </tds:Capabilities>
        </tds:GetCapabilitiesResponse>"#,
        analytics = endpoint.service_url(Service::Analytics),
        device = endpoint.service_url(Service::Device),
        events = endpoint.service_url(Service::Events),
        imaging = endpoint.service_url(Service::Imaging),
        media = endpoint.service_url(Service::Media),
        versions = supported_versions(&[(2, 40), (2, 20), (2, 10), (2, 0)]),
    );

    envelope(&[("tds", NS_TDS), ("tt", NS_TT)], None, &body)
}

fn supported_versions(versions: &[(u32, u32)]) -> String {
    versions
        .iter()
        .map(|(major, minor)| {
            format!(
                "<tt:SupportedVersions><tt:Major>{major}</tt:Major><tt:Minor>{minor}</tt:Minor></tt:SupportedVersions>"
            )
        })
        .collect()
}

pub fn services(ctx: &RequestContext) -> String {
    let endpoint = &ctx.device.endpoint;

    let device = service_entry(
        NS_TDS,
        &endpoint.service_url(Service::Device),
        r#"<tds:Capabilities>
                        <tds:Network DHCPv6="false" Dot11Configuration="false" Dot1XConfigurations="0" DynDNS="false" HostnameFromDHCP="true" IPFilter="true" IPVersion6="false" NTP="1" ZeroConfiguration="true"/>
                        <tds:Security AccessPolicyConfig="true" DefaultAccessPolicy="false" Dot1X="false" HttpDigest="false" KerberosToken="false" MaxUsers="10" OnboardKeyGeneration="false" RELToken="false" RemoteUserHandling="false" SAMLToken="false" TLS1.0="false" TLS1.1="false" TLS1.2="false" UsernameToken="true" X.509Token="false"/>
                        <tds:System DiscoveryBye="true" DiscoveryResolve="true" FirmwareUpgrade="false" HttpFirmwareUpgrade="false" HttpSupportInformation="false" HttpSystemBackup="false" HttpSystemLogging="false" RemoteDiscovery="false" SystemBackup="false" SystemLogging="false"/>
                    </tds:Capabilities>"#,
        (1, 70),
    );

    let events = service_entry(
        NS_TEV,
        &endpoint.service_url(Service::Events),
        r#"<tev:Capabilities MaxNotificationProducers="6" MaxPullPoints="2" PersistentNotificationStorage="false" WSPausableSubscriptionManagerInterfaceSupport="false" WSPullPointSupport="false" WSSubscriptionPolicySupport="false"/>"#,
        (1, 70),
    );

    let imaging = service_entry(
        NS_TIMG,
        &endpoint.service_url(Service::Imaging),
        r#"<timg:Capabilities ImageStabilization="false"/>"#,
        (2, 30),
    );

    let media = service_entry(
        NS_TRT,
        &endpoint.service_url(Service::Media),
        r#"<trt:Capabilities OSD="false" Rotation="false" SnapshotUri="true" VideoSourceMode="false">
                        <trt:ProfileCapabilities MaximumNumberOfProfiles="10"/>
                        <trt:StreamingCapabilities NoRTSPStreaming="false" NonAggregateControl="false" RTPMulticast="false" RTP_RTSP_TCP="true" RTP_TCP="false"/>
                    </trt:Capabilities>"#,
        (1, 70),
    );

    let ptz = service_entry(
        NS_TPTZ,
        &endpoint.service_url(Service::Ptz),
        r#"<tptz:Capabilities EFlip="false" GetCompatibleConfigurations="false" Reverse="false"/>"#,
        (2, 50),
    );

    let body = format!(
        r#"
        <tds:GetServicesResponse>{device}{events}{imaging}{media}{ptz}
        </tds:GetServicesResponse>"#
    );

    envelope(
        &[
            ("tds", NS_TDS),
            ("tev", NS_TEV),
            ("timg", NS_TIMG),
            ("tptz", NS_TPTZ),
            ("trt", NS_TRT),
            ("tt", NS_TT),
        ],
        None,
        &body,
    )
}

fn service_entry(namespace: &str, x_addr: &str, capabilities: &str, version: (u32, u32)) -> String {
    let (major, minor) = version;

    format!(
        r#"
            <tds:Service>
                <tds:Namespace>{namespace}</tds:Namespace>
                <tds:XAddr>{}</tds:XAddr>
                <tds:Capabilities>
                    {capabilities}
                </tds:Capabilities>
                <tds:Version>
                    <tt:Major>{major}</tt:Major>
                    <tt:Minor>{minor}</tt:Minor>
                </tds:Version>
            </tds:Service>"#,
        escape(x_addr),
    )
}

pub fn device_information(ctx: &RequestContext) -> String {
    let identity = &ctx.device.identity;
    debug!(
        "[Builder][GetDeviceInformation] {} {} fw {} sn {}",
        identity.manufacturer, identity.model, identity.firmware_version, identity.serial_number
    );

    let body = format!(
        r#"
        <tds:GetDeviceInformationResponse>
            <tds:Manufacturer>{}</tds:Manufacturer>
            <tds:Model>{}</tds:Model>
            <tds:FirmwareVersion>{}</tds:FirmwareVersion>
            <tds:SerialNumber>{}</tds:SerialNumber>
            <tds:HardwareId>{}</tds:HardwareId>
        </tds:GetDeviceInformationResponse>"#,
        escape(&identity.manufacturer),
        escape(&identity.model),
        escape(&identity.firmware_version),
        escape(&identity.serial_number),
        escape(&identity.hardware_id),
    );

    envelope(&[("tds", NS_TDS)], None, &body)
}
