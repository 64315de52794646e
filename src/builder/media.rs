//! Media service (`trt`) responses

use super::{envelope, escape, NS_TRT, NS_TT};
use crate::device::MediaProfile;
use crate::soap::RequestContext;

use log::debug;

pub fn profiles(ctx: &RequestContext) -> String {
    let profiles: String = ctx.device.profiles.iter().map(profile_entry).collect();

    let body = format!(
        r#"
        <trt:GetProfilesResponse>{profiles}
        </trt:GetProfilesResponse>"#
    );

    envelope(&[("trt", NS_TRT), ("tt", NS_TT)], None, &body)
}

fn profile_entry(profile: &MediaProfile) -> String {
    debug!(
        "[Builder][GetProfiles] {} {}x{} @ {} bps",
        profile.token, profile.width, profile.height, profile.bitrate
    );

    format!(
        r#"
            <trt:Profiles fixed="false" token="{token}">
                <tt:Name>{name}</tt:Name>
                <tt:VideoSourceConfiguration token="VideoSourceConfiguration0_0">
                    <tt:Name>VideoSourceConfiguration0_0</tt:Name>
                    <tt:UseCount>1</tt:UseCount>
                    <tt:SourceToken>VideoSource0</tt:SourceToken>
                    <tt:Bounds height="{height}" width="{width}" x="0" y="0"/>
                </tt:VideoSourceConfiguration>
                <tt:VideoEncoderConfiguration token="VideoEncoderConfiguration0_0">
                    <tt:Name>VideoEncoderConfiguration0_0</tt:Name>
                    <tt:UseCount>1</tt:UseCount>
                    <tt:Encoding>{encoding}</tt:Encoding>
                    <tt:Resolution>
                        <tt:Width>{width}</tt:Width>
                        <tt:Height>{height}</tt:Height>
                    </tt:Resolution>
                    <tt:Quality>44.0</tt:Quality>
                    <tt:RateControl>
                        <tt:FrameRateLimit>{frame_rate}</tt:FrameRateLimit>
                        <tt:EncodingInterval>1</tt:EncodingInterval>
                        <tt:BitrateLimit>{bitrate}</tt:BitrateLimit>
                    </tt:RateControl>
                    <tt:Multicast>
                        <tt:Address>
                            <tt:Type>IPv4</tt:Type>
                            <tt:IPv4Address>0.0.0.0</tt:IPv4Address>
                        </tt:Address>
                        <tt:Port>0</tt:Port>
                        <tt:TTL>0</tt:TTL>
                        <tt:AutoStart>false</tt:AutoStart>
                    </tt:Multicast>
                    <tt:SessionTimeout>PT30S</tt:SessionTimeout>
                </tt:VideoEncoderConfiguration>
            </trt:Profiles>"#,
        token = xml::escape::escape_str_attribute(&profile.token),
        name = escape(&profile.name),
        encoding = escape(&profile.encoding),
        width = profile.width,
        height = profile.height,
        frame_rate = profile.frame_rate,
        bitrate = profile.bitrate,
    )
}

/// Every profile streams from the same RTSP root
pub fn stream_uri(ctx: &RequestContext) -> String {
    let uri = ctx.device.endpoint.stream_uri();
    debug!("[Builder][GetStreamUri] {uri}");

    let body = format!(
        r#"
        <trt:GetStreamUriResponse>
            <trt:MediaUri>
                <tt:Uri>{}</tt:Uri>
                <tt:InvalidAfterConnect>false</tt:InvalidAfterConnect>
                <tt:InvalidAfterReboot>false</tt:InvalidAfterReboot>
                <tt:Timeout>P1Y</tt:Timeout>
            </trt:MediaUri>
        </trt:GetStreamUriResponse>"#,
        escape(&uri),
    );

    envelope(&[("trt", NS_TRT), ("tt", NS_TT)], None, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::tests::sample_context;
    use crate::device::DeviceContext;
    use crate::utils::element_text;

    use chrono::Utc;
    use std::net::Ipv4Addr;

    fn request(device: &DeviceContext) -> RequestContext<'_> {
        RequestContext {
            now: Utc::now(),
            time_zone: "UTC0".to_string(),
            device,
        }
    }

    #[test]
    fn stream_uri_is_rtsp_root() {
        let mut device = sample_context();
        device.endpoint.ip = Ipv4Addr::new(10, 0, 0, 5);
        device.endpoint.rtsp_port = 8086;

        let xml = stream_uri(&request(&device));

        assert_eq!(
            element_text(xml.as_bytes(), "Uri", Some("MediaUri"), true),
            ["rtsp://10.0.0.5:8086/"]
        );
        assert_eq!(element_text(xml.as_bytes(), "Timeout", None, true), ["P1Y"]);
    }

    #[test]
    fn profiles_render_every_entry() {
        let mut device = sample_context();
        device.profiles.insert(MediaProfile {
            token: "Profile2".to_string(),
            name: "Main".to_string(),
            width: 1920,
            height: 1080,
            bitrate: 4_000_000,
            frame_rate: 25,
            encoding: "H265".to_string(),
        });

        let xml = profiles(&request(&device));

        assert_eq!(element_text(xml.as_bytes(), "Width", None, false), ["320", "1920"]);
        assert_eq!(element_text(xml.as_bytes(), "BitrateLimit", None, false), ["135000", "4000000"]);
        assert_eq!(element_text(xml.as_bytes(), "FrameRateLimit", None, false), ["5", "25"]);
        assert_eq!(element_text(xml.as_bytes(), "Encoding", None, false), ["H264", "H265"]);
        assert!(xml.contains(r#"token="Profile1""#));
        assert!(xml.contains(r#"token="Profile2""#));
    }
}
