mod common;

use common::element_text;
use onvif_device_rs::{
    http, DeviceContext, DeviceIdentity, Dispatcher, MediaProfile, MediaProfiles, NetworkEndpoint,
};

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use uuid::Uuid;

struct Host {
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    server: JoinHandle<std::io::Result<()>>,
}

impl Host {
    async fn start() -> Self {
        let identity = DeviceIdentity {
            uuid: Uuid::new_v4(),
            manufacturer: "Acme".to_string(),
            model: "Cam-1".to_string(),
            firmware_version: "1.0".to_string(),
            serial_number: "42".to_string(),
            hardware_id: "hw".to_string(),
        };
        let endpoint = NetworkEndpoint {
            ip: Ipv4Addr::new(10, 0, 0, 5),
            http_port: 8080,
            rtsp_port: 8086,
        };
        let device = DeviceContext::new(identity, endpoint, MediaProfiles::single(MediaProfile::default()));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();
        let server = tokio::spawn(http::serve(
            listener,
            Dispatcher::new(Arc::new(device)),
            async move {
                let _ = stopped.await;
            },
        ));

        Host { addr, stop, server }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn shutdown(self) {
        let _ = self.stop.send(());
        self.server.await.unwrap().unwrap();
    }
}

const GET_STREAM_URI: &str = r#"<soap:Envelope
        xmlns:soap="http://www.w3.org/2003/05/soap-envelope"
        xmlns:trt="http://www.onvif.org/ver10/media/wsdl"
        xmlns:tt="http://www.onvif.org/ver10/schema">
        <soap:Body>
            <trt:GetStreamUri>
                <trt:StreamSetup>
                    <tt:Stream>RTP-Unicast</tt:Stream>
                    <tt:Transport>
                        <tt:Protocol>RTSP</tt:Protocol>
                    </tt:Transport>
                </trt:StreamSetup>
                <trt:ProfileToken>Profile1</trt:ProfileToken>
            </trt:GetStreamUri>
        </soap:Body>
    </soap:Envelope>"#;

#[tokio::test]
async fn soap_request_round_trip() {
    let host = Host::start().await;
    let client = reqwest::Client::new();

    let response = client
        .post(host.url("/onvif/device_service"))
        .header("Content-Type", "application/soap+xml; charset=utf-8")
        .body(GET_STREAM_URI)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        response.headers()["content-type"],
        "application/soap+xml; charset=utf-8"
    );

    let body = response.text().await.unwrap();
    assert_eq!(
        element_text(body.as_bytes(), "Uri"),
        ["rtsp://10.0.0.5:8086/"]
    );

    host.shutdown().await;
}

#[tokio::test]
async fn unknown_action_reports_decoded_path() {
    let host = Host::start().await;
    let client = reqwest::Client::new();

    let body = r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope">
            <s:Body><Foo/></s:Body>
        </s:Envelope>"#;
    let response = client
        .post(host.url("/onvif/some%20service"))
        .body(body)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
    assert!(response.text().await.unwrap().contains("/onvif/some service"));

    host.shutdown().await;
}

#[tokio::test]
async fn unsupported_method_is_405() {
    let host = Host::start().await;
    let client = reqwest::Client::new();

    let response = client
        .put(host.url("/onvif/device_service"))
        .body(GET_STREAM_URI)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 405);

    host.shutdown().await;
}
