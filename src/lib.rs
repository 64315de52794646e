//! ONVIF presence for an embedded video device.
//!
//! Two pieces make up the core:
//!
//! * [`discovery::DiscoveryResponder`] listens on the WS-Discovery multicast
//!   group and answers every Probe with a unicast ProbeMatch.
//! * [`soap::Dispatcher`] resolves the ONVIF device/media action carried by a
//!   SOAP request and renders the matching canned response.
//!
//! Both share one immutable [`device::DeviceContext`].
//!
//! # Examples
//!
//! ```no_run
//! use onvif_device_rs::device::DeviceContext;
//! use onvif_device_rs::discovery::{DiscoveryResponder, ResponderOptions};
//! use onvif_device_rs::transport::MulticastTransport;
//! use std::sync::Arc;
//!
//! # async fn run(context: DeviceContext) -> anyhow::Result<()> {
//! let context = Arc::new(context);
//! let transport = MulticastTransport::open()?;
//! let mut responder = DiscoveryResponder::spawn(transport, context, ResponderOptions::default());
//!
//! // ... serve HTTP ...
//!
//! responder.stop().await;
//! # Ok(())
//! # }
//! ```

use std::net::Ipv4Addr;
use std::time::Duration;

pub mod builder;
pub mod device;
pub mod discovery;
pub mod http;
pub mod soap;
pub mod transport;
pub mod utils;

pub use device::{DeviceContext, DeviceIdentity, MediaProfile, MediaProfiles, NetworkEndpoint};
pub use discovery::{DiscoveryResponder, DiscoveryState, ResponderOptions};
pub use soap::{dispatch, Dispatcher, RequestContext, SoapAction, SoapReply};
pub use transport::{MulticastTransport, ReceiveError, Transport, TransportError};

/// WS-Discovery multicast group
pub const DISCOVER_GROUP: Ipv4Addr = Ipv4Addr::new(239, 255, 255, 250);
/// WS-Discovery UDP port
pub const DISCOVER_PORT: u16 = 3702;
/// Upper bound on a single blocking receive. Only used to wake the loop up.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(30);
/// Period between two Hello announcements
pub const HELLO_INTERVAL: Duration = Duration::from_millis(1000);
/// Content type of every successful dispatcher reply
pub const SOAP_CONTENT_TYPE: &str = "application/soap+xml; charset=utf-8";
