//! Resolves the ONVIF action of an HTTP request and renders its reply.
//!
//! The HTTP host owns sockets, headers and connections. It hands over the
//! method, the decoded path and the raw body, and gets back a [`SoapReply`].

use crate::builder::{builder_for, escape};
use crate::device::DeviceContext;
use crate::utils::body_action;
use crate::SOAP_CONTENT_TYPE;

use bytes::Bytes;
use chrono::{DateTime, Local, Offset, Utc};
use log::{debug, info, warn};
use std::sync::Arc;

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// All of the ONVIF requests this device answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoapAction {
    GetSystemDateAndTime,
    GetCapabilities,
    GetServices,
    GetDeviceInformation,
    GetProfiles,
    GetStreamUri,
    Unknown,
}

impl SoapAction {
    /// Exact match on the element local name
    pub fn from_local_name(name: &str) -> Self {
        match name {
            "GetSystemDateAndTime" => SoapAction::GetSystemDateAndTime,
            "GetCapabilities" => SoapAction::GetCapabilities,
            "GetServices" => SoapAction::GetServices,
            "GetDeviceInformation" => SoapAction::GetDeviceInformation,
            "GetProfiles" => SoapAction::GetProfiles,
            "GetStreamUri" => SoapAction::GetStreamUri,
            _ => SoapAction::Unknown,
        }
    }

    /// Resolves the action from the first element inside the SOAP Body. A body
    /// that is not a SOAP envelope resolves to `Unknown`.
    pub fn resolve(body: &[u8]) -> Self {
        match body_action(body) {
            Ok(name) => Self::from_local_name(&name),
            Err(e) => {
                debug!("[Soap][resolve] No action in request body: {e}");
                SoapAction::Unknown
            }
        }
    }
}

/// Per-request inputs of the response builders
#[derive(Debug, Clone)]
#[rustfmt::skip]
pub struct RequestContext<'a> {
    pub now:         DateTime<Utc>,
    pub time_zone:   String,
    pub device:      &'a DeviceContext,
}

impl<'a> RequestContext<'a> {
    /// Snapshot of the wall clock and the local zone
    pub fn now(device: &'a DeviceContext) -> Self {
        let offset = Local::now().offset().fix().local_minus_utc();

        RequestContext {
            now: Utc::now(),
            time_zone: posix_time_zone(offset),
            device,
        }
    }
}

/// POSIX TZ string for a fixed offset east of UTC, e.g. `UTC-8` for UTC+08:00
pub fn posix_time_zone(offset_secs: i32) -> String {
    let minutes = offset_secs / 60;
    if minutes == 0 {
        return "UTC0".to_string();
    }

    // POSIX counts hours west of Greenwich
    let sign = if minutes > 0 { '-' } else { '+' };
    let (hours, minutes) = (minutes.abs() / 60, minutes.abs() % 60);

    match minutes {
        0 => format!("UTC{sign}{hours}"),
        _ => format!("UTC{sign}{hours}:{minutes:02}"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[rustfmt::skip]
pub struct SoapReply {
    pub status:         u16,
    pub content_type:   &'static str,
    pub body:           Bytes,
}

impl SoapReply {
    fn html(status: u16, message: &str) -> Self {
        SoapReply {
            status,
            content_type: HTML_CONTENT_TYPE,
            body: Bytes::from(format!("<html><body><h1>{message}</h1></body></html>")),
        }
    }
}

/// Turns one request into a reply. Pure: identical inputs give identical
/// replies, and nothing shared is written.
pub fn dispatch(method: &str, path: &str, body: &[u8], ctx: &RequestContext) -> SoapReply {
    // Method tokens are case-sensitive
    if !matches!(method, "GET" | "HEAD" | "POST") {
        warn!("[Soap][dispatch] Method {method} not supported");
        return SoapReply::html(405, &format!("Method {} not allowed", escape(method)));
    }

    let action = SoapAction::resolve(body);

    match builder_for(action) {
        Some(build) => {
            info!("[Soap][dispatch] {method} {path} -> {action:?}");

            SoapReply {
                status: 200,
                content_type: SOAP_CONTENT_TYPE,
                body: Bytes::from(build(ctx)),
            }
        }
        None => {
            warn!("[Soap][dispatch] {method} {path}: unknown action");
            SoapReply::html(404, &format!("File {} not found", escape(path)))
        }
    }
}

/// Cheap to clone handle for HTTP hosts. Safe to call from many tasks at once.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    device: Arc<DeviceContext>,
}

impl Dispatcher {
    pub fn new(device: Arc<DeviceContext>) -> Self {
        Dispatcher { device }
    }

    pub fn device(&self) -> &DeviceContext {
        &self.device
    }

    pub fn handle(&self, method: &str, path: &str, body: &[u8]) -> SoapReply {
        dispatch(method, path, body, &RequestContext::now(&self.device))
    }
}
