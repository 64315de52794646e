//! WS-Discovery responder.
//!
//! A [`DiscoveryResponder`] owns one task, and that task owns the transport.
//! The task handles one datagram at a time (receive, parse, reply) before it
//! asks for the next one, so nothing in here needs a lock.
//!
//! While running the device is *Discoverable*: every Probe gets a unicast
//! ProbeMatch sent back to the prober's own address, and Hello is multicast
//! periodically if enabled. [`DiscoveryResponder::stop`] moves it to
//! *Undiscoverable* for good: one Bye goes out and the transport is closed.

use crate::builder::discovery::{bye, hello, AppSequence, ProbeMatchResponse};
use crate::device::DeviceContext;
use crate::transport::{ReceiveError, Transport};
use crate::utils::parse_discovery;
use crate::HELLO_INTERVAL;

pub use crate::utils::DiscoveryMessage;

use log::{debug, info, trace, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, Interval, MissedTickBehavior};
use uuid::Uuid;

/// Shortest hello period the timer accepts
const MIN_HELLO_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, PartialEq, Eq)]
#[rustfmt::skip]
pub struct ResponderOptions {
    /// Multicast Hello while discoverable
    pub hello:             bool,
    pub hello_interval:    Duration,
    /// Pause before receiving again after a failed receive
    pub restart_backoff:   Duration,
}

impl Default for ResponderOptions {
    fn default() -> Self {
        ResponderOptions {
            hello: false,
            hello_interval: HELLO_INTERVAL,
            restart_backoff: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryState {
    Discoverable,
    Undiscoverable,
}

pub struct DiscoveryResponder {
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl DiscoveryResponder {
    /// Starts answering probes on `transport`. Must be called from within a
    /// tokio runtime.
    pub fn spawn<T: Transport>(
        transport: T,
        context: Arc<DeviceContext>,
        options: ResponderOptions,
    ) -> Self {
        let (shutdown, shutdown_rx) = watch::channel(false);

        let worker = Worker {
            transport,
            context,
            options,
            shutdown: shutdown_rx,
            instance_id: chrono::Utc::now().timestamp().max(0) as u64,
            message_number: 0,
        };

        DiscoveryResponder {
            shutdown,
            task: Some(tokio::spawn(worker.run())),
        }
    }

    /// `Undiscoverable` once stopped, and also once the task has ended on
    /// its own (transport closed underneath it, or a panic).
    pub fn state(&self) -> DiscoveryState {
        match &self.task {
            Some(task) if !task.is_finished() => DiscoveryState::Discoverable,
            _ => DiscoveryState::Undiscoverable,
        }
    }

    /// Sends Bye, closes the transport and waits for the task to finish.
    /// Nothing is sent once this returns. Later calls do nothing.
    pub async fn stop(&mut self) {
        let Some(task) = self.task.take() else {
            debug!("[Discovery][stop] Already undiscoverable");
            return;
        };

        // The task may already be gone if it panicked
        let _ = self.shutdown.send(true);

        if let Err(e) = task.await {
            warn!("[Discovery][stop] Responder task ended abnormally: {e}");
        }

        info!("[Discovery][stop] Device is now undiscoverable");
    }
}

impl Drop for DiscoveryResponder {
    fn drop(&mut self) {
        if self.task.is_some() {
            let _ = self.shutdown.send(true);
        }
    }
}

enum Event {
    Shutdown,
    Hello,
    Received(Result<(Vec<u8>, SocketAddr), ReceiveError>),
}

struct Worker<T> {
    transport: T,
    context: Arc<DeviceContext>,
    options: ResponderOptions,
    shutdown: watch::Receiver<bool>,
    instance_id: u64,
    message_number: u64,
}

impl<T: Transport> Worker<T> {
    async fn run(mut self) {
        info!(
            "[Discovery] Device urn:uuid:{} is discoverable",
            self.context.identity.uuid
        );

        let mut hello_timer = self.options.hello.then(|| {
            let mut timer = interval(self.options.hello_interval.max(MIN_HELLO_INTERVAL));
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
            timer
        });
        let mut transport_lost = false;

        loop {
            if *self.shutdown.borrow() {
                break;
            }

            let event = tokio::select! {
                biased;
                _ = self.shutdown.changed() => Event::Shutdown,
                _ = next_hello(&mut hello_timer) => Event::Hello,
                received = self.transport.receive() => Event::Received(received),
            };

            match event {
                Event::Shutdown => break,
                Event::Hello => self.announce_hello().await,
                Event::Received(Ok((datagram, sender))) => self.handle(&datagram, sender).await,
                Event::Received(Err(ReceiveError::Timeout)) => {
                    trace!("[Discovery][receive] Idle, receiving again");
                }
                Event::Received(Err(ReceiveError::Fatal(e))) => {
                    warn!("[Discovery][receive] {e}, restarting receive");
                    self.backoff().await;
                }
                Event::Received(Err(ReceiveError::Closed)) => {
                    warn!("[Discovery][receive] Transport closed underneath the responder");
                    transport_lost = true;
                    break;
                }
            }
        }

        if !transport_lost {
            self.say_bye().await;
        }
        self.transport.close();
    }

    async fn handle(&mut self, datagram: &[u8], sender: SocketAddr) {
        let message = match parse_discovery(datagram) {
            Ok(message) => message,
            Err(e) => {
                warn!("[Discovery][receive] Dropping malformed packet from {sender}: {e}");
                return;
            }
        };

        if !message.is_probe() {
            debug!(
                "[Discovery][receive] Ignoring {} from {sender}",
                message.body_element
            );
            return;
        }

        debug!(
            "[Discovery][probe] {} from {sender}",
            message.message_id
        );

        let reply = ProbeMatchResponse::new(&message, &self.context);
        self.transport
            .send_unicast(sender, reply.to_xml().as_bytes())
            .await;
    }

    async fn announce_hello(&mut self) {
        let sequence = self.next_sequence();
        let msg = hello(&self.context, Uuid::new_v4(), &sequence);

        trace!("[Discovery][hello] #{}", sequence.message_number);
        self.transport.send_multicast(msg.as_bytes()).await;
    }

    async fn say_bye(&mut self) {
        let sequence = self.next_sequence();
        let msg = bye(&self.context, Uuid::new_v4(), &sequence);

        info!("[Discovery][bye] Leaving the network");
        self.transport.send_multicast(msg.as_bytes()).await;
    }

    async fn backoff(&mut self) {
        tokio::select! {
            _ = sleep(self.options.restart_backoff) => {}
            _ = self.shutdown.changed() => {}
        }
    }

    fn next_sequence(&mut self) -> AppSequence {
        self.message_number += 1;

        AppSequence {
            instance_id: self.instance_id,
            sequence_id: Uuid::new_v4(),
            message_number: self.message_number,
        }
    }
}

/// Next hello tick, or never when hello is off
async fn next_hello(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending().await,
    }
}
