// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! UDP listener for a Bond's push channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

use crate::error::{ProtocolError, Result};
use crate::push::PushPacket;

/// Largest datagram a Bond sends.
const MAX_DATAGRAM: usize = 4096;

/// Callback invoked for every decoded packet.
pub type PacketHandler = Arc<dyn Fn(PushPacket) + Send + Sync>;

/// Push channel settings.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use bond_bridge::push::PushConfig;
///
/// let config = PushConfig::new("192.168.1.50");
/// assert_eq!(config.port(), 30007);
/// assert_eq!(config.keep_alive(), Duration::from_secs(60));
/// ```
#[derive(Debug, Clone)]
pub struct PushConfig {
    host: String,
    port: u16,
    keep_alive: Duration,
}

impl PushConfig {
    /// Port Bonds listen on for push subscriptions.
    pub const DEFAULT_PORT: u16 = 30007;
    /// Interval between keep-alive datagrams.
    pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(60);

    /// Creates settings for the Bond at `host`.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Self::DEFAULT_PORT,
            keep_alive: Self::DEFAULT_KEEP_ALIVE,
        }
    }

    /// Sets the Bond's push port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the keep-alive interval.
    #[must_use]
    pub fn with_keep_alive(mut self, interval: Duration) -> Self {
        self.keep_alive = interval;
        self
    }

    /// Returns the Bond host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the Bond's push port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the keep-alive interval.
    #[must_use]
    pub fn keep_alive(&self) -> Duration {
        self.keep_alive
    }
}

/// Background task subscribed to a Bond's push channel.
///
/// The task sends an empty keep-alive datagram immediately and then every
/// keep-alive interval on the same socket, and hands every decoded packet
/// to the handler. Malformed datagrams are dropped. The task stops when the
/// listener is dropped.
pub struct PushListener {
    task: JoinHandle<()>,
}

impl PushListener {
    /// Binds a local socket and starts the listener task.
    ///
    /// # Errors
    ///
    /// Returns error if the socket cannot be bound or the Bond address
    /// cannot be resolved.
    pub async fn start(config: PushConfig, handler: PacketHandler) -> Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", 0))
            .await
            .map_err(ProtocolError::Io)?;
        socket
            .connect((config.host.as_str(), config.port))
            .await
            .map_err(|e| ProtocolError::InvalidAddress(format!("{}:{}: {e}", config.host, config.port)))?;

        tracing::debug!(host = %config.host, port = config.port, "Push listener started");

        let task = tokio::spawn(run(socket, config, handler));
        Ok(Self { task })
    }

    /// Returns whether the listener task is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for PushListener {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(socket: UdpSocket, config: PushConfig, handler: PacketHandler) {
    let mut keep_alive = tokio::time::interval(config.keep_alive);
    let mut buf = vec![0u8; MAX_DATAGRAM];

    loop {
        tokio::select! {
            _ = keep_alive.tick() => {
                match socket.send(&[]).await {
                    Ok(_) => tracing::debug!(host = %config.host, "Push keep-alive sent"),
                    Err(e) => tracing::error!(host = %config.host, error = %e, "Failed to send push keep-alive"),
                }
            }
            received = socket.recv(&mut buf) => match received {
                Ok(len) => dispatch(&buf[..len], &config, &handler),
                Err(e) => tracing::debug!(host = %config.host, error = %e, "Push receive failed"),
            },
        }
    }
}

fn dispatch(datagram: &[u8], config: &PushConfig, handler: &PacketHandler) {
    match PushPacket::decode(datagram) {
        Ok(packet) => {
            tracing::debug!(host = %config.host, topic = %packet.topic, "Push packet received");
            handler(packet);
        }
        Err(e) => {
            tracing::trace!(host = %config.host, error = %e, "Ignoring malformed push datagram");
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;

    #[tokio::test]
    async fn sends_keep_alive_and_delivers_packets() {
        let bond = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = bond.local_addr().unwrap().port();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let handler: PacketHandler = Arc::new(move |packet: PushPacket| {
            let _ = tx.send(packet);
        });
        let listener = PushListener::start(PushConfig::new("127.0.0.1").with_port(port), handler)
            .await
            .unwrap();

        // First keep-alive is empty and tells the Bond where to push
        let mut buf = [0u8; 64];
        let (len, client) = bond.recv_from(&mut buf).await.unwrap();
        assert_eq!(len, 0);

        bond.send_to(b"garbage", client).await.unwrap();
        bond.send_to(br#"{"t":"devices/42/state","b":{"light":1}}"#, client)
            .await
            .unwrap();

        let packet = rx.recv().await.unwrap();
        assert_eq!(packet.state_device_id(), Some("42"));
        assert!(listener.is_running());
    }

    #[tokio::test]
    async fn repeats_keep_alive() {
        let bond = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = bond.local_addr().unwrap().port();

        let config = PushConfig::new("127.0.0.1")
            .with_port(port)
            .with_keep_alive(Duration::from_millis(20));
        let _listener = PushListener::start(config, Arc::new(|_: PushPacket| {})).await.unwrap();

        let mut buf = [0u8; 8];
        for _ in 0..3 {
            let (len, _) = bond.recv_from(&mut buf).await.unwrap();
            assert_eq!(len, 0);
        }
    }
}
