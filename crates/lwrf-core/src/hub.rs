// ── Hub facade ──
//
// Lifecycle and typed operations for one LightwaveRF hub. `start()` binds
// the sockets and spawns the dispatcher (queue owner) and the receive task;
// device operations travel to the dispatcher over an mpsc channel and
// resolve when the hub answers.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::command::{Action, HubCommand};
use crate::command::energy::parse_energy_reply;
use crate::config::HubConfig;
use crate::convert::merge_static;
use crate::error::CoreError;
use crate::model::{Device, EnergyReading};
use crate::queue::{Ack, CommandQueue, ReplySender, resolve};
use crate::store::DeviceRegistry;
use crate::sync;
use crate::transport::receive::receive_task;
use crate::transport::{HubTransport, ListenerMap};

const COMMAND_CHANNEL_SIZE: usize = 64;

#[derive(Debug)]
struct CommandEnvelope {
    command: HubCommand,
    reply: Option<ReplySender>,
}

// ── Hub ──────────────────────────────────────────────────────────

/// Client for a single hub.
///
/// Cheaply cloneable via `Arc<HubInner>`. Nothing touches the network until
/// [`start()`](Self::start); [`close()`](Self::close) stops both background
/// tasks and fails any work still in flight.
#[derive(Clone)]
pub struct Hub {
    inner: Arc<HubInner>,
}

struct HubInner {
    config: HubConfig,
    registry: DeviceRegistry,
    static_devices: Mutex<Vec<Device>>,
    listeners: Arc<ListenerMap>,
    command_tx: mpsc::Sender<CommandEnvelope>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
    started: AtomicBool,
    reply_addr: OnceLock<SocketAddr>,
}

impl Drop for HubInner {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl Hub {
    pub fn new(config: HubConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        Self {
            inner: Arc::new(HubInner {
                config,
                registry: DeviceRegistry::new(),
                static_devices: Mutex::new(Vec::new()),
                listeners: Arc::new(ListenerMap::new()),
                command_tx,
                command_rx: Mutex::new(Some(command_rx)),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
                started: AtomicBool::new(false),
                reply_addr: OnceLock::new(),
            }),
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.inner.registry
    }

    /// Local address of the reply socket, once started.
    pub fn reply_addr(&self) -> Option<SocketAddr> {
        self.inner.reply_addr.get().copied()
    }

    /// Commands sent and still waiting for a reply.
    pub fn pending_replies(&self) -> usize {
        self.inner.listeners.len()
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Bind the reply and send sockets and spawn the background tasks.
    /// Calling it again on a running hub is a no-op.
    pub async fn start(&self) -> Result<(), CoreError> {
        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::HubClosed);
        }
        let mut rx_slot = self.inner.command_rx.lock().await;
        if rx_slot.is_none() {
            debug!("hub already started");
            return Ok(());
        }

        let config = &self.inner.config;
        let reply_socket = UdpSocket::bind((unspecified_for(config.ip), config.reply_port)).await?;
        let transport = HubTransport::bind(
            SocketAddr::new(config.ip, config.command_port),
            Arc::clone(&self.inner.listeners),
        )
        .await?;

        let Some(rx) = rx_slot.take() else {
            return Ok(());
        };
        if let Ok(addr) = reply_socket.local_addr() {
            let _ = self.inner.reply_addr.set(addr);
        }

        let queue = CommandQueue::new(config.queue_capacity, config.overflow_policy);
        let cancel = self.inner.cancel.clone();
        let mut handles = self.inner.task_handles.lock().await;
        handles.push(tokio::spawn(dispatcher_task(
            transport,
            rx,
            queue,
            config.command_interval,
            cancel.clone(),
        )));
        handles.push(tokio::spawn(receive_task(
            reply_socket,
            config.ip,
            Arc::clone(&self.inner.listeners),
            config.reply_ttl,
            cancel,
        )));
        self.inner.started.store(true, Ordering::Release);

        info!(
            hub = %config.ip,
            interval_ms = config.command_interval.as_millis(),
            "hub client started"
        );
        Ok(())
    }

    /// Stop the background tasks, release the sockets and fail every
    /// queued command and pending reply with `HubClosed`. Idempotent.
    pub async fn close(&self) {
        self.inner.cancel.cancel();

        let handles: Vec<_> = self.inner.task_handles.lock().await.drain(..).collect();
        let was_running = !handles.is_empty();
        for handle in handles {
            let _ = handle.await;
        }

        // Never started: fail whatever was sent before start().
        if let Some(mut rx) = self.inner.command_rx.lock().await.take() {
            fail_channel(&mut rx);
        }

        let failed = self.inner.listeners.close();
        if was_running {
            info!(failed, "hub client closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    // ── Devices ──────────────────────────────────────────────────

    /// Use `devices` as the static list. They are also merged ahead of
    /// every later sync.
    pub async fn load_static(&self, devices: Vec<Device>) {
        info!(count = devices.len(), "loaded static devices");
        self.inner.registry.replace(devices.clone());
        *self.inner.static_devices.lock().await = devices;
    }

    /// Synchronize from the manager service and replace the registry.
    ///
    /// Without credentials the registry is reset to the static devices.
    pub async fn sync(&self) -> Result<Vec<Device>, CoreError> {
        let statics = self.inner.static_devices.lock().await.clone();
        let devices = match sync::sync(&self.inner.config).await? {
            Some(synced) => merge_static(&statics, synced),
            None => statics,
        };
        self.inner.registry.replace(devices.clone());
        Ok(devices)
    }

    pub fn devices(&self) -> Vec<Arc<Device>> {
        self.inner.registry.snapshot().as_ref().clone()
    }

    pub fn device(&self, room_id: u32, device_id: u32) -> Result<Arc<Device>, CoreError> {
        self.inner
            .registry
            .find(room_id, device_id)
            .ok_or(CoreError::DeviceNotFound { room_id, device_id })
    }

    // ── Commands ─────────────────────────────────────────────────

    /// Queue a command and wait for the hub's reply.
    pub async fn execute(&self, command: HubCommand) -> Result<Ack, CoreError> {
        let (tx, rx) = oneshot::channel();
        self.enqueue(command, Some(tx)).await?;
        rx.await.map_err(|_| CoreError::HubClosed)?
    }

    /// Queue a command without waiting for a reply.
    pub async fn submit(&self, command: HubCommand) -> Result<(), CoreError> {
        self.enqueue(command, None).await
    }

    async fn enqueue(&self, command: HubCommand, reply: Option<ReplySender>) -> Result<(), CoreError> {
        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::HubClosed);
        }
        if !self.inner.started.load(Ordering::Acquire) {
            return Err(CoreError::NotStarted);
        }
        self.inner
            .command_tx
            .send(CommandEnvelope { command, reply })
            .await
            .map_err(|_| CoreError::HubClosed)
    }

    pub async fn turn_device_on(&self, room_id: u32, device_id: u32) -> Result<Ack, CoreError> {
        self.execute(HubCommand::on(room_id, device_id)).await
    }

    pub async fn turn_device_off(&self, room_id: u32, device_id: u32) -> Result<Ack, CoreError> {
        self.execute(HubCommand::off(room_id, device_id)).await
    }

    pub async fn open_device(&self, room_id: u32, device_id: u32) -> Result<Ack, CoreError> {
        self.execute(HubCommand::device(room_id, device_id, Action::Open))
            .await
    }

    pub async fn close_device(&self, room_id: u32, device_id: u32) -> Result<Ack, CoreError> {
        self.execute(HubCommand::device(room_id, device_id, Action::Close))
            .await
    }

    pub async fn stop_device(&self, room_id: u32, device_id: u32) -> Result<Ack, CoreError> {
        self.execute(HubCommand::device(room_id, device_id, Action::Stop))
            .await
    }

    pub async fn turn_room_off(&self, room_id: u32) -> Result<Ack, CoreError> {
        self.execute(HubCommand::room_off(room_id)).await
    }

    /// Dim to `percent` (clamped to 100). Percentages below one dim step
    /// turn the device off.
    pub async fn set_device_dim(
        &self,
        room_id: u32,
        device_id: u32,
        percent: u8,
    ) -> Result<Ack, CoreError> {
        self.execute(HubCommand::dim(room_id, device_id, percent)).await
    }

    /// Ask the hub to pair with this client. The hub shows a prompt that
    /// has to be confirmed on the device.
    pub async fn register(&self) -> Result<Ack, CoreError> {
        self.execute(HubCommand::register()).await
    }

    pub async fn request_energy(&self) -> Result<EnergyReading, CoreError> {
        match self.execute(HubCommand::energy()).await? {
            Ack::Replied(content) => parse_energy_reply(&content),
            other => Err(CoreError::Validation {
                message: format!("energy request not sent ({other:?}); another request was pending"),
            }),
        }
    }

    /// Blink a device (on, off, on, off) one command interval apart so it
    /// can be located. Resolves with the hub's answer to the final off.
    pub async fn identify(&self, room_id: u32, device_id: u32) -> Result<Ack, CoreError> {
        for (i, command) in [
            HubCommand::on(room_id, device_id),
            HubCommand::off(room_id, device_id),
            HubCommand::on(room_id, device_id),
        ]
        .into_iter()
        .enumerate()
        {
            if i > 0 {
                sleep(self.inner.config.command_interval).await;
            }
            self.submit(command).await?;
        }
        sleep(self.inner.config.command_interval).await;
        self.execute(HubCommand::off(room_id, device_id)).await
    }
}

fn unspecified_for(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V4(_) => Ipv4Addr::UNSPECIFIED.into(),
        IpAddr::V6(_) => Ipv6Addr::UNSPECIFIED.into(),
    }
}

fn fail_channel(rx: &mut mpsc::Receiver<CommandEnvelope>) {
    rx.close();
    while let Ok(envelope) = rx.try_recv() {
        resolve(envelope.reply, Err(CoreError::HubClosed));
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Owns the command queue. Enqueues incoming envelopes and sends the
/// oldest entry whenever the previous send is at least `interval` ago.
async fn dispatcher_task(
    transport: HubTransport,
    mut rx: mpsc::Receiver<CommandEnvelope>,
    mut queue: CommandQueue,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut next_ready = Instant::now();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = sleep_until(next_ready), if !queue.is_empty() => {
                if let Some(pending) = queue.pop() {
                    transport.send(&pending.command, pending.reply).await;
                    next_ready = Instant::now() + interval;
                }
            }
            envelope = rx.recv() => {
                let Some(CommandEnvelope { command, reply }) = envelope else { break };
                queue.enqueue(command, reply);
            }
        }
    }

    let dropped = queue.close();
    fail_channel(&mut rx);
    debug!(dropped, "dispatcher stopped");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    async fn fake_hub() -> (UdpSocket, HubConfig) {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let config = HubConfig {
            command_port: socket.local_addr().unwrap().port(),
            reply_port: 0,
            ..HubConfig::new("127.0.0.1".parse().unwrap())
        };
        (socket, config)
    }

    async fn recv(socket: &UdpSocket) -> String {
        let mut buf = [0u8; 128];
        let (n, _) = socket.recv_from(&mut buf).await.unwrap();
        String::from_utf8_lossy(&buf[..n]).into_owned()
    }

    /// Where the hub under test listens for replies.
    fn reply_target(hub: &Hub) -> SocketAddr {
        let port = hub.reply_addr().unwrap().port();
        SocketAddr::new("127.0.0.1".parse().unwrap(), port)
    }

    #[tokio::test(start_paused = true)]
    async fn sends_one_command_per_interval() {
        let (fake, config) = fake_hub().await;
        let hub = Hub::new(config);
        hub.start().await.unwrap();

        hub.submit(HubCommand::on(1, 1)).await.unwrap();
        hub.submit(HubCommand::on(1, 2)).await.unwrap();
        hub.submit(HubCommand::room_off(2)).await.unwrap();

        let mut arrivals = Vec::new();
        for _ in 0..3 {
            let payload = recv(&fake).await;
            arrivals.push((Instant::now(), payload));
        }

        let payloads: Vec<_> = arrivals.iter().map(|(_, p)| p.as_str()).collect();
        assert_eq!(
            payloads,
            vec!["001,!R1D1F1\0", "002,!R1D2F1\0", "003,!R2Fa\0"]
        );
        for pair in arrivals.windows(2) {
            assert!(pair[1].0.duration_since(pair[0].0) >= Duration::from_secs(1));
        }
        hub.close().await;
    }

    #[tokio::test]
    async fn reply_resolves_the_waiting_caller() {
        let (fake, config) = fake_hub().await;
        let hub = Hub::new(config);
        hub.start().await.unwrap();

        let caller = {
            let hub = hub.clone();
            tokio::spawn(async move { hub.turn_device_on(3, 4).await })
        };

        let (payload, from) = {
            let mut buf = [0u8; 128];
            let (n, from) = fake.recv_from(&mut buf).await.unwrap();
            (String::from_utf8_lossy(&buf[..n]).into_owned(), from)
        };
        assert_eq!(payload, "001,!R3D4F1\0");
        assert_ne!(from.port(), 0);

        // Status pushes and unknown codes leave the caller waiting.
        fake.send_to(b"*!{\"trans\":1}", reply_target(&hub)).await.unwrap();
        fake.send_to(b"002,OK", reply_target(&hub)).await.unwrap();
        fake.send_to(b"001,OK\r\n", reply_target(&hub)).await.unwrap();

        let ack = caller.await.unwrap().unwrap();
        assert_eq!(ack, Ack::Replied("OK".into()));
        assert_eq!(hub.pending_replies(), 0);
        hub.close().await;
    }

    #[tokio::test]
    async fn energy_reply_is_parsed() {
        let (fake, config) = fake_hub().await;
        let hub = Hub::new(config);
        hub.start().await.unwrap();

        let caller = {
            let hub = hub.clone();
            tokio::spawn(async move { hub.request_energy().await })
        };

        assert_eq!(recv(&fake).await, "001,@?\0");
        fake.send_to(b"001,?W=10,20,30,40\r\n", reply_target(&hub))
            .await
            .unwrap();

        let reading = caller.await.unwrap().unwrap();
        assert_eq!(
            (reading.current, reading.max, reading.today, reading.yesterday),
            (10, 20, 30, 40)
        );
        hub.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn identify_blinks_and_waits_for_the_last_off() {
        let (fake, config) = fake_hub().await;
        let hub = Hub::new(config);
        hub.start().await.unwrap();

        let caller = {
            let hub = hub.clone();
            tokio::spawn(async move { hub.identify(2, 5).await })
        };

        let mut payloads = Vec::new();
        for _ in 0..4 {
            payloads.push(recv(&fake).await);
        }
        assert_eq!(
            payloads,
            vec!["001,!R2D5F1\0", "002,!R2D5F0\0", "003,!R2D5F1\0", "004,!R2D5F0\0"]
        );

        fake.send_to(b"004,OK", reply_target(&hub)).await.unwrap();
        assert_eq!(caller.await.unwrap().unwrap(), Ack::Replied("OK".into()));
        hub.close().await;
    }

    #[tokio::test]
    async fn close_fails_pending_work_and_is_idempotent() {
        let (fake, config) = fake_hub().await;
        let hub = Hub::new(config);
        hub.start().await.unwrap();

        let caller = {
            let hub = hub.clone();
            tokio::spawn(async move { hub.turn_room_off(1).await })
        };
        assert_eq!(recv(&fake).await, "001,!R1Fa\0");

        hub.close().await;
        hub.close().await;

        assert!(matches!(caller.await.unwrap(), Err(CoreError::HubClosed)));
        assert!(hub.is_closed());
        assert!(matches!(
            hub.turn_device_on(1, 1).await,
            Err(CoreError::HubClosed)
        ));
        assert!(matches!(hub.start().await, Err(CoreError::HubClosed)));
    }

    #[tokio::test]
    async fn commands_before_start_are_rejected() {
        let hub = Hub::new(HubConfig::new("127.0.0.1".parse().unwrap()));
        assert!(matches!(
            hub.turn_device_on(1, 1).await,
            Err(CoreError::NotStarted)
        ));
    }

    #[tokio::test]
    async fn static_devices_are_used_without_credentials() {
        let hub = Hub::new(HubConfig::new("127.0.0.1".parse().unwrap()));
        let lamp = Device {
            room_id: 1,
            room_name: "Lounge".into(),
            device_id: 2,
            device_name: "Lamp".into(),
            device_type: crate::model::DeviceType::Dimmer,
        };
        hub.load_static(vec![lamp.clone()]).await;

        let devices = hub.sync().await.unwrap();

        assert_eq!(devices, vec![lamp]);
        assert_eq!(hub.device(1, 2).unwrap().device_name, "Lamp");
        assert!(matches!(
            hub.device(9, 9),
            Err(CoreError::DeviceNotFound { room_id: 9, device_id: 9 })
        ));
    }
}
