//! TCP connection to the game server.
//!
//! A receive task mirrors every server message into a `MirroredState` and
//! forwards it to the caller's `ClientEvents`. A send task wakes at the tick
//! rate and transmits only the most recent queued input, if any.

use crate::game::MirroredState;
use crate::input::InputSink;
use log::{debug, info, warn};
use pong_shared::{
    EndMessage, GameSettings, InputMessage, JoinMessage, Message, NetError, StateMessage,
    INPUT_QUEUE_CAPACITY, TICK_RATE,
};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Hooks invoked from the receive task as server messages arrive.
///
/// The mirrored state is already updated when a hook runs. Hooks should
/// return quickly; they block further receiving while they run.
pub trait ClientEvents: Send + Sync {
    fn on_join(&self, _join: &JoinMessage) {}
    fn on_start(&self, _settings: &GameSettings) {}
    fn on_state(&self, _state: &StateMessage) {}
    fn on_end(&self, _end: &EndMessage) {}
}

/// Ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEvents;

impl ClientEvents for NoEvents {}

struct ClientShared {
    state: RwLock<MirroredState>,
    connected: AtomicBool,
}

impl ClientShared {
    fn update(&self, apply: impl FnOnce(&mut MirroredState)) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        apply(&mut state);
    }
}

/// Connection to a game server plus the mirrored world it maintains.
///
/// Dropping the client also ends both background tasks, but without
/// waiting for them to finish.
pub struct GameClient {
    server_addr: SocketAddr,
    shared: Arc<ClientShared>,
    input_tx: mpsc::Sender<InputMessage>,
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl GameClient {
    /// Connects to `addr` and starts the receive and send tasks.
    pub async fn connect(addr: &str, events: Arc<dyn ClientEvents>) -> Result<Self, NetError> {
        let connect_error = |source| NetError::Connect {
            addr: addr.to_string(),
            source,
        };

        let stream = TcpStream::connect(addr).await.map_err(connect_error)?;
        let server_addr = stream.peer_addr().map_err(connect_error)?;
        if let Err(e) = stream.set_nodelay(true) {
            debug!("Failed to set TCP_NODELAY: {}", e);
        }
        info!("Connected to server at {}", server_addr);

        let (read_half, write_half) = stream.into_split();
        let shared = Arc::new(ClientShared {
            state: RwLock::new(MirroredState::new()),
            connected: AtomicBool::new(true),
        });
        let (input_tx, input_rx) = mpsc::channel(INPUT_QUEUE_CAPACITY);
        let (shutdown_tx, _) = watch::channel(false);

        let tasks = vec![
            tokio::spawn(receive_loop(
                Arc::clone(&shared),
                events,
                read_half,
                shutdown_tx.subscribe(),
            )),
            tokio::spawn(send_loop(
                Arc::clone(&shared),
                input_rx,
                write_half,
                shutdown_tx.subscribe(),
            )),
        ];

        Ok(Self {
            server_addr,
            shared,
            input_tx,
            shutdown_tx,
            tasks,
        })
    }

    /// Closes the connection and waits for both tasks to finish.
    pub async fn disconnect(&mut self) {
        self.shutdown_tx.send_replace(true);
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                warn!("Client task failed: {}", e);
            }
        }
        self.shared.connected.store(false, Ordering::SeqCst);
        info!("Disconnected from {}", self.server_addr);
    }

    /// Resolved address of the server this client is connected to.
    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    /// Player id assigned by the server, once the join message arrived.
    pub fn player_id(&self) -> Option<u32> {
        self.read_state(|state| state.player_id)
    }

    /// False once either task saw the connection close or `disconnect`
    /// was called.
    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }

    /// Independent copy of the mirrored world.
    pub fn snapshot(&self) -> MirroredState {
        self.read_state(MirroredState::clone)
    }

    fn read_state<T>(&self, read: impl FnOnce(&MirroredState) -> T) -> T {
        let state = self.shared.state.read().unwrap_or_else(PoisonError::into_inner);
        read(&state)
    }
}

impl InputSink for GameClient {
    /// Queues an input for the next send tick without blocking.
    ///
    /// Dropped if no player id has been assigned yet, if the connection is
    /// gone, or if the queue is full.
    fn submit_input(&self, paddle1_y: f32, paddle2_x: f32) -> bool {
        let Some(player_id) = self.player_id() else {
            debug!("Input dropped: not joined yet");
            return false;
        };

        let input = InputMessage {
            player_id,
            paddle1_y,
            paddle2_x,
        };

        match self.input_tx.try_send(input) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!("Input queue full, dropping newest input");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

async fn receive_loop(
    shared: Arc<ClientShared>,
    events: Arc<dyn ClientEvents>,
    read_half: OwnedReadHalf,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut lines = BufReader::new(read_half).lines();

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            line = lines.next_line() => match line {
                Ok(Some(line)) => handle_line(&shared, events.as_ref(), &line),
                Ok(None) => {
                    info!("Server closed the connection");
                    break;
                }
                Err(e) => {
                    warn!("Receive failed: {}", e);
                    break;
                }
            },
        }
    }

    shared.connected.store(false, Ordering::SeqCst);
}

fn handle_line(shared: &ClientShared, events: &dyn ClientEvents, line: &str) {
    if line.trim().is_empty() {
        return;
    }

    match Message::decode(line) {
        Ok(Message::Join(join)) => {
            info!("Joined as {} (id {})", join.player_name, join.player_id);
            shared.update(|state| state.apply_join(&join));
            events.on_join(&join);
        }
        Ok(Message::Start(start)) => {
            info!("Game started");
            shared.update(|state| state.apply_start(&start));
            events.on_start(&start.settings);
        }
        Ok(Message::State(state_message)) => {
            shared.update(|state| state.apply_state(&state_message));
            events.on_state(&state_message);
        }
        Ok(Message::End(end)) => {
            info!(
                "Game ended: winner {} ({} - {})",
                end.winner, end.final_scores.player1, end.final_scores.player2
            );
            shared.update(|state| state.apply_end(&end));
            events.on_end(&end);
        }
        Ok(other) => warn!("Unexpected {} message from server", other.kind().as_str()),
        Err(e) => warn!("Dropping message from server: {}", e),
    }
}

async fn send_loop(
    shared: Arc<ClientShared>,
    mut input_rx: mpsc::Receiver<InputMessage>,
    mut writer: OwnedWriteHalf,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = interval(Duration::from_secs_f64(1.0 / f64::from(TICK_RATE)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {
                let mut latest = None;
                while let Ok(input) = input_rx.try_recv() {
                    latest = Some(input);
                }
                let Some(input) = latest else {
                    continue;
                };

                if let Err(e) = send_input(&mut writer, input).await {
                    warn!("{}", e);
                    shared.connected.store(false, Ordering::SeqCst);
                    break;
                }
            }
        }
    }

    if let Err(e) = writer.shutdown().await {
        debug!("Closing connection: {}", e);
    }
}

async fn send_input(writer: &mut OwnedWriteHalf, input: InputMessage) -> Result<(), NetError> {
    let data = Message::Input(input).encode()?;
    writer.write_all(&data).await.map_err(NetError::Write)
}
