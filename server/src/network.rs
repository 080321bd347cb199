//! TCP session layer: accepts players, feeds their input into the world and
//! fans simulation output back out.
//!
//! One task accepts connections, one task per connection reads input lines,
//! and one task drives the simulation at the tick rate and broadcasts the
//! result. Session transitions and broadcasts happen under the session lock
//! so `start`, `state` and `end` reach every client in a consistent order.
//!
//! Every socket write is bounded by `WRITE_TIMEOUT`. A peer that stops
//! reading has its write side closed instead of holding the session lock.

use crate::client_manager::ClientManager;
use crate::config::ServerConfig;
use crate::game::World;
use crate::simulation::{Simulation, TickOutcome};
use log::{debug, error, info, warn};
use pong_shared::{
    EndMessage, GameSettings, JoinMessage, Message, NetError, StartMessage, MAX_PLAYERS,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};

/// Longest a single send may wait on a peer that is not reading.
pub const WRITE_TIMEOUT: Duration = Duration::from_millis(500);

/// How long `Server::stop` waits for each task before aborting it.
const STOP_GRACE: Duration = Duration::from_secs(1);

/// Write side of a client connection. The mutex keeps concurrent sends
/// from interleaving bytes on the wire.
pub type ClientWriter = Arc<Mutex<OwnedWriteHalf>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No players connected.
    Idle,
    /// One player connected, waiting for an opponent.
    Waiting,
    /// Two players connected and the simulation is running.
    Active,
    /// The game finished and the final result was sent.
    Ended,
}

struct Session {
    phase: SessionPhase,
    simulation: Simulation,
}

impl Session {
    fn transition(&mut self, phase: SessionPhase) {
        if self.phase != phase {
            info!("Session {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
        }
    }
}

/// State shared by the accept, read and tick tasks.
///
/// Lock order is always `session` before `clients`.
struct Shared {
    clients: RwLock<ClientManager<ClientWriter>>,
    session: Mutex<Session>,
    world: Arc<World>,
    settings: GameSettings,
    tick_duration: Duration,
}

/// Game server bound to a single listening socket.
pub struct Server {
    listener: Option<TcpListener>,
    local_addr: SocketAddr,
    shared: Arc<Shared>,
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl Server {
    /// Binds the listening socket. Nothing is accepted until `start`.
    pub async fn bind(config: &ServerConfig) -> Result<Self, NetError> {
        let bind_error = |source| NetError::Bind {
            addr: config.addr.clone(),
            source,
        };

        let listener = TcpListener::bind(&config.addr).await.map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;
        info!("Server listening on {}", local_addr);

        let world = Arc::new(World::new(config.settings));
        let session = Session {
            phase: SessionPhase::Idle,
            simulation: Simulation::new(Arc::clone(&world), config.tick_rate),
        };

        let shared = Arc::new(Shared {
            clients: RwLock::new(ClientManager::new(MAX_PLAYERS)),
            session: Mutex::new(session),
            world,
            settings: config.settings,
            tick_duration: config.tick_duration(),
        });

        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            listener: Some(listener),
            local_addr,
            shared,
            shutdown_tx,
            tasks: Vec::new(),
        })
    }

    /// Spawns the accept and tick tasks. Calling it again is a no-op.
    pub fn start(&mut self) {
        let Some(listener) = self.listener.take() else {
            debug!("Server already started");
            return;
        };

        let accept = tokio::spawn(accept_loop(
            listener,
            Arc::clone(&self.shared),
            self.shutdown_tx.subscribe(),
        ));
        let tick = tokio::spawn(tick_loop(
            Arc::clone(&self.shared),
            self.shutdown_tx.subscribe(),
        ));

        self.tasks.push(accept);
        self.tasks.push(tick);
        info!("Server started");
    }

    /// Closes the listening socket and every client connection.
    ///
    /// Tasks get `STOP_GRACE` to notice the shutdown signal and are aborted
    /// after that.
    pub async fn stop(&mut self) {
        self.listener = None;
        self.shutdown_tx.send_replace(true);

        for mut task in self.tasks.drain(..) {
            match timeout(STOP_GRACE, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("Server task failed: {}", e),
                Err(_) => {
                    warn!("Server task still running after {:?}, aborting", STOP_GRACE);
                    task.abort();
                }
            }
        }

        let mut session = self.shared.session.lock().await;
        session.simulation.stop();
        session.transition(SessionPhase::Idle);

        let writers = self.shared.clients.write().await.drain();
        for (player_id, writer) in writers {
            if let Err(e) = writer.lock().await.shutdown().await {
                debug!("Closing connection to player {}: {}", player_id, e);
            }
        }

        info!("Server stopped");
    }

    /// Address the listener is bound to. With port 0 in the config this is
    /// the port the OS picked.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of seated players.
    pub async fn client_count(&self) -> usize {
        self.shared.clients.read().await.len()
    }

    /// Current session phase.
    pub async fn phase(&self) -> SessionPhase {
        self.shared.session.lock().await.phase
    }

    /// True while a game is being simulated.
    pub async fn is_game_started(&self) -> bool {
        self.phase().await == SessionPhase::Active
    }

    /// Settings every game on this server is played with.
    pub fn settings(&self) -> GameSettings {
        self.shared.settings
    }

    /// Handle to the authoritative world.
    pub fn world(&self) -> Arc<World> {
        Arc::clone(&self.shared.world)
    }
}

async fn accept_loop(listener: TcpListener, shared: Arc<Shared>, mut shutdown: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            result = listener.accept() => match result {
                Ok((stream, addr)) => {
                    handle_connection(&shared, stream, addr, shutdown.clone()).await;
                }
                Err(e) => {
                    error!("{}", NetError::Accept(e));
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            },
        }
    }
    debug!("Accept loop stopped");
}

/// Seats a new connection, or drops it if both seats are taken.
///
/// Capacity is checked before taking the session lock and again when
/// seating.
async fn handle_connection(
    shared: &Arc<Shared>,
    stream: TcpStream,
    addr: SocketAddr,
    shutdown: watch::Receiver<bool>,
) {
    if shared.clients.read().await.is_full() {
        info!("Rejected connection from {}: server full", addr);
        return;
    }

    if let Err(e) = stream.set_nodelay(true) {
        debug!("Failed to set TCP_NODELAY for {}: {}", addr, e);
    }
    let (read_half, write_half) = stream.into_split();
    let writer: ClientWriter = Arc::new(Mutex::new(write_half));

    let mut session = shared.session.lock().await;

    let seat = {
        let mut clients = shared.clients.write().await;
        clients
            .add_client(addr, Arc::clone(&writer))
            .and_then(|id| clients.get(id).map(|client| (id, client.name.clone())))
    };
    let Some((player_id, player_name)) = seat else {
        // Both halves drop here, which closes the socket.
        info!("Rejected connection from {}: server full", addr);
        return;
    };

    let join = Message::Join(JoinMessage {
        player_id,
        player_name,
    });
    if let Err(e) = send_message(&writer, &join).await {
        warn!("Failed to send join to player {}: {}", player_id, e);
    }

    tokio::spawn(read_loop(Arc::clone(shared), player_id, read_half, shutdown));

    let count = shared.clients.read().await.len();
    if count == MAX_PLAYERS && session.phase != SessionPhase::Active {
        session.simulation.start().await;
        session.transition(SessionPhase::Active);
        let start = Message::Start(StartMessage {
            settings: shared.settings,
        });
        broadcast(shared, &start).await;
    } else if session.phase == SessionPhase::Idle {
        session.transition(SessionPhase::Waiting);
    }
}

async fn read_loop(
    shared: Arc<Shared>,
    player_id: u32,
    read_half: OwnedReadHalf,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut lines = BufReader::new(read_half).lines();

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => return,
            line = lines.next_line() => match line {
                Ok(Some(line)) => handle_line(&shared, player_id, &line).await,
                Ok(None) => break,
                Err(e) => {
                    debug!("Read from player {} failed: {}", player_id, e);
                    break;
                }
            },
        }
    }

    handle_disconnect(&shared, player_id).await;
}

async fn handle_line(shared: &Shared, player_id: u32, line: &str) {
    if line.trim().is_empty() {
        return;
    }

    match Message::decode(line) {
        Ok(Message::Input(input)) => {
            if input.player_id != player_id {
                debug!(
                    "Player {} sent input labelled as player {}",
                    player_id, input.player_id
                );
            }
            // Paddles only exist once a game has been initialized.
            if !shared
                .world
                .apply_input(player_id, input.paddle1_y, input.paddle2_x)
                .await
            {
                debug!("Ignored input from player {}", player_id);
            }
        }
        Ok(other) => {
            warn!(
                "Player {} sent unexpected {} message",
                player_id,
                other.kind().as_str()
            );
        }
        Err(e) => warn!("Dropping message from player {}: {}", player_id, e),
    }
}

async fn handle_disconnect(shared: &Shared, player_id: u32) {
    let mut session = shared.session.lock().await;

    let remaining = {
        let mut clients = shared.clients.write().await;
        if !clients.remove_client(player_id) {
            return;
        }
        clients.len()
    };

    if session.phase == SessionPhase::Active && remaining < MAX_PLAYERS {
        session.simulation.stop();
        info!(
            "Game aborted after {} ticks: player {} left",
            session.simulation.tick_count(),
            player_id
        );
        broadcast(shared, &Message::End(EndMessage::aborted())).await;
    }

    if remaining == 0 {
        session.transition(SessionPhase::Idle);
    } else {
        session.transition(SessionPhase::Waiting);
    }
}

async fn tick_loop(shared: Arc<Shared>, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = interval(shared.tick_duration);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {
                // A broadcast stuck on a slow peer must not delay shutdown.
                tokio::select! {
                    biased;
                    _ = shutdown.changed() => break,
                    _ = on_tick(&shared) => {}
                }
            }
        }
    }
    debug!("Tick loop stopped");
}

async fn on_tick(shared: &Shared) {
    let mut session = shared.session.lock().await;
    if session.phase != SessionPhase::Active {
        return;
    }

    let outcome = session.simulation.tick().await;
    if matches!(outcome, TickOutcome::Idle | TickOutcome::Skipped) {
        return;
    }

    let snapshot = shared.world.snapshot().await;
    broadcast(shared, &Message::State(snapshot.to_state_message())).await;

    if outcome == TickOutcome::Ended {
        session.transition(SessionPhase::Ended);
        broadcast(shared, &Message::End(snapshot.to_end_message())).await;
    }
}

/// Sends `message` to every seated client. Failures are logged per client.
async fn broadcast(shared: &Shared, message: &Message) {
    let data = match message.encode() {
        Ok(data) => data,
        Err(e) => {
            error!("{}", NetError::Encode(e));
            return;
        }
    };

    let writers = shared.clients.read().await.get_client_writers();
    for (player_id, writer) in writers {
        if let Err(e) = write_line(&writer, &data).await {
            warn!(
                "Failed to send {} to player {}: {}",
                message.kind().as_str(),
                player_id,
                e
            );
        }
    }
}

async fn send_message(writer: &ClientWriter, message: &Message) -> Result<(), NetError> {
    let data = message.encode()?;
    write_line(writer, &data).await
}

/// Writes one encoded line, giving up after `WRITE_TIMEOUT`.
///
/// On timeout part of the line may already be on the wire, so the write
/// side is shut down and every later send to this peer fails at once.
async fn write_line(writer: &ClientWriter, data: &[u8]) -> Result<(), NetError> {
    let mut writer = writer.lock().await;
    match timeout(WRITE_TIMEOUT, writer.write_all(data)).await {
        Ok(result) => result.map_err(NetError::Write),
        Err(_) => {
            if let Err(e) = writer.shutdown().await {
                debug!("Closing stalled connection: {}", e);
            }
            Err(NetError::WriteTimeout(WRITE_TIMEOUT))
        }
    }
}
