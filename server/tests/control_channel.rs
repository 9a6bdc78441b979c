use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use peersync_entities::Clock;
use peersync_server::{ControlServer, DeparturePolicy, ServerConfig};
use tokio::{net::UdpSocket, time::timeout};

const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

/// Clock that only moves when a test advances it.
struct ManualClock(Mutex<Instant>);

impl ManualClock {
    fn advance(&self, by: Duration) {
        *self.0.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.0.lock().unwrap()
    }
}

async fn start_server(
    on_departure: DeparturePolicy,
) -> (SocketAddr, Arc<ManualClock>) {
    let config = ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
        on_departure,
        ..ServerConfig::default()
    };
    let mut credentials = HashMap::new();
    credentials.insert("alice".to_string(), "password123".to_string());
    credentials.insert("bob".to_string(), "secretpass".to_string());
    credentials.insert("charlie".to_string(), "mypass456".to_string());

    let clock = Arc::new(ManualClock(Mutex::new(Instant::now())));
    let server = ControlServer::bind(&config, Arc::new(credentials))
        .await
        .unwrap()
        .with_clock(clock.clone());
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.serve());
    (addr, clock)
}

struct Peer {
    socket: UdpSocket,
}

impl Peer {
    async fn connect(server: SocketAddr) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        socket.connect(server).await.unwrap();
        Self { socket }
    }

    async fn login(server: SocketAddr, user: &str, pass: &str) -> Self {
        let peer = Self::connect(server).await;
        assert_eq!(peer.ask(&format!("auth {user} {pass}")).await, "OK");
        peer
    }

    async fn ask(&self, text: &str) -> String {
        self.socket.send(text.as_bytes()).await.unwrap();
        let mut buf = [0u8; 1024];
        let len = timeout(REPLY_TIMEOUT, self.socket.recv(&mut buf))
            .await
            .expect("no reply from server")
            .unwrap();
        String::from_utf8(buf[..len].to_vec()).unwrap()
    }

    async fn expect_silence(&self, text: &str) {
        self.socket.send(text.as_bytes()).await.unwrap();
        let mut buf = [0u8; 1024];
        let reply = timeout(
            Duration::from_millis(200),
            self.socket.recv(&mut buf),
        )
        .await;
        assert!(reply.is_err(), "unexpected reply to {text}");
    }
}

#[tokio::test]
async fn get_returns_the_publishers_transfer_endpoint() {
    let (server, _clock) = start_server(DeparturePolicy::Cascade).await;
    let alice = Peer::login(server, "alice", "password123").await;
    let bob = Peer::login(server, "bob", "secretpass").await;

    assert_eq!(alice.ask("TCP 127.0.0.1 50123").await, "OK");
    assert_eq!(alice.ask("pub f").await, "File published successfully");

    assert_eq!(bob.ask("get f").await, "alice 127.0.0.1 50123");
    assert_eq!(bob.ask("get z").await, "File not found");
}

#[tokio::test]
async fn failed_auth_and_unknown_senders_get_err() {
    let (server, _clock) = start_server(DeparturePolicy::Cascade).await;
    let stranger = Peer::connect(server).await;

    assert_eq!(stranger.ask("auth alice wrong").await, "ERR");
    assert_eq!(stranger.ask("lpf").await, "ERR");
    assert_eq!(stranger.ask("dance").await, "ERR");
    stranger.expect_silence("HBT").await;
}

#[tokio::test]
async fn heartbeats_are_never_answered() {
    let (server, _clock) = start_server(DeparturePolicy::Cascade).await;
    let alice = Peer::login(server, "alice", "password123").await;

    alice.expect_silence("HBT").await;
    assert_eq!(alice.ask("lap").await, "No active peers");
}

#[tokio::test]
async fn second_login_for_active_user_is_rejected() {
    let (server, _clock) = start_server(DeparturePolicy::Cascade).await;
    let _alice = Peer::login(server, "alice", "password123").await;
    let impostor = Peer::connect(server).await;

    assert_eq!(impostor.ask("auth alice password123").await, "ERR");
}

#[tokio::test]
async fn listings_follow_publication_order() {
    let (server, _clock) = start_server(DeparturePolicy::Cascade).await;
    let alice = Peer::login(server, "alice", "password123").await;
    let bob = Peer::login(server, "bob", "secretpass").await;
    let charlie = Peer::login(server, "charlie", "mypass456").await;

    assert_eq!(alice.ask("lpf").await, "No published files");
    alice.ask("pub report.pdf").await;
    bob.ask("pub report.pdf").await;
    bob.ask("pub annual report.doc").await;

    assert_eq!(charlie.ask("lpf").await, "report.pdf, annual report.doc");
    assert_eq!(charlie.ask("lap").await, "alice, bob");
    assert_eq!(alice.ask("sch report").await, "report.pdf, annual report.doc");
    assert_eq!(alice.ask("sch Report").await, "No files found");
}

#[tokio::test]
async fn silent_publisher_is_cascaded_out() {
    let (server, clock) = start_server(DeparturePolicy::Cascade).await;
    let alice = Peer::login(server, "alice", "password123").await;
    let bob = Peer::login(server, "bob", "secretpass").await;
    alice.ask("TCP 127.0.0.1 50123").await;
    alice.ask("pub f").await;

    clock.advance(Duration::from_secs(2));
    assert_eq!(bob.ask("lap").await, "alice");

    clock.advance(Duration::from_millis(1500));
    assert_eq!(bob.ask("get f").await, "File not found");
    assert_eq!(bob.ask("lap").await, "No active peers");
    assert_eq!(alice.ask("lpf").await, "ERR");
}

#[tokio::test]
async fn silent_publisher_is_skipped_when_retained() {
    let (server, clock) = start_server(DeparturePolicy::Retain).await;
    let alice = Peer::login(server, "alice", "password123").await;
    let bob = Peer::login(server, "bob", "secretpass").await;
    alice.ask("TCP 127.0.0.1 50123").await;
    alice.ask("pub f").await;

    clock.advance(Duration::from_secs(2));
    assert_eq!(bob.ask("lap").await, "alice");

    clock.advance(Duration::from_millis(1500));
    assert_eq!(bob.ask("get f").await, "No active peer has this file");
}

#[tokio::test]
async fn exactly_at_timeout_the_session_survives() {
    let (server, clock) = start_server(DeparturePolicy::Cascade).await;
    let alice = Peer::login(server, "alice", "password123").await;
    let bob = Peer::login(server, "bob", "secretpass").await;

    clock.advance(Duration::from_secs(3));
    assert_eq!(bob.ask("lap").await, "alice");

    clock.advance(Duration::from_millis(1));
    assert_eq!(bob.ask("lap").await, "No active peers");
    assert_eq!(alice.ask("lap").await, "ERR");
}

#[tokio::test]
async fn exit_logs_the_peer_out() {
    let (server, _clock) = start_server(DeparturePolicy::Cascade).await;
    let alice = Peer::login(server, "alice", "password123").await;
    let bob = Peer::login(server, "bob", "secretpass").await;

    assert_eq!(alice.ask("xit").await, "OK");
    assert_eq!(bob.ask("lap").await, "No active peers");

    assert_eq!(alice.ask("auth alice password123").await, "OK");
    assert_eq!(bob.ask("lap").await, "alice");
}
