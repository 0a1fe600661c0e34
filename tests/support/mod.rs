// Shared primitives for one-time server bootstrapping across integration tests.
use std::{
    net::SocketAddr,
    sync::{Arc, OnceLock},
    time::Duration,
};

// Global endpoints published once the server binds its ephemeral ports.
static SERVER_URL: OnceLock<String> = OnceLock::new();
static TRACKING_ADDR: OnceLock<SocketAddr> = OnceLock::new();
// Keep the fake sound host socket alive for the whole test process so the
// server always has a live UDP peer to talk to.
static SOUND_SINK: OnceLock<std::net::UdpSocket> = OnceLock::new();
// One-time guard that ensures the server bootstrap path runs only once.
static SERVER_READY: OnceLock<()> = OnceLock::new();

pub struct TestServer {
    pub base_url: &'static str,
    pub tracking_addr: SocketAddr,
}

// Ensure the test server is running and return its endpoints.
pub fn ensure_server() -> TestServer {
    SERVER_READY.get_or_init(|| {
        // Stand-in for the external sound host; events land here.
        let sound_sink =
            std::net::UdpSocket::bind("127.0.0.1:0").expect("bind sound sink socket");
        let sound_target = sound_sink.local_addr().expect("sound sink addr");
        let _ = SOUND_SINK.set(sound_sink);

        let published = Arc::new(OnceLock::<(String, SocketAddr)>::new());
        let published_thread = Arc::clone(&published);
        // Spawn an OS thread so the server outlives individual `#[tokio::test]` runtimes.
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            runtime.block_on(async move {
                // Ephemeral ports avoid collisions with local services.
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral http port");
                let addr = listener.local_addr().expect("get local addr");

                let tracking_socket = tokio::net::UdpSocket::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral tracking port");
                let tracking_addr = tracking_socket.local_addr().expect("tracking addr");

                let sound_socket = tokio::net::UdpSocket::bind("0.0.0.0:0")
                    .await
                    .expect("bind sound socket");

                let _ = published_thread.set((format!("http://{}", addr), tracking_addr));
                dome_server::run(listener, tracking_socket, sound_socket, sound_target)
                    .await
                    .expect("server failed");
            });
        });

        // Block until the endpoints are published and the http port accepts.
        let (base_url, tracking_addr) = loop {
            if let Some(endpoints) = published.get() {
                break endpoints.clone();
            }
            std::thread::sleep(Duration::from_millis(10));
        };
        let _ = SERVER_URL.set(base_url.clone());
        let _ = TRACKING_ADDR.set(tracking_addr);

        let addr = base_url
            .strip_prefix("http://")
            .expect("base url should use http://");
        for _ in 0..100 {
            if std::net::TcpStream::connect(addr).is_ok() {
                return;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        panic!("server did not become ready in time");
    });

    TestServer {
        base_url: SERVER_URL.get().expect("server url initialized").as_str(),
        tracking_addr: *TRACKING_ADDR.get().expect("tracking addr initialized"),
    }
}
