//! Shared utilities for integration tests.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use config_aggregator::dynamic::{Configuration, Message};
use config_aggregator::lifecycle::TaskPool;
use config_aggregator::provider::{emit, Provider, ProviderError};

/// Upper bound on any single wait for a message.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Scriptable provider emitting one empty configuration.
#[derive(Debug, Clone)]
pub struct MockProvider {
    name: String,
    fail_init: bool,
    fail_provide: bool,
    panic_provide: bool,
    hang: bool,
}

#[allow(dead_code)]
impl MockProvider {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fail_init: false,
            fail_provide: false,
            panic_provide: false,
            hang: false,
        }
    }

    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    pub fn failing_provide(mut self) -> Self {
        self.fail_provide = true;
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panic_provide = true;
        self
    }

    /// Keep running after the first message, ignoring cancellation.
    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn init(&mut self) -> Result<(), ProviderError> {
        if self.fail_init {
            return Err(ProviderError::Other(format!("{} cannot connect", self.name)));
        }
        Ok(())
    }

    async fn provide(
        &self,
        sink: mpsc::Sender<Message>,
        _pool: Arc<dyn TaskPool>,
    ) -> Result<(), ProviderError> {
        if self.panic_provide {
            panic!("{} exploded", self.name);
        }
        if self.fail_provide {
            return Err(ProviderError::Other(format!("{} is unreachable", self.name)));
        }

        emit(&sink, &self.name, Configuration::default()).await?;

        if self.hang {
            std::future::pending::<()>().await;
        }
        Ok(())
    }
}

/// Wait for one message per name; order among `names` does not matter.
#[allow(dead_code)]
pub async fn require_received_from(rx: &mut mpsc::Receiver<Message>, names: &[&str]) {
    let mut received = Vec::new();
    for _ in names {
        match tokio::time::timeout(RECV_TIMEOUT, rx.recv()).await {
            Ok(Some(msg)) => received.push(msg.provider_name),
            Ok(None) | Err(_) => break,
        }
    }

    let mut expected: Vec<String> = names.iter().map(|n| n.to_string()).collect();
    expected.sort();
    received.sort();
    assert_eq!(received, expected);
}

/// Assert the sink closes (every sender gone) without further messages.
#[allow(dead_code)]
pub async fn require_closed(rx: &mut mpsc::Receiver<Message>) {
    match tokio::time::timeout(RECV_TIMEOUT, rx.recv()).await {
        Ok(None) => {}
        Ok(Some(msg)) => panic!("unexpected message from {}", msg.provider_name),
        Err(_) => panic!("sink still open"),
    }
}

/// Start a programmable HTTP backend on an ephemeral port.
///
/// `f` is called once per request and returns the status code and JSON body.
#[allow(dead_code)]
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let mut buf = [0u8; 1024];
                        let _ = socket.read(&mut buf).await;

                        let (status, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}
