//! Shared utilities for integration testing.

use std::net::SocketAddr;

use locale_redirect::config::{parse_config, GatewayConfig};
use locale_redirect::http::HttpServer;
use locale_redirect::lifecycle::Shutdown;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// Start a mock upstream that answers `"<x-store-code or none> <target>"`.
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                }

                let head = String::from_utf8_lossy(&buf);
                let mut lines = head.lines();
                let target = lines
                    .next()
                    .and_then(|line| line.split_whitespace().nth(1))
                    .unwrap_or("?")
                    .to_string();
                let store = lines
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("x-store-code"))
                    .map(|(_, value)| value.trim().to_string())
                    .unwrap_or_else(|| "none".to_string());

                let body = format!("{} {}", store, target);
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// A running gateway under test.
pub struct Gateway {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub config_updates: mpsc::UnboundedSender<GatewayConfig>,
}

impl Gateway {
    pub fn url(&self, target: &str) -> String {
        format!("http://{}{}", self.addr, target)
    }
}

impl Drop for Gateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a gateway on an ephemeral port.
pub async fn start_gateway(config: GatewayConfig) -> Gateway {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (config_updates, updates_rx) = mpsc::unbounded_channel();
    let server = HttpServer::new(config);
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, updates_rx, server_shutdown).await;
    });

    Gateway {
        addr,
        shutdown,
        config_updates,
    }
}

/// Client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Two sibling stores on one website plus one store on another.
///
/// `us` has redirection enabled and expects `en`; `fr` expects `fr`;
/// `pro_de` lives on a separate website and expects `de`.
pub fn shop_config(upstream: Option<SocketAddr>) -> GatewayConfig {
    let upstream = upstream
        .map(|addr| format!("[upstream]\naddress = \"{}\"\n", addr))
        .unwrap_or_default();

    parse_config(&format!(
        r#"
{upstream}
[run_code]
header = "x-run-code"
default = "us"

[run_code.hosts]
"example.fr" = "fr"

[defaults]
"web/url/accept_language_redirection" = "0"

[[websites]]
id = 1
code = "base"

[[websites]]
id = 2
code = "pro"

[[stores]]
id = 1
code = "us"
website_id = 1
[stores.config]
"web/secure/base_url" = "https://example.com/"
"web/url/accept_language_redirection" = "1"
"web/url/accept_language_expected_value" = "en"

[[stores]]
id = 2
code = "fr"
website_id = 1
[stores.config]
"web/secure/base_url" = "https://example.fr/"
"web/url/accept_language_expected_value" = "fr"

[[stores]]
id = 3
code = "pro_de"
website_id = 2
[stores.config]
"web/secure/base_url" = "https://pro.example.de/"
"web/url/accept_language_redirection" = "1"
"web/url/accept_language_expected_value" = "de"
"#
    ))
    .unwrap()
}
