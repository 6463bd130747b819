use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, UnixStream};
use tokio::process::{Child, Command};
use tonic::transport::Channel;
use tracing::{debug, info, warn};

use super::tfplugin5::provider_client::ProviderClient;
use crate::error::{ProviderError, Result};

/// The go-plugin handshake magic cookie.
const MAGIC_COOKIE_KEY: &str = "TF_PLUGIN_MAGIC_COOKIE";
const MAGIC_COOKIE_VALUE: &str = "d602bf8f470bc67ca7faa0386276bbdd4330efaf76d1a219cb4d6991ca9872b2";

const CORE_PROTOCOL_VERSION: u32 = 1;
const APP_PROTOCOL_VERSION: u32 = 5;
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

// Large providers ship schemas of hundreds of megabytes
const MAX_MSG_SIZE: usize = 256 * 1024 * 1024;

/// Options accepted when launching a provider binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct LaunchOptions {
    /// Pass the provider's stderr through to ours instead of routing it to tracing.
    pub debug: bool,
}

/// A running provider subprocess.
pub struct ProviderProcess {
    child: Child,
}

impl ProviderProcess {
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Terminate the process, with `signal` on unix when given, otherwise a
    /// plain kill. A process still running after the grace period is killed.
    /// Returns whether the process was terminated.
    pub async fn terminate(&mut self, signal: Option<i32>) -> bool {
        self.terminate_within(signal, SHUTDOWN_GRACE).await
    }

    async fn terminate_within(&mut self, signal: Option<i32>, grace: Duration) -> bool {
        let sent = match (signal, self.child.id()) {
            (Some(sig), Some(pid)) => send_signal(pid, sig),
            (None, Some(_)) => self.child.start_kill().is_ok(),
            // Already reaped
            (_, None) => return false,
        };
        if !sent {
            return false;
        }
        if let Some(exited) = self.wait_for_exit(grace).await {
            return exited;
        }

        warn!(
            "Provider process did not exit within {}s of signal {:?}; killing it",
            grace.as_secs_f32(),
            signal
        );
        if self.child.start_kill().is_err() {
            return false;
        }
        self.wait_for_exit(grace).await.unwrap_or(false)
    }

    /// `None` when the process is still running after `grace`.
    async fn wait_for_exit(&mut self, grace: Duration) -> Option<bool> {
        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => {
                debug!("Provider process exited: {}", status);
                Some(true)
            }
            Ok(Err(e)) => {
                warn!("Failed to wait for provider process: {}", e);
                Some(false)
            }
            Err(_) => None,
        }
    }
}

#[cfg(unix)]
fn send_signal(pid: u32, signal: i32) -> bool {
    // SAFETY: kill(2) has no memory-safety preconditions.
    unsafe { libc::kill(pid as libc::pid_t, signal) == 0 }
}

#[cfg(not(unix))]
fn send_signal(_pid: u32, _signal: i32) -> bool {
    false
}

/// Start a provider binary and establish a gRPC connection to it.
pub async fn launch(
    binary_path: &Path,
    options: LaunchOptions,
) -> Result<(ProviderClient<Channel>, ProviderProcess)> {
    info!("Starting provider: {}", binary_path.display());

    let mut child = Command::new(binary_path)
        .env(MAGIC_COOKIE_KEY, MAGIC_COOKIE_VALUE)
        .env("PLUGIN_MIN_PORT", "10000")
        .env("PLUGIN_MAX_PORT", "25000")
        .env("PLUGIN_PROTOCOL_VERSIONS", APP_PROTOCOL_VERSION.to_string())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .spawn()?;

    // Drain stderr in a background task so the provider never blocks on a
    // full pipe buffer.
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| ProviderError::Handshake("failed to capture provider stderr".into()))?;
    tokio::spawn(drain_stderr(stderr, options.debug));

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| ProviderError::Handshake("failed to capture provider stdout".into()))?;
    let mut reader = tokio::io::BufReader::new(stdout);
    let mut handshake_line = String::new();

    match tokio::time::timeout(HANDSHAKE_TIMEOUT, reader.read_line(&mut handshake_line)).await {
        Ok(Ok(0)) => {
            return Err(ProviderError::Handshake("provider exited before handshake".into()))
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => {
            return Err(ProviderError::Handshake(format!(
                "timed out after {}s",
                HANDSHAKE_TIMEOUT.as_secs()
            )))
        }
        Ok(Ok(_)) => {}
    }

    let handshake = parse_handshake(handshake_line.trim())?;
    debug!("Provider handshake: {:?}", handshake);

    let endpoint_addr = if handshake.network_type == "unix" {
        proxy_unix_socket(handshake.address).await?
    } else {
        let endpoint = format!("http://{}", handshake.address);
        info!("Connecting to provider gRPC at {}", endpoint);
        endpoint
    };

    let channel = Channel::from_shared(endpoint_addr)
        .map_err(|e| ProviderError::Handshake(format!("invalid provider endpoint: {}", e)))?
        .initial_stream_window_size((1 << 31) - 1)
        .initial_connection_window_size((1 << 31) - 1)
        .connect()
        .await?;

    let client = ProviderClient::new(channel)
        .max_decoding_message_size(MAX_MSG_SIZE)
        .max_encoding_message_size(MAX_MSG_SIZE);

    Ok((client, ProviderProcess { child }))
}

async fn drain_stderr(stderr: tokio::process::ChildStderr, passthrough: bool) {
    let mut reader = tokio::io::BufReader::new(stderr);
    let mut out = tokio::io::stderr();
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                if passthrough {
                    if out.write_all(line.as_bytes()).await.is_err() {
                        break;
                    }
                    continue;
                }
                let trimmed = line.trim_end();
                if trimmed.is_empty() {
                    continue;
                }
                if is_important_log_line(trimmed) {
                    warn!(target: "provider_stderr", "{}", trimmed);
                } else {
                    debug!(target: "provider_stderr", "{}", trimmed);
                }
            }
        }
    }
}

/// Provider stderr is JSON-structured go-hclog output. Only warn/error/fatal
/// lines, and non-JSON lines that look like crashes, are worth surfacing.
fn is_important_log_line(line: &str) -> bool {
    if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(line) {
        return matches!(
            parsed.get("@level").and_then(|l| l.as_str()),
            Some("warn" | "error" | "fatal")
        );
    }
    let upper = line.to_uppercase();
    upper.contains("PANIC")
        || upper.contains("FATAL")
        || upper.starts_with("GOROUTINE ")
        || upper.starts_with("[ERROR]")
        || upper.starts_with("[WARN]")
}

/// tonic's unix connector does not apply h2 connection-level window sizes,
/// which stalls large schema responses. Bridge the socket through a local
/// TCP listener instead and return its endpoint.
async fn proxy_unix_socket(socket_path: String) -> Result<String> {
    info!("Connecting to provider gRPC via unix socket: {}", socket_path);

    let tcp_listener = TcpListener::bind("127.0.0.1:0").await?;
    let proxy_addr = tcp_listener.local_addr()?;
    debug!("TCP proxy for unix socket listening on {}", proxy_addr);

    tokio::spawn(async move {
        loop {
            match tcp_listener.accept().await {
                Ok((tcp_stream, _)) => {
                    let path = socket_path.clone();
                    tokio::spawn(async move {
                        match UnixStream::connect(&path).await {
                            Ok(unix_stream) => {
                                let (mut tcp_read, mut tcp_write) = tokio::io::split(tcp_stream);
                                let (mut unix_read, mut unix_write) = tokio::io::split(unix_stream);
                                let t2u = tokio::io::copy(&mut tcp_read, &mut unix_write);
                                let u2t = tokio::io::copy(&mut unix_read, &mut tcp_write);
                                let _ = tokio::try_join!(t2u, u2t);
                            }
                            Err(e) => {
                                tracing::error!("Failed to connect to unix socket {}: {}", path, e);
                            }
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("TCP proxy accept error: {}", e);
                    break;
                }
            }
        }
    });

    Ok(format!("http://{}", proxy_addr))
}

// ─── Handshake ───────────────────────────────────────────────────────────────

#[derive(Debug, PartialEq, Eq)]
struct Handshake {
    core_protocol: u32,
    app_protocol: u32,
    network_type: String,
    address: String,
    protocol: String,
}

fn parse_handshake(line: &str) -> Result<Handshake> {
    let parts: Vec<&str> = line.split('|').collect();
    if parts.len() < 5 {
        return Err(ProviderError::Handshake(format!(
            "expected 5 pipe-separated fields, got '{}'",
            line
        )));
    }

    let number = |field: &str, what: &str| {
        field
            .parse::<u32>()
            .map_err(|_| ProviderError::Handshake(format!("invalid {} version '{}'", what, field)))
    };

    let handshake = Handshake {
        core_protocol: number(parts[0], "core protocol")?,
        app_protocol: number(parts[1], "app protocol")?,
        network_type: parts[2].to_string(),
        address: parts[3].to_string(),
        protocol: parts[4].to_string(),
    };

    if handshake.core_protocol != CORE_PROTOCOL_VERSION {
        return Err(ProviderError::Handshake(format!(
            "unsupported core protocol version {}",
            handshake.core_protocol
        )));
    }
    if handshake.app_protocol != APP_PROTOCOL_VERSION {
        return Err(ProviderError::Handshake(format!(
            "unsupported provider protocol version {} (only {} is supported)",
            handshake.app_protocol, APP_PROTOCOL_VERSION
        )));
    }
    if handshake.protocol != "grpc" {
        return Err(ProviderError::Handshake(format!(
            "unsupported plugin protocol '{}'",
            handshake.protocol
        )));
    }
    Ok(handshake)
}
