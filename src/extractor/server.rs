//! Ephemeral HTTP server for local documents
//!
//! Browsers will not compute layout for a document they cannot navigate to,
//! so a local or inline document is served from `127.0.0.1` on a random port.
//! The document itself lives at a unique path inside its directory, which
//! keeps its relative stylesheet, image and font references working; every
//! other path is served as a static file below the server root.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use url::Url;
use uuid::Uuid;

use crate::utils::{content_type_for, normalize_path};

const MAX_REQUEST_HEADER: usize = 64 * 1024;

struct ServeState {
    root: PathBuf,
    document_route: String,
    document: String,
}

/// A running local server; stops when dropped
pub struct LocalServer {
    addr: SocketAddr,
    document_route: String,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl LocalServer {
    /// Serve `document` from a unique path inside `document_dir`
    ///
    /// `root` bounds static file access and must contain `document_dir`; when
    /// it does not, the document directory itself becomes the root.
    pub async fn start(root: &Path, document_dir: &Path, document: String) -> Result<Self> {
        let document_dir = normalize_path(document_dir);
        let root = normalize_path(root);
        let root = if document_dir.starts_with(&root) {
            root
        } else {
            document_dir.clone()
        };

        let relative_dir = pathdiff::diff_paths(&document_dir, &root).unwrap_or_default();
        let mut document_route = String::from("/");
        for segment in relative_dir.components() {
            document_route.push_str(&segment.as_os_str().to_string_lossy());
            document_route.push('/');
        }
        document_route.push_str(&format!("__critical_{}.html", Uuid::new_v4().simple()));

        let listener = TcpListener::bind(("127.0.0.1", 0))
            .await
            .context("Failed to bind local document server")?;
        let addr = listener
            .local_addr()
            .context("Failed to read local server address")?;

        let state = Arc::new(ServeState {
            root,
            document_route: document_route.clone(),
            document,
        });
        let (shutdown, mut shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    accepted = listener.accept() => match accepted {
                        Ok((stream, _)) => {
                            let state = Arc::clone(&state);
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, &state).await {
                                    log::debug!("Local server request error: {e:#}");
                                }
                            });
                        }
                        Err(e) => log::warn!("Local server accept error: {e}"),
                    }
                }
            }
            log::debug!("Local document server on {addr} stopped");
        });

        log::debug!("Serving local document at http://{addr}{document_route}");
        Ok(Self {
            addr,
            document_route,
            shutdown: Some(shutdown),
            task,
        })
    }

    /// URL of the served document
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}{}", self.addr, self.document_route)
    }

    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Drop for LocalServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        self.task.abort();
    }
}

async fn handle_connection(mut stream: TcpStream, state: &ServeState) -> Result<()> {
    let (method, target) = read_request_line(&mut stream).await?;
    let path = target.split(['?', '#']).next().unwrap_or("/");

    if method != "GET" && method != "HEAD" {
        return write_response(&mut stream, &method, "405 Method Not Allowed", "text/plain", b"").await;
    }

    if path == state.document_route {
        return write_response(
            &mut stream,
            &method,
            "200 OK",
            "text/html; charset=utf-8",
            state.document.as_bytes(),
        )
        .await;
    }

    let Some(file) = static_file(&state.root, path) else {
        return write_response(&mut stream, &method, "403 Forbidden", "text/plain", b"forbidden").await;
    };
    match tokio::fs::read(&file).await {
        Ok(body) => {
            let content_type = content_type_for(path).unwrap_or("application/octet-stream");
            write_response(&mut stream, &method, "200 OK", content_type, &body).await
        }
        Err(_) => write_response(&mut stream, &method, "404 Not Found", "text/plain", b"not found").await,
    }
}

/// Map a request path to a file below `root`, rejecting anything that escapes it
fn static_file(root: &Path, path: &str) -> Option<PathBuf> {
    let root_url = Url::from_directory_path(root).ok()?;
    let joined = root_url.join(path.trim_start_matches('/')).ok()?;
    let file = normalize_path(&joined.to_file_path().ok()?);
    file.starts_with(root).then_some(file)
}

async fn read_request_line(stream: &mut TcpStream) -> Result<(String, String)> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await.context("Failed to read request")?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
        if buf.len() > MAX_REQUEST_HEADER {
            anyhow::bail!("request header too large");
        }
    }

    let text = String::from_utf8_lossy(&buf);
    let line = text.lines().next().context("missing request line")?;
    let mut parts = line.split_whitespace();
    let method = parts.next().context("missing method")?.to_string();
    let target = parts.next().context("missing path")?.to_string();
    Ok((method, target))
}

async fn write_response(
    stream: &mut TcpStream,
    method: &str,
    status: &str,
    content_type: &str,
    body: &[u8],
) -> Result<()> {
    let header = format!(
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nCache-Control: no-store\r\nConnection: close\r\n\r\n",
        body.len()
    );
    stream.write_all(header.as_bytes()).await?;
    if method != "HEAD" {
        stream.write_all(body).await?;
    }
    stream.flush().await?;
    Ok(())
}
