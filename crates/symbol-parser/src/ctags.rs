use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use index_core::SymbolEntry;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::source::SymbolSource;

/// Hard bound on a single `parse` call. Not user-tunable: a longer timeout
/// defeats the point of bounding the blast radius of a hung subprocess, and
/// a shorter one would be indistinguishable from "the repo has huge files".
const PARSE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Serialize)]
struct ParseRequest<'a> {
    name: &'a str,
    content: &'a [u8],
}

#[derive(Deserialize)]
struct ParseResponse {
    entries: Vec<SymbolEntry>,
}

struct ParserState {
    child: Option<Child>,
}

/// One long-lived external parser subprocess, lazily spawned on first
/// `parse`, with all calls serialized through a single mutex since the
/// subprocess speaks one request/response pair at a time over its pipes.
pub struct CtagsSubprocess {
    binary: PathBuf,
    args: Vec<String>,
    state: Mutex<ParserState>,
}

impl CtagsSubprocess {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self { binary: binary.into(), args: Vec::new(), state: Mutex::new(ParserState { child: None }) }
    }

    fn spawn(&self) -> Result<Child> {
        tracing::debug!(binary = %self.binary.display(), "spawning symbol parser subprocess");
        Command::new(&self.binary)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(Error::Io)
    }
}

#[async_trait]
impl SymbolSource for CtagsSubprocess {
    async fn parse(&self, name: &str, content: &[u8]) -> Result<Vec<SymbolEntry>> {
        let mut guard = self.state.lock().await;
        if guard.child.is_none() {
            guard.child = Some(self.spawn()?);
        }

        let attempt = tokio::time::timeout(PARSE_TIMEOUT, async {
            let child = guard.child.as_mut().expect("spawned above");
            let stdin = child.stdin.as_mut().ok_or_else(|| Error::Protocol("subprocess stdin closed".into()))?;
            let stdout = child.stdout.as_mut().ok_or_else(|| Error::Protocol("subprocess stdout closed".into()))?;
            write_request(stdin, name, content).await?;
            read_response(stdout).await
        })
        .await;

        match attempt {
            Ok(result) => result,
            Err(_elapsed) => {
                // Timed out: kill the child and mark the parser closed so the
                // next call respawns a fresh one. This bounds the blast
                // radius of a hang on a pathological input.
                tracing::warn!(name, timeout = ?PARSE_TIMEOUT, "symbol parser timed out, killing subprocess");
                if let Some(mut child) = guard.child.take() {
                    let _ = child.kill().await;
                }
                Err(Error::Timeout(PARSE_TIMEOUT))
            }
        }
    }

    async fn close(&self) {
        let mut guard = self.state.lock().await;
        if let Some(mut child) = guard.child.take() {
            tracing::debug!("closing symbol parser subprocess");
            let _ = child.kill().await;
        }
    }
}

async fn write_request<W: AsyncWrite + Unpin>(w: &mut W, name: &str, content: &[u8]) -> Result<()> {
    let request = ParseRequest { name, content };
    let bytes = serde_json::to_vec(&request).map_err(|e| Error::Protocol(e.to_string()))?;
    w.write_all(&(bytes.len() as u32).to_le_bytes()).await?;
    w.write_all(&bytes).await?;
    w.flush().await?;
    Ok(())
}

async fn read_response<R: AsyncRead + Unpin>(r: &mut R) -> Result<Vec<SymbolEntry>> {
    let mut len_buf = [0u8; 4];
    r.read_exact(&mut len_buf).await?;
    let len = u32::from_le_bytes(len_buf) as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf).await?;
    let response: ParseResponse = serde_json::from_slice(&buf).map_err(|e| Error::Protocol(e.to_string()))?;
    Ok(response.entries)
}
