//! Stockfish engine wrapper using UCI protocol (async I/O)

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::timeout;

use tracing::{debug, warn};

use crate::error::ReviewError;

/// How long a candidate binary gets to answer `uci` with `uciok`.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Grace period for `bestmove` after a timed-out search is stopped.
const STOP_GRACE: Duration = Duration::from_secs(2);

/// Process-level engine settings
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub threads: u32,
    pub hash_mb: u32,
    /// Per-search timeout; `None` waits for `bestmove` indefinitely
    pub search_timeout: Option<Duration>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            threads: 1,
            hash_mb: 256,
            search_timeout: Some(Duration::from_secs(60)),
        }
    }
}

/// A single PV line from multi-PV analysis
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PvLine {
    /// 1-based rank of the line
    pub multipv: u32,
    /// Principal variation moves
    pub pv: Vec<String>,
    /// Centipawn score (side to move)
    pub cp: Option<i32>,
    /// Mate in N (positive = side to move mates)
    pub mate: Option<i32>,
}

/// Everything a finished search reported
#[derive(Debug, Clone, Default)]
pub struct SearchOutput {
    /// Ranked lines, best first
    pub lines: Vec<PvLine>,
    /// `None` when the position has no legal move
    pub best_move: Option<String>,
}

/// Stockfish engine instance
pub struct StockfishEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    path: String,
    multipv: u32,
    search_timeout: Option<Duration>,
    /// Set when a search could not be brought back to a known state
    desynced: bool,
}

impl StockfishEngine {
    /// Spawn a new Stockfish process and initialize UCI
    pub async fn new(path: &str, options: &EngineOptions) -> Result<Self, ReviewError> {
        let mut process = Command::new(path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ReviewError::Stockfish(format!("Failed to spawn {path}: {e}")))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| ReviewError::Stockfish("Stockfish stdin unavailable".into()))?;
        let stdout = process
            .stdout
            .take()
            .map(BufReader::new)
            .ok_or_else(|| ReviewError::Stockfish("Stockfish stdout unavailable".into()))?;

        let mut engine = Self {
            process,
            stdin,
            stdout,
            path: path.to_string(),
            multipv: 1,
            search_timeout: options.search_timeout,
            desynced: false,
        };

        // Initialize UCI
        engine.send("uci").await?;
        timeout(HANDSHAKE_TIMEOUT, engine.wait_for("uciok"))
            .await
            .map_err(|_| ReviewError::Timeout(HANDSHAKE_TIMEOUT.as_secs()))??;

        // Configure for analysis
        engine
            .send(&format!("setoption name Threads value {}", options.threads))
            .await?;
        engine
            .send(&format!("setoption name Hash value {}", options.hash_mb))
            .await?;
        engine.send("setoption name UCI_AnalyseMode value true").await?;
        engine.send("isready").await?;
        timeout(HANDSHAKE_TIMEOUT, engine.wait_for("readyok"))
            .await
            .map_err(|_| ReviewError::Timeout(HANDSHAKE_TIMEOUT.as_secs()))??;

        Ok(engine)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Send a command to Stockfish
    async fn send(&mut self, cmd: &str) -> Result<(), ReviewError> {
        debug!(cmd, "SF <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| ReviewError::Stockfish(format!("Failed to write to Stockfish: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| ReviewError::Stockfish(format!("Failed to flush stdin: {e}")))?;
        Ok(())
    }

    /// Read one trimmed line; end of stream means the process is gone.
    async fn read_line(&mut self) -> Result<String, ReviewError> {
        let mut line = String::new();
        let read = self
            .stdout
            .read_line(&mut line)
            .await
            .map_err(|e| ReviewError::Stockfish(format!("Failed to read from Stockfish: {e}")))?;
        if read == 0 {
            return Err(ReviewError::EngineClosed);
        }
        let trimmed = line.trim().to_string();
        debug!(line = %trimmed, "SF >");
        Ok(trimmed)
    }

    /// Wait for a specific response line
    async fn wait_for(&mut self, expected: &str) -> Result<(), ReviewError> {
        loop {
            if self.read_line().await? == expected {
                return Ok(());
            }
        }
    }

    /// Search a position to `depth` and return up to `multipv` ranked lines.
    /// Scores are relative to the side to move, as UCI reports them.
    pub async fn search(
        &mut self,
        fen: &str,
        depth: u32,
        multipv: u32,
    ) -> Result<SearchOutput, ReviewError> {
        if self.desynced {
            return Err(ReviewError::Stockfish(
                "engine stopped responding to an earlier search".into(),
            ));
        }

        let multipv = multipv.max(1);
        if multipv != self.multipv {
            self.send(&format!("setoption name MultiPV value {multipv}"))
                .await?;
            self.multipv = multipv;
        }
        self.send(&format!("position fen {fen}")).await?;
        self.send(&format!("go depth {depth}")).await?;

        let Some(limit) = self.search_timeout else {
            return self.collect_search(multipv).await;
        };

        match timeout(limit, self.collect_search(multipv)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(fen, secs = limit.as_secs(), "Search timed out, stopping");
                self.send("stop").await?;
                // Drain the aborted search so the next one starts clean.
                if timeout(STOP_GRACE, self.collect_search(multipv)).await.is_err() {
                    self.desynced = true;
                }
                Err(ReviewError::Timeout(limit.as_secs()))
            }
        }
    }

    async fn collect_search(&mut self, multipv: u32) -> Result<SearchOutput, ReviewError> {
        let mut lines: Vec<PvLine> = vec![PvLine::default(); multipv as usize];

        loop {
            let line = self.read_line().await?;

            if line.starts_with("info") && line.contains(" score ") {
                // Bound scores are provisional; the exact one follows.
                if line.contains("lowerbound") || line.contains("upperbound") {
                    continue;
                }
                let idx = parse_multipv_index(&line).unwrap_or(1).max(1);
                if let Some(entry) = lines.get_mut(idx as usize - 1) {
                    entry.multipv = idx;
                    entry.cp = parse_cp(&line);
                    entry.mate = parse_mate(&line);
                    entry.pv = parse_pv(&line);
                }
            } else if line.starts_with("bestmove") {
                let best_move = line
                    .split_whitespace()
                    .nth(1)
                    .filter(|m| *m != "(none)")
                    .map(String::from);
                lines.retain(|l| l.cp.is_some() || l.mate.is_some());
                return Ok(SearchOutput { lines, best_move });
            }
        }
    }

    /// Send quit command and wait for process to exit
    pub async fn quit(&mut self) {
        let _ = self.send("quit").await;
        if timeout(STOP_GRACE, self.process.wait()).await.is_err() {
            let _ = self.process.start_kill();
        }
    }
}

impl Drop for StockfishEngine {
    fn drop(&mut self) {
        // Best-effort synchronous kill in drop
        let _ = self.process.start_kill();
    }
}

/// Value following `key` in a whitespace-separated info line
fn token_after<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let mut parts = line.split_whitespace();
    while let Some(part) = parts.next() {
        if part == key {
            return parts.next();
        }
    }
    None
}

/// Parse centipawn score from info line
fn parse_cp(line: &str) -> Option<i32> {
    token_after(line, "cp")?.parse().ok()
}

/// Parse mate score from info line
fn parse_mate(line: &str) -> Option<i32> {
    token_after(line, "mate")?.parse().ok()
}

/// Parse multipv index from info line
fn parse_multipv_index(line: &str) -> Option<u32> {
    token_after(line, "multipv")?.parse().ok()
}

/// Parse PV moves from info line
fn parse_pv(line: &str) -> Vec<String> {
    line.split_whitespace()
        .skip_while(|part| *part != "pv")
        .skip(1)
        // PV ends at next keyword or end of line
        .take_while(|part| !part.starts_with("bmc") && *part != "string")
        .map(String::from)
        .collect()
}
