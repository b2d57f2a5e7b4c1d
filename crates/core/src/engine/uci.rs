//! UCI engine session
//!
//! Spawns a UCI engine (Lc0, Stockfish, ...) as a subprocess and talks to it
//! over stdin/stdout. One session owns exactly one process.

use std::collections::HashSet;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use shakmaty::uci::UciMove;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::timeout;
use tracing::{debug, warn};

use super::analysis::{parse_info_line, CandidateMove, Evaluation};
use super::Engine;

/// How long the engine may take to load before answering the handshake
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);

/// Extra time granted on top of a search budget before giving up
const DEFAULT_GRACE: Duration = Duration::from_secs(10);

/// Error type for engine operations
#[derive(Debug)]
pub enum EngineError {
    /// Failed to start the engine process
    SpawnError(String),
    /// Failed to communicate with engine
    IoError(std::io::Error),
    /// Engine returned unexpected response
    ProtocolError(String),
    /// Engine reported that it has no move to play
    NoMove,
    /// Engine did not answer within the allowed time
    Timeout(Duration),
    /// Engine does not advertise the requested option
    UnsupportedOption(String),
    /// Engine process has exited or was released
    Closed,
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::SpawnError(s) => write!(f, "Failed to start engine: {}", s),
            EngineError::IoError(e) => write!(f, "I/O error: {}", e),
            EngineError::ProtocolError(s) => write!(f, "Protocol error: {}", s),
            EngineError::NoMove => write!(f, "Engine reported no legal move"),
            EngineError::Timeout(d) => write!(f, "Engine did not respond within {:?}", d),
            EngineError::UnsupportedOption(name) => {
                write!(f, "Engine does not support option '{}'", name)
            }
            EngineError::Closed => write!(f, "Engine process is not running"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<std::io::Error> for EngineError {
    fn from(error: std::io::Error) -> Self {
        EngineError::IoError(error)
    }
}

/// A running UCI engine process
pub struct UciEngine {
    /// The child process
    process: Child,
    /// Stdin for sending commands
    stdin: ChildStdin,
    /// Stdout reader for receiving responses
    stdout: BufReader<ChildStdout>,
    /// Engine name from `id name`
    name: Option<String>,
    /// Lower-cased option names advertised during the handshake
    options: HashSet<String>,
    /// Extra time allowed beyond a search budget
    grace: Duration,
    /// Set once `quit` has run
    closed: bool,
}

impl UciEngine {
    /// Starts an engine binary with no arguments
    ///
    /// # Example
    /// ```ignore
    /// let mut engine = UciEngine::new("/usr/local/bin/lc0").await?;
    /// ```
    pub async fn new(path: &str) -> Result<Self, EngineError> {
        Self::spawn(path, &[]).await
    }

    /// Starts an engine program with arguments and completes the UCI handshake
    pub async fn spawn(program: &str, args: &[&str]) -> Result<Self, EngineError> {
        let mut process = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| EngineError::SpawnError(format!("{}: {}", program, e)))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| EngineError::SpawnError("Failed to open stdin".into()))?;

        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| EngineError::SpawnError("Failed to open stdout".into()))?;

        let mut engine = UciEngine {
            process,
            stdin,
            stdout: BufReader::new(stdout),
            name: None,
            options: HashSet::new(),
            grace: DEFAULT_GRACE,
            closed: false,
        };

        engine.init_uci().await?;

        Ok(engine)
    }

    /// Overrides the extra time allowed on top of each search budget
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Engine name reported during the handshake
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether the engine advertised an option (case-insensitive)
    pub fn supports_option(&self, name: &str) -> bool {
        self.options.contains(&name.to_ascii_lowercase())
    }

    /// Sends a command to the engine
    async fn send(&mut self, cmd: &str) -> Result<(), EngineError> {
        if self.closed {
            return Err(EngineError::Closed);
        }
        debug!(cmd, "engine <");
        self.stdin.write_all(format!("{}\n", cmd).as_bytes()).await?;
        self.stdin.flush().await?;
        Ok(())
    }

    /// Reads a line from the engine
    async fn read_line(&mut self) -> Result<String, EngineError> {
        let mut line = String::new();
        let read = self.stdout.read_line(&mut line).await?;
        if read == 0 {
            return Err(EngineError::Closed);
        }
        let line = line.trim().to_string();
        debug!(line = line.as_str(), "engine >");
        Ok(line)
    }

    /// Reads lines until one starts with `expected`
    async fn read_lines_until(&mut self, expected: &str) -> Result<Vec<String>, EngineError> {
        let mut lines = Vec::new();
        loop {
            let line = self.read_line().await?;
            let done = line.starts_with(expected);
            lines.push(line);
            if done {
                return Ok(lines);
            }
        }
    }

    /// Same as `read_lines_until`, bounded by `limit`
    async fn read_until(
        &mut self,
        expected: &str,
        limit: Duration,
    ) -> Result<Vec<String>, EngineError> {
        match timeout(limit, self.read_lines_until(expected)).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::Timeout(limit)),
        }
    }

    /// Initialize UCI protocol
    async fn init_uci(&mut self) -> Result<(), EngineError> {
        self.send("uci").await?;
        let lines = self.read_until("uciok", HANDSHAKE_TIMEOUT).await?;

        for line in &lines {
            if let Some(name) = line.strip_prefix("id name ") {
                self.name = Some(name.trim().to_string());
            } else if let Some(option) = parse_option_name(line) {
                self.options.insert(option.to_ascii_lowercase());
            }
        }

        self.sync().await
    }

    /// Waits until the engine has processed every command sent so far
    async fn sync(&mut self) -> Result<(), EngineError> {
        self.send("isready").await?;
        self.read_until("readyok", HANDSHAKE_TIMEOUT).await?;
        Ok(())
    }

    /// Runs a timed search from a FEN and returns every line read up to `bestmove`
    async fn search(&mut self, fen: &str, budget: Duration) -> Result<Vec<String>, EngineError> {
        self.send(&format!("position fen {}", fen)).await?;
        self.send(&format!("go movetime {}", budget.as_millis().max(1)))
            .await?;

        let limit = budget + self.grace;
        match self.read_until("bestmove", limit).await {
            Err(EngineError::Timeout(d)) => {
                let _ = self.send("stop").await;
                Err(EngineError::Timeout(d))
            }
            other => other,
        }
    }
}

#[async_trait]
impl Engine for UciEngine {
    async fn best_move(&mut self, fen: &str, budget: Duration) -> Result<UciMove, EngineError> {
        let lines = self.search(fen, budget).await?;
        let last = lines
            .last()
            .ok_or_else(|| EngineError::ProtocolError("empty search output".into()))?;
        parse_bestmove(last)
    }

    async fn analyze_top_n(
        &mut self,
        fen: &str,
        lines: usize,
        budget: Duration,
    ) -> Result<Vec<CandidateMove>, EngineError> {
        if lines == 0 {
            return Ok(Vec::new());
        }

        self.send(&format!("setoption name MultiPV value {}", lines))
            .await?;
        let output = self.search(fen, budget).await;
        // Reset before looking at the result so later best-move queries stay single-line
        let reset = self.send("setoption name MultiPV value 1").await;
        let output = output?;
        reset?;

        Ok(collect_candidates(&output, lines))
    }

    async fn configure(&mut self, options: &[(&str, &str)]) -> Result<(), EngineError> {
        for (name, _) in options {
            if !self.supports_option(name) {
                return Err(EngineError::UnsupportedOption(name.to_string()));
            }
        }
        for (name, value) in options {
            self.send(&format!("setoption name {} value {}", name, value))
                .await?;
        }
        self.sync().await
    }

    async fn quit(&mut self) {
        if self.closed {
            return;
        }
        let _ = self.send("quit").await;
        self.closed = true;
        // Give it a moment to exit
        if timeout(Duration::from_millis(500), self.process.wait())
            .await
            .is_err()
        {
            warn!("engine did not exit after quit; killing it");
            let _ = self.process.start_kill();
        }
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.process.start_kill();
        }
    }
}

/// Extracts the option name from `option name <Name> type <kind> ...`
fn parse_option_name(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("option name ")?;
    let name = match rest.find(" type ") {
        Some(end) => &rest[..end],
        None => rest,
    };
    Some(name.trim())
}

/// Parses `bestmove e2e4 ponder e7e5`
fn parse_bestmove(line: &str) -> Result<UciMove, EngineError> {
    let mut parts = line.split_whitespace();
    if parts.next() != Some("bestmove") {
        return Err(EngineError::ProtocolError(format!(
            "expected bestmove, got '{}'",
            line
        )));
    }
    match parts.next() {
        None | Some("(none)") | Some("0000") => Err(EngineError::NoMove),
        Some(mv) => mv
            .parse::<UciMove>()
            .map_err(|_| EngineError::ProtocolError(format!("unparseable move '{}'", mv))),
    }
}

/// Keeps the deepest report for each multipv index, ranked best first
fn collect_candidates(output: &[String], lines: usize) -> Vec<CandidateMove> {
    let mut slots: Vec<Option<CandidateMove>> = vec![None; lines];

    for line in output {
        let Some(info) = parse_info_line(line) else {
            continue;
        };
        let idx = info.multipv.saturating_sub(1) as usize;
        if idx >= slots.len() {
            continue;
        }
        let Ok(mv) = info.pv[0].parse::<UciMove>() else {
            continue;
        };
        let evaluation = info
            .evaluation
            .or_else(|| slots[idx].as_ref().map(|c| c.evaluation))
            .unwrap_or(Evaluation::Centipawns(0));
        slots[idx] = Some(CandidateMove {
            mv,
            evaluation,
            pv: info.pv,
            depth: info.depth,
        });
    }

    slots.into_iter().flatten().collect()
}
