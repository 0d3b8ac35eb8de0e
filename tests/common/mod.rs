//! Test utilities for engine_bridge integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use engine_bridge::process::{EngineIo, EngineLauncher};
use engine_bridge::{Error, ProtocolMode, Result};

pub const BOARD: &str = "  a b c d e f g h";
pub const PROMPT: &str = "Your move: ";
pub const NOISE: &str = "thinking...";

/// How a fake engine answers each line written to it.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Answer the n-th line with the n-th reply; the last reply repeats.
    Replies(Vec<String>),
    /// Print a board line and a move prompt.
    Prompt,
    /// Print non-matching lines forever.
    Noise,
    /// Output is closed from the start.
    ClosedOnStart,
}

impl Behavior {
    pub fn reply(line: &str) -> Self {
        Behavior::Replies(vec![line.to_string()])
    }

    pub fn replies(lines: &[&str]) -> Self {
        Behavior::Replies(lines.iter().map(|l| l.to_string()).collect())
    }
}

/// Counters and an event log shared by every engine one launcher spawns.
#[derive(Debug, Default)]
pub struct Stats {
    pub spawned: AtomicUsize,
    pub terminated: AtomicUsize,
    pub live: AtomicUsize,
    pub max_live: AtomicUsize,
    crashed: AtomicBool,
    log: Mutex<Vec<String>>,
}

impl Stats {
    pub fn spawned(&self) -> usize {
        self.spawned.load(Ordering::SeqCst)
    }

    pub fn terminated(&self) -> usize {
        self.terminated.load(Ordering::SeqCst)
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn max_live(&self) -> usize {
        self.max_live.load(Ordering::SeqCst)
    }

    /// Make the current engine die without printing anything.
    pub fn crash(&self) {
        self.crashed.store(true, Ordering::SeqCst);
    }

    /// Events in order: `spawn:<mode>`, `write:<line>`, `reply:<line>`, `terminate`.
    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    /// Only the lines written to engines.
    pub fn writes(&self) -> Vec<String> {
        self.log()
            .into_iter()
            .filter_map(|e| e.strip_prefix("write:").map(str::to_string))
            .collect()
    }

    fn record(&self, event: String) {
        self.log.lock().unwrap().push(event);
    }
}

/// An in-memory engine.
pub struct FakeEngine {
    behavior: Behavior,
    delay: Duration,
    crash_after: Option<(usize, Vec<String>)>,
    pending: VecDeque<String>,
    writes: usize,
    alive: bool,
    terminated: bool,
    stats: Arc<Stats>,
}

impl FakeEngine {
    fn is_running(&self) -> bool {
        self.alive && !self.stats.crashed.load(Ordering::SeqCst)
    }

    fn answer(&mut self) {
        if let Some((limit, last_words)) = &self.crash_after {
            if self.writes > *limit {
                self.pending.extend(last_words.iter().cloned());
                self.alive = false;
                return;
            }
        }

        match &self.behavior {
            Behavior::Replies(replies) => {
                let index = (self.writes - 1).min(replies.len() - 1);
                self.pending.push_back(replies[index].clone());
            }
            Behavior::Prompt => {
                self.pending.push_back(BOARD.to_string());
                self.pending.push_back(PROMPT.to_string());
            }
            Behavior::Noise | Behavior::ClosedOnStart => {}
        }
    }

    fn release(&mut self) {
        if !self.terminated {
            self.terminated = true;
            self.stats.live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl EngineIo for FakeEngine {
    async fn write_line(&mut self, line: &str) -> Result<()> {
        if !self.is_running() || self.terminated {
            return Err(Error::Write(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "fake engine is gone",
            )));
        }
        self.stats.record(format!("write:{line}"));
        self.writes += 1;
        self.answer();
        Ok(())
    }

    async fn read_line(&mut self) -> Result<Option<String>> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if let Some(line) = self.pending.pop_front() {
            self.stats.record(format!("reply:{line}"));
            return Ok(Some(line));
        }

        if matches!(self.behavior, Behavior::Noise) && self.is_running() {
            return Ok(Some(NOISE.to_string()));
        }

        Ok(None)
    }

    fn is_alive(&mut self) -> bool {
        self.is_running() && !self.terminated
    }

    async fn terminate(&mut self) {
        if !self.terminated {
            self.stats.record("terminate".to_string());
            self.stats.terminated.fetch_add(1, Ordering::SeqCst);
        }
        self.release();
    }

    fn pid(&self) -> Option<u32> {
        Some(4242)
    }

    fn exit_code(&mut self) -> Option<i32> {
        if self.is_alive() {
            None
        } else {
            Some(1)
        }
    }
}

impl Drop for FakeEngine {
    fn drop(&mut self) {
        self.release();
    }
}

/// Spawns [`FakeEngine`]s and counts them.
pub struct FakeLauncher {
    behavior: Behavior,
    delay: Duration,
    crash_after: Option<(usize, Vec<String>)>,
    fail: bool,
    stats: Arc<Stats>,
}

impl FakeLauncher {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            delay: Duration::ZERO,
            crash_after: None,
            fail: false,
            stats: Arc::new(Stats::default()),
        }
    }

    /// A launcher whose engine binary is missing.
    pub fn missing() -> Self {
        Self {
            fail: true,
            ..Self::new(Behavior::Prompt)
        }
    }

    /// Sleep before every read.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Answer `writes` lines normally, then print `last_words` and exit.
    pub fn crash_after(mut self, writes: usize, last_words: &[&str]) -> Self {
        let last_words = last_words.iter().map(|l| l.to_string()).collect();
        self.crash_after = Some((writes, last_words));
        self
    }

    pub fn stats(&self) -> Arc<Stats> {
        self.stats.clone()
    }
}

#[async_trait]
impl EngineLauncher for FakeLauncher {
    async fn launch(&self, mode: ProtocolMode) -> Result<Box<dyn EngineIo>> {
        if self.fail {
            return Err(Error::EngineNotFound {
                path: "/nonexistent/chess".to_string(),
            });
        }

        self.stats.crashed.store(false, Ordering::SeqCst);
        self.stats.spawned.fetch_add(1, Ordering::SeqCst);
        let live = self.stats.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max_live.fetch_max(live, Ordering::SeqCst);
        self.stats.record(format!("spawn:{mode}"));

        Ok(Box::new(FakeEngine {
            behavior: self.behavior.clone(),
            delay: self.delay,
            crash_after: self.crash_after.clone(),
            pending: VecDeque::new(),
            writes: 0,
            alive: !matches!(self.behavior, Behavior::ClosedOnStart),
            terminated: false,
            stats: self.stats.clone(),
        }))
    }
}
