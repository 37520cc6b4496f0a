use std::collections::VecDeque;
use std::future::Future;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use rand::Rng;

use crate::error::{classify, AgentError, ErrorCategory};

/// Tunables for [`RetryManager::execute`].
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
    pub jitter_enabled: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            multiplier: 2.0,
            jitter_enabled: true,
        }
    }
}

impl RetryConfig {
    /// Delay before the attempt after `attempt` (0-indexed), before jitter or
    /// the rate-limit floor are applied.
    fn base_delay(&self, attempt: u32) -> Duration {
        let ms = self.base_delay_ms as f64 * self.multiplier.powi(attempt as i32);
        Duration::from_millis(ms.min(self.max_delay_ms as f64) as u64)
    }

    /// Delay for `attempt`, with the rate-limit floor and jitter applied.
    fn delay_for(&self, attempt: u32, category: ErrorCategory) -> Duration {
        let mut delay = self.base_delay(attempt);
        if category == ErrorCategory::RateLimit {
            delay = delay.max(Duration::from_millis(5000));
        }
        if self.jitter_enabled {
            let jitter_ceiling_ms = delay.as_millis() as f64 * 0.1;
            let jitter_ms = if jitter_ceiling_ms > 0.0 {
                rand::thread_rng().gen_range(0.0..=jitter_ceiling_ms)
            } else {
                0.0
            };
            delay += Duration::from_millis(jitter_ms as u64);
        }
        delay
    }

    /// Retries allowed for `category`: rate-limit gets an extended budget
    /// (double the normal allowance, capped at 6).
    fn retries_allowed(&self, category: ErrorCategory) -> u32 {
        if category == ErrorCategory::RateLimit {
            (self.max_retries * 2).min(6)
        } else {
            self.max_retries
        }
    }
}

const CIRCUIT_OPEN_THRESHOLD: u32 = 5;
const CIRCUIT_MAX_COOLDOWN: Duration = Duration::from_secs(300);

/// Per-operation circuit breaker state, keyed by op id in [`RetryManager`].
#[derive(Debug, Clone, Default)]
pub struct CircuitState {
    pub is_open: bool,
    pub last_failure_at: Option<Instant>,
    pub failure_count: u32,
}

impl CircuitState {
    fn cooldown(&self) -> Duration {
        let extra_failures = self.failure_count.saturating_sub(CIRCUIT_OPEN_THRESHOLD);
        let secs = 60u64.saturating_mul(1u64 << extra_failures.min(10));
        Duration::from_secs(secs).min(CIRCUIT_MAX_COOLDOWN)
    }

    /// A call is allowed when the circuit is closed, or open but past its
    /// cooldown (the single half-open probe).
    fn allows_call(&self) -> bool {
        if !self.is_open {
            return true;
        }
        match self.last_failure_at {
            Some(at) => at.elapsed() >= self.cooldown(),
            None => true,
        }
    }

    fn record_success(&mut self) {
        self.is_open = false;
        self.failure_count = 0;
        self.last_failure_at = None;
    }

    fn record_failure(&mut self) {
        self.failure_count += 1;
        self.last_failure_at = Some(Instant::now());
        if self.failure_count >= CIRCUIT_OPEN_THRESHOLD {
            self.is_open = true;
        }
    }
}

const MAX_HISTORY_PER_OP: usize = 100;

/// One entry in an op's bounded attempt history.
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    pub attempt: u32,
    pub succeeded: bool,
    pub category: Option<ErrorCategory>,
}

/// Retries a whole external operation (an LLM call, a tool call) with
/// jittered exponential backoff, and breaks the circuit for an op id that
/// keeps failing so callers stop invoking it at all until it cools down.
///
/// Holds no reference to the operation itself; `op_id` is caller-chosen
/// (e.g. `"llm.chat"`, `"tool.web_search"`) and scopes the circuit and
/// history independently per id.
pub struct RetryManager {
    config: RetryConfig,
    circuits: DashMap<String, CircuitState>,
    history: DashMap<String, VecDeque<AttemptRecord>>,
}

impl RetryManager {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            circuits: DashMap::new(),
            history: DashMap::new(),
        }
    }

    /// Current circuit state for `op_id`; closed with zero failures if never seen.
    pub fn circuit_state(&self, op_id: &str) -> CircuitState {
        self.circuits.get(op_id).map(|c| c.clone()).unwrap_or_default()
    }

    /// Attempt history for `op_id`, oldest first, bounded to the last 100 attempts.
    pub fn history(&self, op_id: &str) -> Vec<AttemptRecord> {
        self.history
            .get(op_id)
            .map(|h| h.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn push_history(&self, op_id: &str, record: AttemptRecord) {
        let mut entry = self.history.entry(op_id.to_string()).or_default();
        entry.push_back(record);
        if entry.len() > MAX_HISTORY_PER_OP {
            entry.pop_front();
        }
    }

    /// Runs `op`, retrying retryable failures with backoff per `self.config`.
    ///
    /// Before every attempt (including the first), checks the circuit for
    /// `op_id`: if it is open and still within its cooldown, returns
    /// [`AgentError::CircuitOpen`] without invoking `op` at all. A successful
    /// attempt closes the circuit and resets its failure count; a failure
    /// increments it, opening the circuit once it reaches five.
    pub async fn execute<F, Fut, T>(&self, op_id: &str, mut op: F) -> Result<T, AgentError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, String>>,
    {
        let mut attempt = 0u32;
        loop {
            let blocked = {
                let circuit = self.circuits.entry(op_id.to_string()).or_default();
                circuit.is_open && !circuit.allows_call()
            };
            if blocked {
                return Err(AgentError::CircuitOpen(op_id.to_string()));
            }

            match op().await {
                Ok(value) => {
                    self.circuits.entry(op_id.to_string()).or_default().record_success();
                    self.push_history(
                        op_id,
                        AttemptRecord {
                            attempt,
                            succeeded: true,
                            category: None,
                        },
                    );
                    return Ok(value);
                }
                Err(raw) => {
                    let classified = classify(&raw);
                    self.push_history(
                        op_id,
                        AttemptRecord {
                            attempt,
                            succeeded: false,
                            category: Some(classified.category),
                        },
                    );
                    self.circuits.entry(op_id.to_string()).or_default().record_failure();

                    let retries_allowed = self.config.retries_allowed(classified.category);
                    if !classified.retryable || attempt >= retries_allowed {
                        return Err(AgentError::Classified(classified));
                    }
                    let delay = self.config.delay_for(attempt, classified.category);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryManager {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}
