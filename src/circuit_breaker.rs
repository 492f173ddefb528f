//! # Circuit Breaker Module
//!
//! Circuit breaker for calls to the text generation service. After repeated
//! failures it stops forwarding prompts for a while so free-text replies
//! fail fast instead of waiting on a service that is down.

use std::sync::Mutex;
use std::time::Instant;

use crate::config::BreakerConfig;

#[derive(Debug, Default)]
struct BreakerState {
    failure_count: u32,
    last_failure_time: Option<Instant>,
}

/// Circuit breaker for generation calls
///
/// # State Machine
///
/// - **Closed**: Normal operation, requests pass through
/// - **Open**: Failure threshold exceeded, requests fail fast
/// - **Half-Open**: Reset window elapsed, the next request is let through
#[derive(Debug)]
pub struct CircuitBreaker {
    state: Mutex<BreakerState>,
    config: BreakerConfig,
}

impl CircuitBreaker {
    /// Create a new circuit breaker with the given configuration
    ///
    /// # Examples
    ///
    /// ```rust
    /// use vidbot::config::BreakerConfig;
    /// use vidbot::circuit_breaker::CircuitBreaker;
    ///
    /// let circuit_breaker = CircuitBreaker::new(BreakerConfig::default());
    /// assert!(!circuit_breaker.is_open());
    /// ```
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            state: Mutex::new(BreakerState::default()),
            config,
        }
    }

    /// Check if circuit breaker is open (blocking requests)
    ///
    /// Automatically resets to closed state after the reset window.
    pub fn is_open(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        if state.failure_count >= self.config.failure_threshold {
            if let Some(last_time) = state.last_failure_time {
                if last_time.elapsed() < self.config.reset_after {
                    return true;
                }
                *state = BreakerState::default();
            }
        }
        false
    }

    /// Record a failed generation call
    pub fn record_failure(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.failure_count += 1;
        state.last_failure_time = Some(Instant::now());
    }

    /// Record a successful generation call
    pub fn record_success(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        *state = BreakerState::default();
    }
}
