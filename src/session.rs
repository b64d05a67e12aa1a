use tracing::debug;

use crate::{eligibility::AggregateResult, error::Result};

/// Where the check for the currently observed wallet stands.
#[derive(Debug, Clone)]
pub enum SessionState {
    NotConnected,
    /// Connected, but no address reported yet.
    Idle,
    Checking { address: String, generation: u64 },
    Loaded(AggregateResult),
    Error(String),
}

/// Handed out when a check starts; completing with an outdated ticket is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckTicket {
    pub address: String,
    pub generation: u64,
}

/// Tracks one wallet's eligibility check across address changes.
///
/// Every new address starts a new generation. Results are only accepted for
/// the latest generation, so a slow check for an old address can never
/// overwrite the result for the current one.
#[derive(Debug)]
pub struct CheckSession {
    state: SessionState,
    address: Option<String>,
    generation: u64,
}

impl Default for CheckSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::NotConnected,
            address: None,
            generation: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn in_progress(&self) -> bool {
        matches!(self.state, SessionState::Checking { .. })
    }

    pub fn result(&self) -> Option<&AggregateResult> {
        match &self.state {
            SessionState::Loaded(result) => Some(result),
            _ => None,
        }
    }

    /// Feed the latest wallet state. Returns a ticket when a new check must start.
    pub fn observe(&mut self, connected: bool, address: Option<&str>) -> Option<CheckTicket> {
        let address = address.map(str::trim).filter(|a| !a.is_empty());

        let address = match (connected, address) {
            (false, _) => {
                self.reset(SessionState::NotConnected);
                return None;
            }
            (true, None) => {
                self.reset(SessionState::Idle);
                return None;
            }
            (true, Some(address)) => address,
        };

        let unchanged = self.address.as_deref() == Some(address)
            && matches!(self.state, SessionState::Checking { .. } | SessionState::Loaded(_));
        if unchanged {
            return None;
        }

        self.generation += 1;
        self.address = Some(address.to_string());
        self.state = SessionState::Checking {
            address: address.to_string(),
            generation: self.generation,
        };

        debug!("Starting check #{} for {}", self.generation, address);

        Some(CheckTicket {
            address: address.to_string(),
            generation: self.generation,
        })
    }

    /// Apply a finished check. Returns false if the ticket was superseded.
    pub fn complete(&mut self, ticket: &CheckTicket, outcome: Result<AggregateResult>) -> bool {
        let current = ticket.generation == self.generation
            && matches!(self.state, SessionState::Checking { .. });

        if !current {
            debug!(
                "Dropping stale result #{} for {} (current #{})",
                ticket.generation, ticket.address, self.generation
            );
            return false;
        }

        self.state = match outcome {
            Ok(result) => SessionState::Loaded(result),
            Err(e) => SessionState::Error(e.to_string()),
        };
        true
    }

    fn reset(&mut self, state: SessionState) {
        if self.in_progress() {
            self.generation += 1;
        }
        self.address = None;
        self.state = state;
    }
}
