//! Outsourced aggregation workflow.
//!
//! Collects locally encrypted values into a batch, submits the batch to the
//! server for homomorphic aggregation, and correlates the asynchronous result
//! back to it:
//!
//! ```text
//! Collecting → Submitted → AwaitingResult → Completed
//!                               │
//!                               ▼
//!                             Failed
//! ```
//!
//! The wire protocol carries no request identifiers, so correlation works
//! only because at most one aggregation request is ever in flight. That
//! single-flight rule is enforced here explicitly: overlapping submissions
//! are rejected with `InvalidState`, and a result arriving with no batch
//! awaiting it is an error the caller drops.

use tracing::debug;

use crate::{error::ClientError, key_manager::KeyEpoch};

/// Lifecycle of the current batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchState {
    /// Packets are being collected locally; no network interaction.
    #[default]
    Collecting,
    /// The batch was sealed for submission; immutable from here.
    Submitted,
    /// The aggregation request is with the server.
    AwaitingResult,
    /// A result arrived and is stored.
    Completed,
    /// The in-flight request was abandoned (transport loss).
    Failed,
}

impl BatchState {
    /// Human-readable state name for logs and errors.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Collecting => "collecting",
            Self::Submitted => "submitted",
            Self::AwaitingResult => "awaiting a result",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// A locally encrypted value waiting to be outsourced.
///
/// The plaintext is retained only for local display; it never crosses the
/// wire. The epoch tag records which key the ciphertext belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedDataPacket {
    /// Session-local packet id.
    pub id: u64,
    /// The plaintext value, for display beside its ciphertext.
    pub original_value: i64,
    /// Paillier ciphertext, decimal string.
    pub ciphertext: String,
    /// Key epoch the ciphertext was encrypted under.
    pub epoch: KeyEpoch,
}

/// The aggregation outcome returned by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationResult {
    /// The aggregated ciphertext, decimal string.
    pub ciphertext: String,
    /// The decrypted aggregate, when the server revealed it.
    pub plaintext: Option<i64>,
}

/// The outsourcing workflow state machine.
#[derive(Debug, Default)]
pub struct Outsourcing {
    state: BatchState,
    packets: Vec<EncryptedDataPacket>,
    result: Option<AggregationResult>,
    next_packet_id: u64,
}

impl Outsourcing {
    /// An empty workflow in `Collecting`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current batch state.
    pub fn state(&self) -> BatchState {
        self.state
    }

    /// The queued packets.
    pub fn packets(&self) -> &[EncryptedDataPacket] {
        &self.packets
    }

    /// The stored result, if a batch completed.
    pub fn result(&self) -> Option<&AggregationResult> {
        self.result.as_ref()
    }

    /// True while an aggregation request is outstanding.
    pub fn in_flight(&self) -> bool {
        matches!(self.state, BatchState::Submitted | BatchState::AwaitingResult)
    }

    /// Append an encrypted value to the batch.
    ///
    /// Queueing from `Completed` or `Failed` reopens the batch for
    /// collection (any stored result stays visible until the next submission
    /// or an explicit clear).
    ///
    /// # Errors
    ///
    /// - [`ClientError::InvalidState`] while a request is in flight; the
    ///   submitted batch is immutable
    pub fn queue(
        &mut self,
        original_value: i64,
        ciphertext: String,
        epoch: KeyEpoch,
    ) -> Result<EncryptedDataPacket, ClientError> {
        if self.in_flight() {
            return Err(ClientError::invalid_state("queue a value", self.state.name()));
        }
        self.state = BatchState::Collecting;

        let packet =
            EncryptedDataPacket { id: self.next_packet_id, original_value, ciphertext, epoch };
        self.next_packet_id += 1;
        self.packets.push(packet.clone());

        Ok(packet)
    }

    /// Seal the batch for submission and return its ciphertexts.
    ///
    /// Checks the epoch invariant explicitly instead of trusting that the
    /// rotation handler already ran: every packet must carry the epoch
    /// active right now. Stale packets are discarded and the submission is
    /// refused, so a rotation/submission race is surfaced to the caller
    /// instead of shipping undecryptable ciphertexts.
    ///
    /// Call [`Outsourcing::sent`] after handing the request to the
    /// transport.
    ///
    /// # Errors
    ///
    /// - [`ClientError::InvalidState`] if a request is already in flight or
    ///   the batch is empty
    /// - [`ClientError::StaleCiphertexts`] if any packet predates the active
    ///   epoch
    pub fn submit(&mut self, active_epoch: KeyEpoch) -> Result<Vec<String>, ClientError> {
        if self.in_flight() {
            return Err(ClientError::invalid_state("submit a batch", self.state.name()));
        }
        if self.packets.is_empty() {
            return Err(ClientError::invalid_state("submit an empty batch", self.state.name()));
        }

        let before = self.packets.len();
        self.packets.retain(|packet| packet.epoch == active_epoch);
        let dropped = before - self.packets.len();
        if dropped > 0 {
            return Err(ClientError::StaleCiphertexts { dropped });
        }

        let ciphertexts: Vec<String> =
            self.packets.iter().map(|packet| packet.ciphertext.clone()).collect();
        self.result = None;
        self.state = BatchState::Submitted;
        debug!(count = ciphertexts.len(), "batch sealed for aggregation");

        Ok(ciphertexts)
    }

    /// Note that the aggregation request was handed to the transport; the
    /// workflow now blocks until the matching result arrives.
    pub fn sent(&mut self) {
        if self.state == BatchState::Submitted {
            self.state = BatchState::AwaitingResult;
        }
    }

    /// Store the aggregation result for the in-flight batch.
    ///
    /// # Errors
    ///
    /// - [`ClientError::InvalidState`] if no batch is awaiting a result (the
    ///   caller logs and drops the message)
    pub fn on_result(
        &mut self,
        ciphertext: String,
        plaintext: Option<i64>,
    ) -> Result<AggregationResult, ClientError> {
        if self.state != BatchState::AwaitingResult {
            return Err(ClientError::invalid_state("accept a result", self.state.name()));
        }

        let result = AggregationResult { ciphertext, plaintext };
        self.result = Some(result.clone());
        self.state = BatchState::Completed;

        Ok(result)
    }

    /// Explicit user clear: drop all packets and any stored result.
    ///
    /// # Errors
    ///
    /// - [`ClientError::InvalidState`] while a request is in flight; the
    ///   submitted batch is immutable until its result arrives
    pub fn clear(&mut self) -> Result<usize, ClientError> {
        if self.in_flight() {
            return Err(ClientError::invalid_state("clear the batch", self.state.name()));
        }

        let cleared = self.packets.len();
        self.packets.clear();
        self.result = None;
        self.state = BatchState::Collecting;

        Ok(cleared)
    }

    /// Key rotation: ciphertexts under the superseded epoch are unusable, so
    /// everything goes — queued packets, any stored result, and any in-flight
    /// request state. Returns how many packets were dropped.
    pub fn invalidate(&mut self) -> usize {
        let cleared = self.packets.len();
        self.packets.clear();
        self.result = None;
        self.state = BatchState::Collecting;
        cleared
    }

    /// Transport went away. An in-flight request will never complete; mark
    /// the batch `Failed` and report whether that happened.
    pub fn on_disconnect(&mut self) -> bool {
        if self.in_flight() {
            self.state = BatchState::Failed;
            true
        } else {
            false
        }
    }
}
