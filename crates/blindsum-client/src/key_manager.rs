//! Homomorphic key lifecycle management.
//!
//! Tracks the server's current Paillier public key and its validity window.
//! The server is authoritative for everything: the client derives its
//! countdown from the `remaining_seconds` the server supplied, never from an
//! interval of its own, and when the countdown hits zero it re-requests the
//! key rather than assuming rotation happened. That re-request also converges
//! the client after clock skew or a missed rotation notice.

use blindsum_crypto::{PaillierError, PaillierPublicKey};
use blindsum_proto::{KeyEpochInfo, PublicKeyData};
use tracing::debug;

/// Monotone counter identifying one key epoch locally.
///
/// Bumped every time the active key's `(n, g)` changes. Packets carry the
/// epoch they were encrypted under, making the same-epoch submission
/// invariant checkable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct KeyEpoch(u64);

impl KeyEpoch {
    /// The epoch counter as a plain number, for logs and display.
    pub const fn value(self) -> u64 {
        self.0
    }

    #[cfg(test)]
    pub(crate) const fn new(value: u64) -> Self {
        Self(value)
    }

    const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// The active key plus the bookkeeping needed to derive the countdown.
#[derive(Debug, Clone)]
pub struct ActiveKey {
    key: PaillierPublicKey,
    info: KeyEpochInfo,
    epoch: KeyEpoch,
    received_at_ms: u64,
}

impl ActiveKey {
    /// The parsed public key.
    pub fn key(&self) -> &PaillierPublicKey {
        &self.key
    }

    /// The validity window as the server described it.
    pub fn info(&self) -> &KeyEpochInfo {
        &self.info
    }

    /// The local epoch this key belongs to.
    pub fn epoch(&self) -> KeyEpoch {
        self.epoch
    }

    /// Seconds left in the window: the server's authoritative
    /// `remaining_seconds` minus time elapsed since receipt, clamped at
    /// zero. Monotone non-increasing until a new key resets it.
    pub fn remaining_seconds(&self, now_ms: u64) -> u64 {
        let elapsed_secs = now_ms.saturating_sub(self.received_at_ms) / 1000;
        self.info.remaining_seconds.saturating_sub(elapsed_secs)
    }
}

/// Result of installing a key update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInstall {
    /// The epoch the installed key belongs to.
    pub epoch: KeyEpoch,
    /// True if the key superseded a different one; everything encrypted
    /// under earlier epochs is now invalid.
    pub rotated: bool,
}

/// The key manager state machine.
#[derive(Debug, Default)]
pub struct KeyManager {
    active: Option<ActiveKey>,
    /// Last key seen on the wire. Survives degraded periods so a reconnect
    /// that returns the identical key is not mistaken for a rotation.
    last_seen: Option<PublicKeyData>,
    epoch: KeyEpoch,
    fetch_pending: bool,
}

impl KeyManager {
    /// A manager with no key: encryption is disabled until one is installed.
    pub fn new() -> Self {
        Self::default()
    }

    /// The active key, if any.
    pub fn active(&self) -> Option<&ActiveKey> {
        self.active.as_ref()
    }

    /// The current local epoch counter.
    pub fn current_epoch(&self) -> KeyEpoch {
        self.epoch
    }

    /// True while a `GET_FHE_KEY` request is outstanding. At most one fetch
    /// is in flight; overlapping requests are the caller's to reject.
    pub fn fetch_pending(&self) -> bool {
        self.fetch_pending
    }

    /// Note that a key fetch was handed to the transport.
    pub fn note_fetch_sent(&mut self) {
        self.fetch_pending = true;
    }

    /// Install a key update from `FHE_KEY` or `KEY_ROTATED`.
    ///
    /// Detects rotation by comparing the wire key against the last one seen:
    /// a different `(n, g)` bumps the epoch, and the caller must invalidate
    /// everything encrypted under earlier epochs. The same key again only
    /// refreshes the validity window.
    ///
    /// # Errors
    ///
    /// - [`PaillierError::InvalidKey`] if the components do not parse; the
    ///   pending fetch is still cleared so a later retry is possible
    pub fn install(
        &mut self,
        pub_key: &PublicKeyData,
        info: KeyEpochInfo,
        now_ms: u64,
    ) -> Result<KeyInstall, PaillierError> {
        self.fetch_pending = false;

        let key = PaillierPublicKey::from_decimal(&pub_key.n, &pub_key.g)?;

        let rotated = self.last_seen.as_ref().is_some_and(|prev| prev != pub_key);
        if rotated {
            self.epoch = self.epoch.next();
            debug!(epoch = self.epoch.value(), "homomorphic key rotated");
        }

        self.last_seen = Some(pub_key.clone());
        self.active = Some(ActiveKey { key, info, epoch: self.epoch, received_at_ms: now_ms });

        Ok(KeyInstall { epoch: self.epoch, rotated })
    }

    /// True when the countdown has reached zero and a refetch should be
    /// issued (none already pending, a key to refresh exists).
    pub fn needs_refresh(&self, now_ms: u64) -> bool {
        if self.fetch_pending {
            return false;
        }
        self.active.as_ref().is_some_and(|active| active.remaining_seconds(now_ms) == 0)
    }

    /// Seconds left in the active key's window, if any key is active.
    pub fn remaining_seconds(&self, now_ms: u64) -> Option<u64> {
        self.active.as_ref().map(|active| active.remaining_seconds(now_ms))
    }

    /// Transport went away: drop into the degraded state. Encryption stays
    /// disabled until a fresh key arrives; the countdown is never
    /// extrapolated across a disconnect.
    ///
    /// Returns true if key state was actually lost (a key was active or a
    /// fetch was in flight).
    pub fn on_disconnect(&mut self) -> bool {
        let degraded = self.active.is_some() || self.fetch_pending;
        self.active = None;
        self.fetch_pending = false;
        degraded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_data(n: &str, g: &str) -> PublicKeyData {
        PublicKeyData { n: n.to_string(), g: g.to_string() }
    }

    fn epoch_info(remaining: u64) -> KeyEpochInfo {
        KeyEpochInfo {
            generated_at: String::new(),
            next_rotation_at: String::new(),
            rotation_interval: 300,
            remaining_seconds: remaining,
        }
    }

    // 1000003 * 1000033 and a second modulus, 1000003 * 1000037.
    const N1: &str = "1000036000099";
    const G1: &str = "1000036000100";
    const N2: &str = "1000040000111";
    const G2: &str = "1000040000112";

    #[test]
    fn first_install_is_not_a_rotation() {
        let mut manager = KeyManager::new();

        let install = manager.install(&key_data(N1, G1), epoch_info(300), 0).unwrap();

        assert!(!install.rotated);
        assert_eq!(install.epoch, KeyEpoch::default());
        assert!(manager.active().is_some());
    }

    #[test]
    fn same_key_again_refreshes_without_rotation() {
        let mut manager = KeyManager::new();
        manager.install(&key_data(N1, G1), epoch_info(300), 0).unwrap();

        let install = manager.install(&key_data(N1, G1), epoch_info(120), 200_000).unwrap();

        assert!(!install.rotated);
        assert_eq!(manager.remaining_seconds(200_000), Some(120));
    }

    #[test]
    fn different_key_bumps_epoch() {
        let mut manager = KeyManager::new();
        let first = manager.install(&key_data(N1, G1), epoch_info(300), 0).unwrap();

        let second = manager.install(&key_data(N2, G2), epoch_info(300), 1_000).unwrap();

        assert!(second.rotated);
        assert!(second.epoch > first.epoch);
        assert_eq!(manager.current_epoch(), second.epoch);
    }

    #[test]
    fn countdown_derives_from_server_remaining() {
        let mut manager = KeyManager::new();
        manager.install(&key_data(N1, G1), epoch_info(300), 10_000).unwrap();

        assert_eq!(manager.remaining_seconds(10_000), Some(300));
        assert_eq!(manager.remaining_seconds(10_999), Some(300));
        assert_eq!(manager.remaining_seconds(11_000), Some(299));
        assert_eq!(manager.remaining_seconds(310_000), Some(0));
        // Clamped, never negative, even long past expiry.
        assert_eq!(manager.remaining_seconds(999_000), Some(0));
        // A tick that appears to predate receipt does not inflate the window.
        assert_eq!(manager.remaining_seconds(9_000), Some(300));
    }

    #[test]
    fn refresh_wanted_only_at_zero_and_not_while_pending() {
        let mut manager = KeyManager::new();
        assert!(!manager.needs_refresh(0));

        manager.install(&key_data(N1, G1), epoch_info(2), 0).unwrap();
        assert!(!manager.needs_refresh(1_000));
        assert!(manager.needs_refresh(2_000));

        manager.note_fetch_sent();
        assert!(!manager.needs_refresh(3_000));

        // The server's answer clears the pending flag.
        manager.install(&key_data(N1, G1), epoch_info(300), 4_000).unwrap();
        assert!(!manager.fetch_pending());
    }

    #[test]
    fn unparseable_key_clears_pending_fetch() {
        let mut manager = KeyManager::new();
        manager.note_fetch_sent();

        let err = manager.install(&key_data("junk", "2"), epoch_info(300), 0);

        assert!(err.is_err());
        assert!(!manager.fetch_pending());
        assert!(manager.active().is_none());
    }

    #[test]
    fn disconnect_degrades_but_remembers_last_key() {
        let mut manager = KeyManager::new();
        manager.install(&key_data(N1, G1), epoch_info(300), 0).unwrap();

        assert!(manager.on_disconnect());
        assert!(manager.active().is_none());
        assert_eq!(manager.remaining_seconds(1_000), None);

        // Reconnect returning the identical key: same epoch, no rotation.
        let install = manager.install(&key_data(N1, G1), epoch_info(300), 60_000).unwrap();
        assert!(!install.rotated);

        // A second disconnect with nothing held is not a degradation.
        assert!(manager.on_disconnect());
        assert!(!manager.on_disconnect());
    }

    #[test]
    fn rotation_detected_across_degraded_period() {
        let mut manager = KeyManager::new();
        manager.install(&key_data(N1, G1), epoch_info(300), 0).unwrap();
        manager.on_disconnect();

        // The server rotated while we were offline.
        let install = manager.install(&key_data(N2, G2), epoch_info(300), 120_000).unwrap();

        assert!(install.rotated);
    }
}
