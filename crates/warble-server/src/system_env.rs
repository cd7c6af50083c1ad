//! Production environment using system time and OS randomness.

use warble_core::Environment;

/// Environment backed by the system clock and the OS cryptographic RNG.
///
/// # Panics
///
/// Panics if the OS RNG fails. This is intentional: session ids and room
/// cookies come from this randomness, and a server without a functioning RNG
/// cannot issue them safely. RNG failure indicates OS-level breakage.
#[derive(Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    #[allow(clippy::disallowed_methods)]
    #[allow(clippy::expect_used)]
    fn wall_clock_secs(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("invariant: system clock is after the Unix epoch")
            .as_secs()
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buf: &mut [u8]) {
        getrandom::fill(buf)
            .expect("invariant: OS RNG failure is unrecoverable for cookie generation");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wall_clock_is_past_2020() {
        let env = SystemEnv::new();
        assert!(env.wall_clock_secs() > 1_577_836_800);
    }

    #[test]
    fn random_bytes_differ_between_calls() {
        let env = SystemEnv::new();
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        env.random_bytes(&mut a);
        env.random_bytes(&mut b);
        assert_ne!(a, b);
    }

    #[test]
    fn uuids_are_well_formed() {
        let env = SystemEnv::new();
        let id = env.new_uuid();
        assert_eq!(id.len(), 36);
        assert_eq!(id.matches('-').count(), 4);
    }
}
