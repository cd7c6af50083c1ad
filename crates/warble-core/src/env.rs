//! Environment abstraction for time and randomness.
//!
//! All wall-clock reads and random id generation go through this trait so
//! tests can pin both. Production uses the server crate's system
//! implementation; tests use [`test_utils::MockEnv`].

/// Time and randomness source.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Seconds since the Unix epoch.
    fn wall_clock_secs(&self) -> u64;

    /// Fill the buffer with random bytes.
    fn random_bytes(&self, buf: &mut [u8]);

    /// Fresh UUIDv4 string built from this environment's randomness.
    ///
    /// Session ids and room cookies come from here, which is what makes them
    /// reproducible under a mock environment.
    fn new_uuid(&self) -> String {
        let mut raw = [0u8; 16];
        self.random_bytes(&mut raw);
        uuid::Builder::from_random_bytes(raw).into_uuid().to_string()
    }
}

/// Deterministic environments for tests.
pub mod test_utils {
    use std::sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    };

    use super::Environment;

    /// Environment with a settable clock and a counting RNG.
    ///
    /// `random_bytes` fills buffers from an incrementing counter, so the
    /// first UUID a test mints is always the same, the second always the
    /// same, and so on.
    #[derive(Clone)]
    pub struct MockEnv {
        clock_secs: Arc<AtomicU64>,
        counter: Arc<AtomicU64>,
    }

    impl MockEnv {
        /// Environment whose clock reads `secs`.
        #[must_use]
        pub fn at(secs: u64) -> Self {
            Self { clock_secs: Arc::new(AtomicU64::new(secs)), counter: Arc::new(AtomicU64::new(1)) }
        }

        /// Move the clock.
        pub fn set_wall_clock(&self, secs: u64) {
            self.clock_secs.store(secs, Ordering::SeqCst);
        }
    }

    impl Default for MockEnv {
        fn default() -> Self {
            Self::at(1_000_000)
        }
    }

    impl Environment for MockEnv {
        fn wall_clock_secs(&self) -> u64 {
            self.clock_secs.load(Ordering::SeqCst)
        }

        fn random_bytes(&self, buf: &mut [u8]) {
            let n = self.counter.fetch_add(1, Ordering::SeqCst);
            for (i, b) in buf.iter_mut().enumerate() {
                *b = (n as u8).wrapping_add(i as u8);
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn mock_uuids_are_deterministic() {
            let a = MockEnv::at(0);
            let b = MockEnv::at(0);
            assert_eq!(a.new_uuid(), b.new_uuid());
        }

        #[test]
        fn successive_uuids_differ() {
            let env = MockEnv::at(0);
            assert_ne!(env.new_uuid(), env.new_uuid());
        }

        #[test]
        fn clock_is_settable() {
            let env = MockEnv::at(100);
            assert_eq!(env.wall_clock_secs(), 100);
            env.set_wall_clock(250);
            assert_eq!(env.wall_clock_secs(), 250);
        }
    }
}
