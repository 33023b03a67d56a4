//! # Bookflow Testing
//!
//! Testing utilities for Bookflow reducers.
//!
//! This crate provides:
//! - [`ReducerTest`]: Given-When-Then harness for reducers
//! - [`FixedClock`]: deterministic time
//! - [`MockBackend`] / [`MockResourceBackend`]: in-memory backends with
//!   failure injection and a call log
//! - proptest strategies for booking values
//! - [`init_test_tracing`]: log output for failing tests
//!
//! ## Example
//!
//! ```ignore
//! use bookflow_testing::{MockBackend, test_clock};
//! use bookflow_runtime::Store;
//!
//! #[tokio::test]
//! async fn test_flow_loads() {
//!     let backend = MockBackend::new().with_flow(flow(), steps());
//!     let env = WizardEnvironment::new(backend.shared(), Arc::new(test_clock()), ClientId::new(1));
//!     let store = Store::new(WizardState::default(), WizardReducer::new(), env);
//!
//!     store.send(WizardAction::LoadFlow { event_type: EventTypeId::new(1) }).await?;
//! }
//! ```

use bookflow_core::environment::Clock;
use chrono::{DateTime, Utc};

mod backend_mocks;

pub use backend_mocks::{
    BackendCall, Endpoint, MockBackend, MockResourceBackend, ResourceOp,
};
pub use reducer_test::{ReducerTest, assertions};

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use bookflow_testing::mocks::FixedClock;
    /// use bookflow_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Test helpers and utilities
pub mod helpers {
    use tracing_subscriber::{EnvFilter, fmt};

    /// Install a test-friendly tracing subscriber
    ///
    /// Honors `RUST_LOG` and defaults to `warn`. Safe to call from every test;
    /// only the first call installs the subscriber.
    pub fn init_test_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities
///
/// proptest strategies for booking values.
pub mod properties {
    use bookflow_client::Money;
    use proptest::prelude::*;

    /// Amounts up to 100 000.00
    pub fn money() -> impl Strategy<Value = Money> {
        (0_u64..=10_000_000).prop_map(Money::from_cents)
    }

    /// Optional price override
    pub fn custom_price() -> impl Strategy<Value = Option<Money>> {
        proptest::option::of(money())
    }

    /// Realistic item quantities
    pub fn quantity() -> impl Strategy<Value = u32> {
        1_u32..=20
    }
}

// Re-export commonly used items
pub use helpers::init_test_tracing;
pub use mocks::{FixedClock, test_clock};
