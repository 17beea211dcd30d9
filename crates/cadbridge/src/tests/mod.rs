//! Scenario tests that run the bridge with real poller threads.

mod bridge_behaviour;
pub(crate) mod support;
