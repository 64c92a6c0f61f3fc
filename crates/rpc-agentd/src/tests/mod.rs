//! Behavioural suites for the agent.

mod datagram_behaviour;
mod lifecycle_behaviour;
mod support;
