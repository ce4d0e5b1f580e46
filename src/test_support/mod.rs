//! Helpers shared by unit tests that need a local HTTP server.

pub(crate) mod socket_guard;
