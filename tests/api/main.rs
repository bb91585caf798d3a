//! API integration tests.
//!
//! Each test runs the full application against a fresh in-memory SQLite
//! database and its own mock identity provider.

mod helpers;

mod test_auth;
mod test_groups;
mod test_middleware;
