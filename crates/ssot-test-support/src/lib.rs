//! Test doubles shared by the integration tests of the ssot crates.

mod fake_netbox;

pub use fake_netbox::{FakeNetbox, Recorded};
