pub mod test_peer;

pub use test_peer::*;
