pub mod http;
pub mod stub;

pub use http::{HttpBackend, DEFAULT_ENDPOINT};
pub use stub::StubBackend;
