pub mod evidence;
pub mod http;

pub use evidence::EvidenceStore;
pub use http::HttpReporter;
