pub mod transport;

pub use transport::{CompletionTransport, HttpTransport};
