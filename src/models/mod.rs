mod message;
mod request;
mod tools;

pub use message::*;
pub use request::ChatRequest;
pub use tools::*;
