pub mod errors;
pub mod requester;

pub use errors::RequestError;
pub use requester::{HttpRequester, get, post};
