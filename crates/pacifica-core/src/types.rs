//! Wire types for the Pacifica REST API.

pub mod account;
pub mod market;
pub mod order;
pub mod request;
pub mod response;

pub use account::*;
pub use market::*;
pub use order::*;
pub use request::*;
pub use response::*;
