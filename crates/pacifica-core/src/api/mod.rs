//! Trading client and its HTTP transport.

pub mod batch;
pub mod client;
pub mod trading;
pub mod transport;

pub use batch::{BatchAction, BatchInstruction, BatchRequest, BatchResults};
pub use client::PacificaClient;
pub use trading::{LadderLeg, LadderReport, TpSlLadder};
pub use transport::{Auth, HttpRequest, HttpResponse, HttpTransport, Method, ReqwestTransport, Transport};
