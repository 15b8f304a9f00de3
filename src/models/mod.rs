pub mod payment;
pub mod response;
pub mod service;
pub mod usdc;

pub use payment::*;
pub use response::*;
pub use service::*;
pub use usdc::*;
