pub mod error;
pub mod message;
pub mod utils;

pub use error::OracleError;
pub use utils::PeerAddress;
