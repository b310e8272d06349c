pub mod gate;
pub mod median;
pub mod price;
pub mod quorum;
pub mod round;

pub use gate::ChangeGate;
pub use median::lower_median;
pub use price::PriceSource;
pub use quorum::QuorumPolicy;
pub use round::coordinator::RoundCoordinator;
