pub mod builder;
pub mod cost;
pub mod error;
pub mod funding;
pub mod ledger;
pub mod load;
pub mod poller;
pub mod pool;
pub mod report;
pub mod wallet;

pub type Result<T> = std::result::Result<T, error::Error>;
pub use error::Error;
