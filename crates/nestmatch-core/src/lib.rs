pub mod config;
pub mod error;
pub mod inference;
pub mod runner;
pub mod sampler;
pub mod script;
pub mod session;

pub use config::*;
pub use error::*;
pub use inference::*;
pub use runner::*;
pub use sampler::*;
pub use script::*;
pub use session::*;
