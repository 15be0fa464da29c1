pub mod replay;
pub mod stub;

pub use replay::ReplaySource;
pub use stub::{Scenario, StubConfig, StubSource};
