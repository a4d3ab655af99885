pub mod options;
pub mod synthesis;

pub use options::*;
pub use synthesis::*;
