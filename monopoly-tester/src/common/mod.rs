pub mod scenario;
pub mod util;

pub use util::{fingerprint, split_csv};
