pub mod money;

pub use money::{line_total, round2};
