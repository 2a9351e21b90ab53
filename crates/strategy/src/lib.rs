pub mod ma_crossover;
pub mod rolling;

pub use ma_crossover::{classify, CrossoverDetector, Detection};
pub use rolling::{MaPair, RollingSeries};
