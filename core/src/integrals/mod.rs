pub mod electron_tensor;
mod index;
mod store;

pub use electron_tensor::ElectronTensor;
pub use index::{canonicalize, IntegralIndex, PairIndex};
pub use store::IntegralStore;
