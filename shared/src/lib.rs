pub mod kinds;
pub mod params;
pub mod records;

pub use kinds::*;
pub use params::*;
pub use records::*;
