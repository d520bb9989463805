pub mod fattura_pa;
pub mod xml;

pub use fattura_pa::FatturaPaGenerator;
