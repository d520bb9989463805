pub mod render;
pub mod sdi;
