pub mod invoice;
pub mod rendering;
pub mod sale;
