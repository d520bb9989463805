pub mod sanitize;
pub mod wkhtmltopdf;

pub use wkhtmltopdf::WkHtmlToPdfConverter;
