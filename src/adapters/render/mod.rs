pub mod countries;
pub mod engine;
pub mod helpers;
pub mod i18n;

pub use engine::HtmlRenderer;
