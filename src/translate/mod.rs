pub mod input;
pub mod interface;
pub mod languages;
pub mod prompt;
pub mod service;

pub use interface::*;
pub use service::TranslationService;
