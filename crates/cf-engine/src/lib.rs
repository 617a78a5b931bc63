pub mod parser;

pub use parser::{AnalyzeOptions, FrontendRegistry, GoFrontend, LanguageFrontend};
