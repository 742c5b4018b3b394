//! Language-model side of the gateway.

pub mod model;
pub mod translator;

pub use model::{ChatCompletionModel, CompletionModel, ModelSettings};
pub use translator::NlToSqlTranslator;
