//! Core evaluation and prompt-construction logic

pub mod evaluator;
pub mod prompt;
