pub mod merge;
pub mod text;
