pub mod overview;
pub mod word_text;
