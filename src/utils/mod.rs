pub mod feature_flags;
pub mod paths;
pub mod redact;
pub mod shell_words;
pub mod text;
