mod loader;

pub use loader::{load_quiz, load_quiz_json, load_quiz_text, LoadError};
