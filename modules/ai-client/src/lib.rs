//! Single-turn text generation against OpenAI chat completions and the
//! Anthropic Messages API.

pub mod anthropic;
pub mod openai;
pub mod prompt;
pub mod util;

pub use anthropic::Claude;
pub use openai::OpenAi;
pub use prompt::{ChatModel, Prompt};
pub use util::{strip_code_blocks, truncate_chars, truncate_to_char_boundary};
