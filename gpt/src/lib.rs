//! # YandexGPT completion manager
//!
//! [`GptManager`] ties the collaborators together: it obtains an IAM token,
//! cleans the prompt, counts its tokens, appends it to the session context,
//! asks the completion API and records the answer in the context.
//!
//! Every collaborator is a trait from `yc_core`, so the cache, context store,
//! tokenizer and prompt cleaner can be swapped through [`GptManagerBuilder`].

mod completion;
pub mod manager;
pub mod prompt;
pub mod tokenizer;

pub use manager::{GptManager, GptManagerBuilder};
pub use prompt::DefaultPromptCleaner;
pub use tokenizer::HttpTokenizer;
