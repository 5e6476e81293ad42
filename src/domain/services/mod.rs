mod captions;
mod chat;
mod prompts;
mod sessions;

pub use captions::*;
pub use chat::*;
pub use prompts::*;
pub use sessions::*;
