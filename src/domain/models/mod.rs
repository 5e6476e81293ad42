mod backend;
mod conversation;
mod event;
mod message;
mod role;
mod tool;
mod widget;

pub use backend::*;
pub use conversation::*;
pub use event::*;
pub use message::*;
pub use role::*;
pub use tool::*;
pub use widget::*;
