pub mod audio;
pub mod events;
pub mod session;
pub mod tools;
mod items;

pub use events::{ClientEvent, ServerEvent};
pub use items::{
    Content, FunctionCallOutputItem, Item, ItemStatus, MessageItem, MessageItemBuilder,
    MessageRole,
};
pub use session::Session;
