pub mod history;
pub mod session;

pub use history::{ConversationGroup, ConversationStats, DateLabel};
pub use parley_traits::{
    DEFAULT_CONVERSATION_ID, Message, MessageDraft, Role, StoredMessage,
};
pub use session::{Delivery, SessionEntry, SessionEvent, SessionSnapshot, TurnOutcome};
