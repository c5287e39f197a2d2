//! Port traits and their error types.

mod error;
mod external;
mod repos;
mod testing;

pub use error::{LlmError, RepoError};
pub use external::{
    ChatMessage, LlmPort, LlmRequest, LlmResponse, MessageRole, TokenStream, TokenUsage,
};
pub use repos::{CharacterRepo, ItemRepo, SkillRepo, StoryRepo, TurnWrite, TurnWriter};
pub use testing::ClockPort;

#[cfg(test)]
pub use external::MockLlmPort;
#[cfg(test)]
pub use repos::{
    MockCharacterRepo, MockItemRepo, MockSkillRepo, MockStoryRepo, MockTurnWriter,
};
#[cfg(test)]
pub use testing::MockClockPort;
