//! Domain entities - the core business objects.

mod caller;
mod post;
mod tarot;

pub use caller::{CallerTier, GUEST_CALLER_ID};
pub use post::BlogPost;
pub use tarot::{DrawnCard, InterpretationPrompt, TarotGuideline, TarotReading};
