use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Interpretation guideline for one spread type, authored by admins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TarotGuideline {
    pub spread: String,
    pub title: String,
    pub instructions: String,
    pub updated_at: DateTime<Utc>,
}

impl TarotGuideline {
    pub fn new(spread: impl Into<String>, title: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            spread: spread.into(),
            title: title.into(),
            instructions: instructions.into(),
            updated_at: Utc::now(),
        }
    }
}

/// A card as drawn in a reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawnCard {
    pub name: String,
    pub position: String,
    #[serde(default)]
    pub reversed: bool,
}

/// A reading submitted for AI interpretation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TarotReading {
    pub question: String,
    pub spread: String,
    pub cards: Vec<DrawnCard>,
}

/// Prompt pair sent to the language model.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpretationPrompt {
    pub system: String,
    pub user: String,
}

impl TarotReading {
    pub const MAX_QUESTION_CHARS: usize = 500;
    pub const MAX_CARDS: usize = 10;

    pub fn validate(&self) -> Result<(), DomainError> {
        let question = self.question.trim();
        if question.is_empty() {
            return Err(DomainError::Validation("Question must not be empty".to_string()));
        }
        if question.chars().count() > Self::MAX_QUESTION_CHARS {
            return Err(DomainError::Validation(format!(
                "Question must be at most {} characters",
                Self::MAX_QUESTION_CHARS
            )));
        }
        if self.spread.trim().is_empty() {
            return Err(DomainError::Validation("Spread type must not be empty".to_string()));
        }
        if self.cards.is_empty() || self.cards.len() > Self::MAX_CARDS {
            return Err(DomainError::Validation(format!(
                "A reading needs between 1 and {} cards",
                Self::MAX_CARDS
            )));
        }
        if let Some(card) = self.cards.iter().find(|c| c.name.trim().is_empty()) {
            return Err(DomainError::Validation(format!(
                "Card at position '{}' has no name",
                card.position
            )));
        }
        Ok(())
    }

    /// Build the model prompt, folding in the spread's guideline when one exists.
    pub fn to_prompt(&self, guideline: Option<&TarotGuideline>) -> InterpretationPrompt {
        let mut system = String::from(
            "You are InnerSpell, a thoughtful tarot reader. Interpret the cards in the \
             context of the querent's question. Be warm, specific and honest; never \
             give medical, legal or financial directives.",
        );
        if let Some(g) = guideline {
            system.push_str("\n\nGuideline for the ");
            system.push_str(&g.title);
            system.push_str(" spread:\n");
            system.push_str(&g.instructions);
        }

        let mut user = format!("Question: {}\nSpread: {}\nCards:\n", self.question.trim(), self.spread);
        for (i, card) in self.cards.iter().enumerate() {
            let orientation = if card.reversed { "reversed" } else { "upright" };
            user.push_str(&format!(
                "{}. {} - {} ({})\n",
                i + 1,
                card.position,
                card.name,
                orientation
            ));
        }

        InterpretationPrompt { system, user }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(cards: usize) -> TarotReading {
        TarotReading {
            question: "Will the new job suit me?".to_string(),
            spread: "three-card".to_string(),
            cards: (0..cards)
                .map(|i| DrawnCard {
                    name: format!("Card {}", i),
                    position: format!("Position {}", i),
                    reversed: i % 2 == 1,
                })
                .collect(),
        }
    }

    #[test]
    fn test_validate_accepts_normal_reading() {
        assert!(reading(3).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_card_counts() {
        assert!(matches!(reading(0).validate(), Err(DomainError::Validation(_))));
        assert!(matches!(
            reading(TarotReading::MAX_CARDS + 1).validate(),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_blank_question() {
        let mut r = reading(1);
        r.question = "   ".to_string();
        assert!(r.validate().is_err());
    }

    #[test]
    fn test_prompt_includes_guideline_and_orientation() {
        let guideline = TarotGuideline::new("three-card", "Past / Present / Future", "Read left to right.");
        let prompt = reading(2).to_prompt(Some(&guideline));

        assert!(prompt.system.contains("Read left to right."));
        assert!(prompt.user.contains("1. Position 0 - Card 0 (upright)"));
        assert!(prompt.user.contains("2. Position 1 - Card 1 (reversed)"));
    }

    #[test]
    fn test_prompt_without_guideline() {
        let prompt = reading(1).to_prompt(None);
        assert!(!prompt.system.contains("Guideline"));
    }
}
