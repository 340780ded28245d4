//! Document operations
//!
//! Pure state transitions on a [`SharedDocument`]. The client runs them as the
//! optimistic local phase of a mutation; the server runs the very same code
//! as the authoritative phase, so both sides enforce capacity, one booking per
//! member and write-once quiz answers identically.

use crate::error::{DomainError, DomainResult};
use crate::identity::{CardId, normalize_name};
use crate::ledger::{BOOKING_REWARD, CANCELLATION_PENALTY, QUIZ_REWARD};
use crate::models::{
    Booking, DEFAULT_EVENT_TITLE, Event, Member, NewEvent, Quiz, QuizAnswer, QuizDraft,
    QuizLetter, answer_key, seats_used,
};
use crate::request::Mutation;
use crate::util::prefixed_id;

use super::SharedDocument;

/// Outcome of an applied mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationEffect {
    /// Delta requested from the ledger (before clamping)
    pub points_delta: i64,
    /// Balance after the change
    pub balance: i64,
    /// Quiz answers only: whether the chosen letter was right
    pub correct: Option<bool>,
}

impl SharedDocument {
    // ========== Queries ==========

    pub fn seats_used(&self, event_id: &str) -> u32 {
        self.bookings.get(event_id).map(seats_used).unwrap_or(0)
    }

    /// Seats still free; `None` for unlimited or unknown events
    pub fn seats_left(&self, event_id: &str) -> Option<u32> {
        let event = self.event(event_id)?;
        if event.is_unlimited() {
            return None;
        }
        Some(event.capacity.saturating_sub(self.seats_used(event_id)))
    }

    pub fn booking(&self, event_id: &str, card: &CardId) -> Option<&Booking> {
        self.bookings.get(event_id)?.get(card)
    }

    pub fn answer(&self, card: &CardId, quiz_id: &str) -> Option<&QuizAnswer> {
        self.quiz_answers.get(&answer_key(card, quiz_id))
    }

    // ========== Cooperative mutations ==========

    /// Apply a member mutation, or reject it leaving the document untouched.
    pub fn apply_mutation(
        &mut self,
        card: &CardId,
        mutation: &Mutation,
        now: i64,
    ) -> DomainResult<MutationEffect> {
        if card.is_empty() {
            return Err(DomainError::validation("card number is required"));
        }
        match mutation {
            Mutation::Book { event_id, seats } => self.book(card, event_id, *seats, now),
            Mutation::Cancel { event_id } => self.cancel(card, event_id),
            Mutation::QuizAnswer { quiz_id, letter } => {
                self.answer_quiz(card, quiz_id, *letter, now)
            }
        }
    }

    fn book(
        &mut self,
        card: &CardId,
        event_id: &str,
        seats: u32,
        now: i64,
    ) -> DomainResult<MutationEffect> {
        // 一个会员一张票
        if seats != 1 {
            return Err(DomainError::validation("a booking holds exactly one seat"));
        }
        let capacity = self
            .event(event_id)
            .map(|e| e.capacity)
            .ok_or_else(|| DomainError::EventNotFound(event_id.to_string()))?;

        if self.booking(event_id, card).is_some() {
            return Err(DomainError::AlreadyBooked {
                card: card.to_string(),
                event_id: event_id.to_string(),
            });
        }

        if capacity > 0 && self.seats_used(event_id) + 1 > capacity {
            return Err(DomainError::SoldOut(event_id.to_string()));
        }

        self.bookings
            .entry(event_id.to_string())
            .or_default()
            .insert(card.clone(), Booking::single(now));
        let balance = self.points.add(card, BOOKING_REWARD);

        Ok(MutationEffect {
            points_delta: BOOKING_REWARD,
            balance,
            correct: None,
        })
    }

    fn cancel(&mut self, card: &CardId, event_id: &str) -> DomainResult<MutationEffect> {
        if self.event(event_id).is_none() {
            return Err(DomainError::EventNotFound(event_id.to_string()));
        }

        let removed = self
            .bookings
            .get_mut(event_id)
            .and_then(|bookings| bookings.remove(card));
        if removed.is_none() {
            return Err(DomainError::NotBooked {
                card: card.to_string(),
                event_id: event_id.to_string(),
            });
        }

        let balance = self.points.add(card, CANCELLATION_PENALTY);
        Ok(MutationEffect {
            points_delta: CANCELLATION_PENALTY,
            balance,
            correct: None,
        })
    }

    fn answer_quiz(
        &mut self,
        card: &CardId,
        quiz_id: &str,
        letter: QuizLetter,
        now: i64,
    ) -> DomainResult<MutationEffect> {
        // 只接受当前激活的问答
        let expected = match &self.quiz {
            Some(quiz) if quiz.id == quiz_id => quiz.correct,
            _ => return Err(DomainError::QuizNotFound(quiz_id.to_string())),
        };

        let key = answer_key(card, quiz_id);
        if self.quiz_answers.contains_key(&key) {
            return Err(DomainError::AlreadyAnswered {
                card: card.to_string(),
                quiz_id: quiz_id.to_string(),
            });
        }

        let correct = expected == letter;
        self.quiz_answers.insert(
            key,
            QuizAnswer {
                letter,
                correct,
                at: now,
            },
        );

        let points_delta = if correct { QUIZ_REWARD } else { 0 };
        let balance = if correct {
            self.points.add(card, QUIZ_REWARD)
        } else {
            self.points.balance(card)
        };

        Ok(MutationEffect {
            points_delta,
            balance,
            correct: Some(correct),
        })
    }

    // ========== Admin edits ==========

    /// Insert a new event at the front of the list
    pub fn create_event(&mut self, input: NewEvent, now: i64) -> Event {
        let title = input.title.trim();
        let event = Event {
            id: prefixed_id("EV"),
            title: if title.is_empty() { DEFAULT_EVENT_TITLE } else { title }.to_string(),
            date: input.date.trim().to_string(),
            capacity: input.capacity,
            note: input.note.trim().to_string(),
            created_at: now,
        };
        self.events.insert(0, event.clone());
        event
    }

    /// Remove an event together with its bookings and any quiz bound to it.
    pub fn delete_event(&mut self, event_id: &str) -> bool {
        let before = self.events.len();
        self.events.retain(|e| e.id != event_id);
        let removed = self.events.len() != before;

        self.bookings.remove(event_id);
        if self
            .quiz
            .as_ref()
            .is_some_and(|q| q.event_id.as_deref() == Some(event_id))
        {
            self.quiz = None;
        }
        removed
    }

    /// Replace the active quiz; answers to the previous one stay, keyed by its id.
    pub fn publish_quiz(&mut self, draft: &QuizDraft, _now: i64) -> DomainResult<Quiz> {
        let correct = draft.validate()?;
        let quiz = Quiz {
            id: prefixed_id("QZ"),
            question: draft.question.trim().to_string(),
            options: draft.options.iter().map(|o| o.trim().to_string()).collect(),
            correct,
            event_id: draft.event_id.clone().filter(|id| !id.is_empty()),
        };
        self.quiz = Some(quiz.clone());
        Ok(quiz)
    }

    pub fn clear_quiz(&mut self) -> Option<Quiz> {
        self.quiz.take()
    }

    /// Insert or rename a member; a blank name keeps the existing one.
    pub fn upsert_member(&mut self, card: &CardId, name: &str) -> DomainResult<()> {
        if card.is_empty() {
            return Err(DomainError::validation("card number is required"));
        }
        let name = normalize_name(name);
        match self.members.iter_mut().find(|m| &m.card_id == card) {
            Some(existing) => {
                if !name.is_empty() {
                    existing.name = name;
                }
            }
            None => self.members.push(Member::new(card.clone(), &name)),
        }
        Ok(())
    }

    pub fn remove_member(&mut self, card: &CardId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| &m.card_id != card);
        self.members.len() != before
    }
}
