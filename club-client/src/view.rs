//! Home view model, projected from the local cache for the rendering consumer

use shared::document::SharedDocument;
use shared::ledger::points_rules_lines;
use shared::models::{QuizLetter, TicketConfig};

use crate::client::ClubClient;
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeView {
    pub display_name: String,
    pub points: i64,
    /// Show the "offline data" banner
    pub backend_down: bool,
    pub bulletin_lines: Vec<String>,
    pub points_rules: Vec<String>,
    pub ticket: TicketConfig,
    /// Newest first
    pub events: Vec<EventCard>,
    pub quiz: Option<QuizCard>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventCard {
    pub id: String,
    pub title: String,
    pub date: String,
    pub note: String,
    pub capacity: u32,
    /// `None` for unlimited events
    pub seats_left: Option<u32>,
    pub booked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizState {
    Unanswered,
    Answered { letter: QuizLetter, correct: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizCard {
    pub id: String,
    pub question: String,
    pub options: Vec<(QuizLetter, String)>,
    pub state: QuizState,
}

impl HomeView {
    pub fn build(doc: &SharedDocument, session: &Session, backend_down: bool) -> Self {
        let card = &session.tessera;

        let events = doc
            .events_newest_first()
            .into_iter()
            .map(|event| EventCard {
                id: event.id.clone(),
                title: event.title.clone(),
                date: event.date.clone(),
                note: event.note.clone(),
                capacity: event.capacity,
                seats_left: doc.seats_left(&event.id),
                booked: doc.booking(&event.id, card).is_some(),
            })
            .collect();

        let quiz = doc.quiz.as_ref().map(|quiz| QuizCard {
            id: quiz.id.clone(),
            question: quiz.question.clone(),
            options: QuizLetter::ALL
                .iter()
                .map(|letter| (*letter, quiz.option(*letter).to_string()))
                .collect(),
            state: match doc.answer(card, &quiz.id) {
                Some(answer) => QuizState::Answered {
                    letter: answer.letter,
                    correct: answer.correct,
                },
                None => QuizState::Unanswered,
            },
        });

        let display_name = doc
            .member(card)
            .map(|m| m.display_name())
            .unwrap_or_else(|| session.name.clone());

        Self {
            display_name,
            points: doc.points.balance(card),
            backend_down,
            bulletin_lines: doc
                .bulletin
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
            points_rules: points_rules_lines(&doc.points_rules_text),
            ticket: doc.ticket_cfg.clone(),
            events,
            quiz,
        }
    }
}

impl ClubClient {
    /// `None` when no member is signed in
    pub fn home_view(&self) -> Option<HomeView> {
        self.context().with_cache(|cache| {
            let session = cache.session()?;
            Some(HomeView::build(
                &cache.local_view(),
                &session,
                cache.is_backend_down(),
            ))
        })
    }
}
