//! Data export

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use shared::document::SharedDocument;
use shared::ledger::PointsLedger;
use shared::models::{BookingTable, Event, Member, Quiz, QuizAnswers, TicketConfig};

/// Suggested download name
pub const EXPORT_FILE_NAME: &str = "inter-club-sulmona-dati.json";

/// Timestamped snapshot of the club data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSnapshot {
    /// RFC 3339
    pub exported_at: String,
    pub members: Vec<Member>,
    pub points: PointsLedger,
    pub events: Vec<Event>,
    pub bookings: BookingTable,
    pub quiz: Option<Quiz>,
    pub quiz_answers: QuizAnswers,
    #[serde(rename = "ticketCfg")]
    pub ticket_cfg: TicketConfig,
}

impl ExportSnapshot {
    pub fn from_document(doc: &SharedDocument, at: DateTime<Utc>) -> Self {
        Self {
            exported_at: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            members: doc.members.clone(),
            points: doc.points.clone(),
            events: doc.events.clone(),
            bookings: doc.bookings.clone(),
            quiz: doc.quiz.clone(),
            quiz_answers: doc.quiz_answers.clone(),
            ticket_cfg: doc.ticket_cfg.clone(),
        }
    }

    pub fn file_name(&self) -> &'static str {
        EXPORT_FILE_NAME
    }

    /// Pretty JSON as offered for download
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
