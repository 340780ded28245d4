//! Roster parsing: spreadsheet CSV exports and the plain allowed-list editor

use std::collections::HashMap;

use shared::error::{DomainError, DomainResult};
use shared::identity::{CardId, normalize_name};
use shared::models::{Member, merge_roster};

/// Values of the active column that keep a row
const ACTIVE_VALUES: [&str; 6] = ["si", "s", "1", "true", "yes", "y"];

const CARD_HEADERS: [&str; 4] = ["numero tessera", "tessera", "n tessera", "nr tessera"];
const FULL_NAME_HEADERS: [&str; 2] = ["nome e cognome", "nominativo"];
const ACTIVE_HEADERS: [&str; 2] = ["attivo", "attiva"];

/// How imported members combine with the current roster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportMode {
    #[default]
    Merge,
    Replace,
}

impl ImportMode {
    pub fn apply(self, roster: &mut Vec<Member>, imported: Vec<Member>) {
        if self == Self::Replace {
            roster.clear();
        }
        merge_roster(roster, imported);
    }
}

/// Decode an uploaded file; Excel on Windows saves CSV as Windows-1252
pub fn decode_csv_bytes(bytes: &[u8]) -> String {
    let (text, _, had_errors) = encoding_rs::UTF_8.decode(bytes);
    if !had_errors {
        return text.into_owned();
    }
    let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    text.into_owned()
}

/// Most frequent of comma, semicolon and tab in the header line (comma on ties)
pub fn detect_delimiter(first_line: &str) -> char {
    let mut best = (',', 0);
    for delim in [',', ';', '\t'] {
        let count = first_line.matches(delim).count();
        if count > best.1 {
            best = (delim, count);
        }
    }
    best.0
}

/// Split one line, honouring quotes and `""` escapes
pub fn split_line(line: &str, delim: char) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cur = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                cur.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            c if c == delim && !in_quotes => cells.push(std::mem::take(&mut cur)),
            c => cur.push(c),
        }
    }
    cells.push(cur);
    cells
}

/// Lower-case, collapse whitespace and strip Italian accents
pub fn normalize_header(raw: &str) -> String {
    normalize_name(&raw.to_lowercase())
        .chars()
        .map(|c| match c {
            'à' | 'á' | 'â' | 'ä' => 'a',
            'è' | 'é' | 'ê' | 'ë' => 'e',
            'ì' | 'í' | 'î' | 'ï' => 'i',
            'ò' | 'ó' | 'ô' | 'ö' => 'o',
            'ù' | 'ú' | 'û' | 'ü' => 'u',
            c => c,
        })
        .collect()
}

#[derive(Debug, Default)]
struct Columns {
    card: Option<usize>,
    first: Option<usize>,
    last: Option<usize>,
    full: Option<usize>,
    active: Option<usize>,
}

impl Columns {
    fn detect(headers: &[String]) -> Self {
        let find = |pred: &dyn Fn(&str) -> bool| headers.iter().position(|h| pred(h.as_str()));
        let is_full = |h: &str| FULL_NAME_HEADERS.iter().any(|k| h.contains(k));

        Self {
            card: find(&|h| CARD_HEADERS.iter().any(|k| h.contains(k))),
            full: find(&is_full),
            last: find(&|h| h.contains("cognome") && !is_full(h)),
            first: find(&|h| h.contains("nome") && !h.contains("cognome") && !is_full(h)),
            active: find(&|h| ACTIVE_HEADERS.iter().any(|k| h.contains(k))),
        }
    }
}

fn cell(row: &[String], col: Option<usize>) -> &str {
    col.and_then(|i| row.get(i)).map(String::as_str).unwrap_or("")
}

/// Parse a member export
///
/// Inactive rows are dropped and a card listed twice keeps its last row.
pub fn parse_members_csv(text: &str) -> DomainResult<Vec<Member>> {
    let lines: Vec<&str> = text
        .lines()
        .map(|l| l.trim_start_matches('\u{feff}'))
        .filter(|l| !l.trim().is_empty())
        .collect();
    let Some(header_line) = lines.first() else {
        return Err(DomainError::validation("empty CSV"));
    };

    let delim = detect_delimiter(header_line);
    let headers: Vec<String> = split_line(header_line, delim)
        .iter()
        .map(|h| normalize_header(h))
        .collect();
    let columns = Columns::detect(&headers);
    if columns.card.is_none() {
        return Err(DomainError::validation("no card number column (\"tessera\") in CSV"));
    }

    let mut rows: Vec<(Member, bool)> = Vec::new();
    let mut index: HashMap<CardId, usize> = HashMap::new();

    for line in &lines[1..] {
        let row = split_line(line, delim);
        let Some(card) = CardId::parse(cell(&row, columns.card)) else {
            continue;
        };

        let active = columns.active.is_none_or(|_| {
            let raw = cell(&row, columns.active).trim().to_lowercase();
            ACTIVE_VALUES.contains(&raw.as_str())
        });

        let name = if columns.full.is_some() {
            normalize_name(cell(&row, columns.full))
        } else {
            normalize_name(&format!(
                "{} {}",
                cell(&row, columns.first),
                cell(&row, columns.last)
            ))
        };

        let entry = (Member::new(card.clone(), &name), active);
        match index.get(&card) {
            Some(&pos) => rows[pos] = entry,
            None => {
                index.insert(card, rows.len());
                rows.push(entry);
            }
        }
    }

    let members: Vec<Member> = rows
        .into_iter()
        .filter_map(|(member, active)| active.then_some(member))
        .collect();
    if members.is_empty() {
        return Err(DomainError::validation("no active members found in CSV"));
    }
    Ok(members)
}

/// One `CARD,Name` per line; the first occurrence of a card wins
pub fn parse_allowed_list(text: &str) -> Vec<Member> {
    let mut out: Vec<Member> = Vec::new();
    for line in text.lines() {
        let raw = line.trim();
        if raw.is_empty() {
            continue;
        }
        let (card, name) = raw.split_once(',').unwrap_or((raw, ""));
        let Some(card) = CardId::parse(card) else {
            continue;
        };
        if out.iter().any(|m| m.card_id == card) {
            continue;
        }
        out.push(Member::new(card, name));
    }
    out
}

/// Inverse of [`parse_allowed_list`], for the editor
pub fn format_allowed_list(members: &[Member]) -> String {
    members
        .iter()
        .map(|m| {
            if m.name.is_empty() {
                m.card_id.to_string()
            } else {
                format!("{},{}", m.card_id, m.name)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
