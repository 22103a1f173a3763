//! Class schedule table extraction.
//!
//! The schedule table (`table#Horarios`) flattens a two-level structure into
//! rows: the first column is filled only on the row that starts a new
//! discipline, and every row carries one class section in its remaining
//! columns. Recovering the hierarchy is a stateful sweep that accumulates
//! sections into the current discipline and flushes it when the next one
//! starts.

use super::Extracted;
use crate::error::UfrgsError;
use crate::session::{UfrgsSession, SCHEDULE_URL};
use crate::types::{ClassSection, DisciplineOffering, ScheduleSlot};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Header of the column whose cell holds the schedule list items.
pub const SCHEDULE_COLUMN: &str = "Horários - Locais - Observações";
/// Header of the column holding the syllabus link.
pub const SYLLABUS_COLUMN: &str = "Plano de Ensino";

static TABLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table#Horarios").unwrap());
static ROW_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static HEADER_CELL_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th").unwrap());
static CELL_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());
static SLOT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("li.hor").unwrap());
static LOCATION_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.clicavel").unwrap());
static LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());

static SEMESTER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})/([12])$").unwrap());
static DISCIPLINE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(?([A-Z]{3}\d{5})\)?\s+(.+)$").unwrap());

/// Encodes a `YYYY/X` semester string into the portal's query code.
///
/// `"2024/2"` becomes `"2024022"`; the trailing `2` is a fixed marker the
/// portal expects. Terms other than 1 and 2 do not exist.
pub fn semester_code(semester: &str) -> Result<String, UfrgsError> {
    let caps = SEMESTER_RE
        .captures(semester)
        .ok_or_else(|| UfrgsError::InvalidSemester {
            input: semester.to_string(),
        })?;
    Ok(format!("{}0{}2", &caps[1], &caps[2]))
}

/// Splits a `(INF01202) Algoritmos` or `INF01202 Algoritmos` heading into
/// code and name. Without a recognizable code the whole trimmed text is
/// returned as the name.
pub fn split_discipline_name(heading: &str) -> (Option<String>, String) {
    let trimmed = heading.trim();
    match DISCIPLINE_NAME_RE.captures(trimmed) {
        Some(caps) => (Some(caps[1].to_string()), caps[2].trim().to_string()),
        None => (None, trimmed.to_string()),
    }
}

/// Fetches and parses the offerings for a semester and course.
pub fn fetch_offerings(
    session: &UfrgsSession,
    semester: &str,
    course_code: &str,
) -> Result<Extracted<Vec<DisciplineOffering>>, UfrgsError> {
    let code = semester_code(semester)?;
    let html = session.post_form(
        SCHEDULE_URL,
        &[("PL", code.as_str()), ("selecionado", course_code)],
    )?;
    Ok(parse_offerings(&html).logged("offerings"))
}

/// Parses the schedule table into discipline offerings.
///
/// A row with a non-empty first cell flushes the accumulated discipline and
/// starts the next one; every row (including the starting one) contributes a
/// class section from the remaining columns. Rows whose cell count does not
/// match the header are skipped. Zero disciplines is a normal outcome for a
/// semester/course combination with no offerings.
pub fn parse_offerings(html: &str) -> Extracted<Vec<DisciplineOffering>> {
    let document = Html::parse_document(html);
    let mut result = Extracted::new(Vec::new());

    let Some(table) = document.select(&TABLE_SELECTOR).next() else {
        result.diag("no schedule table (table#Horarios) found");
        return result;
    };

    let mut rows = table.select(&ROW_SELECTOR);
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row
            .select(&HEADER_CELL_SELECTOR)
            .map(|th| text_of(&th))
            .collect(),
        None => {
            result.diag("schedule table has no rows");
            return result;
        }
    };
    if headers.is_empty() {
        result.diag("schedule table has no header cells");
        return result;
    }
    let syllabus_idx = headers.iter().position(|h| h == SYLLABUS_COLUMN);

    let mut current: Option<DisciplineOffering> = None;
    for row in rows {
        let cells: Vec<ElementRef> = row.select(&CELL_SELECTOR).collect();
        if cells.len() != headers.len() {
            continue;
        }

        let first = text_of(&cells[0]);
        if !first.is_empty() {
            if let Some(finished) = current.take() {
                result.data.push(finished);
            }
            let (code, name) = split_discipline_name(&first);
            match code {
                Some(code) => {
                    let syllabus = syllabus_idx
                        .and_then(|idx| cells[idx].select(&LINK_SELECTOR).next())
                        .and_then(|a| a.value().attr("href"))
                        .unwrap_or_default()
                        .to_string();
                    current = Some(DisciplineOffering {
                        code,
                        name,
                        credits: text_of(&cells[1]),
                        syllabus,
                        sections: Vec::new(),
                    });
                }
                None => {
                    result.diag(format!("could not parse discipline heading: {first:?}"));
                }
            }
        }

        let Some(discipline) = current.as_mut() else {
            continue;
        };

        let mut section = ClassSection {
            attrs: HashMap::new(),
            schedule: Vec::new(),
        };
        for (idx, cell) in cells.iter().enumerate() {
            if idx == 0 || idx == 1 || Some(idx) == syllabus_idx {
                continue;
            }
            if headers[idx] == SCHEDULE_COLUMN {
                section.schedule = parse_schedule_cell(cell);
            } else {
                section.attrs.insert(headers[idx].clone(), text_of(cell));
            }
        }
        discipline.sections.push(section);
    }
    if let Some(finished) = current.take() {
        result.data.push(finished);
    }

    if result.data.is_empty() {
        result.diag("no disciplines found for the given semester and course");
    }
    result
}

/// One `li.hor` per slot; the clickable anchor inside it is the location.
fn parse_schedule_cell(cell: &ElementRef) -> Vec<ScheduleSlot> {
    cell.select(&SLOT_SELECTOR)
        .map(|li| {
            let full = text_of(&li);
            let location = li
                .select(&LOCATION_SELECTOR)
                .next()
                .map(|a| text_of(&a))
                .unwrap_or_default();
            let time = full
                .strip_suffix(location.as_str())
                .unwrap_or(&full)
                .trim()
                .to_string();
            ScheduleSlot { time, location }
        })
        .collect()
}

fn text_of(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}
