//! Data model for curriculum and schedule data.
//!
//! Extractor output stays header-keyed (`HashMap<String, String>`) where the
//! page schema genuinely varies; the schedule table has a fixed shape and is
//! converted to the typed records below at the extraction boundary.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Column holding the class section identifier in the schedule table.
pub const SECTION_COLUMN: &str = "Turma";
/// Column holding the professor list in the schedule table.
pub const PROFESSORS_COLUMN: &str = "Professores";
/// Column holding the discipline code in the curriculum analysis, when present.
pub const CODE_COLUMN: &str = "Sigla";
/// Column holding the activity name in the curriculum analysis.
pub const ACTIVITY_COLUMN: &str = "Nome da Atividade";

static DISCIPLINE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]{3}\d{5}").unwrap());

/// One time/day entry within a class section, with its room/building label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSlot {
    /// Time and day text as rendered, e.g. `"Segunda - 08:30 - 10:10"`
    #[serde(rename = "Horário")]
    pub time: String,
    /// Location label, empty when the page has no clickable room link
    #[serde(rename = "Local")]
    pub location: String,
}

/// One scheduled instance ("turma") of a discipline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSection {
    /// Remaining table columns, keyed by header text
    pub attrs: HashMap<String, String>,
    /// Parsed schedule slots, in table order
    pub schedule: Vec<ScheduleSlot>,
}

impl ClassSection {
    /// Section identifier from the `Turma` column, if the table has one.
    pub fn number(&self) -> Option<&str> {
        self.attrs.get(SECTION_COLUMN).map(String::as_str)
    }

    /// Professors from the `Professores` column, one per line in the cell.
    pub fn professors(&self) -> Vec<&str> {
        self.attrs
            .get(PROFESSORS_COLUMN)
            .map(|cell| {
                cell.lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// One discipline's full set of sections offered in a semester/course query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisciplineOffering {
    /// Discipline code, e.g. `INF01202`; unique within one query
    pub code: String,
    pub name: String,
    /// Credit count as rendered in the table
    pub credits: String,
    /// Link to the syllabus ("Plano de Ensino"), empty if absent
    pub syllabus: String,
    pub sections: Vec<ClassSection>,
}

/// A named grouping of curriculum rows (one `fieldset` on the analysis page).
///
/// All rows under one stage share the column set derived from that group's
/// table header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurriculumStage {
    pub name: String,
    pub rows: Vec<HashMap<String, String>>,
}

/// A curriculum row whose prerequisites are satisfied, annotated with the
/// stage it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibleDiscipline {
    pub stage: String,
    pub row: HashMap<String, String>,
}

impl EligibleDiscipline {
    /// Discipline code for this row.
    ///
    /// Prefers an explicit `Sigla` column; some curriculum layouts only embed
    /// the code inside the activity name, so fall back to the first
    /// three-letters-five-digits pattern found there.
    pub fn code(&self) -> Option<&str> {
        if let Some(code) = self.row.get(CODE_COLUMN) {
            return Some(code.as_str());
        }
        self.row
            .get(ACTIVITY_COLUMN)
            .and_then(|name| DISCIPLINE_CODE_RE.find(name))
            .map(|m| m.as_str())
    }
}
