//! Scraper for UFRGS's student portal.
//!
//! The portal is a classic server-rendered PHP application: a cookie-based
//! login, then a handful of pages whose data only exists as HTML tables.
//! This crate handles the session lifecycle (login, validity probing,
//! persistence across runs) and turns three of those pages into structured
//! data: the curriculum analysis, the student's enrollment, and the class
//! schedule table for a semester.

pub mod error;
pub mod extract;
pub mod filter;
pub mod session;
pub mod similarity;
pub mod types;

pub use error::UfrgsError;
pub use session::store::{LoadOutcome, SessionFormat, SessionSnapshot, SessionStore};
pub use session::{establish, Credentials, UfrgsSession};
pub use types::{ClassSection, CurriculumStage, DisciplineOffering, EligibleDiscipline, ScheduleSlot};
