//! Environment-driven pipeline: log in (or reuse a saved session), pull the
//! curriculum and the semester's schedule, and print the disciplines the
//! student can actually take, optionally narrowed by a time pattern.

use anyhow::{bail, Context};
use regex::Regex;
use tracing::{info, warn};
use ufrgs::extract::{curriculum, enrollment, offerings};
use ufrgs::filter::{self, SlotMatch};
use ufrgs::session::store::DEFAULT_MAX_AGE_HOURS;
use ufrgs::{establish, Credentials, SessionFormat, SessionStore};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let credentials = match (
        std::env::var("UFRGS_USERNAME"),
        std::env::var("UFRGS_PASSWORD"),
    ) {
        (Ok(username), Ok(password)) => Some(Credentials { username, password }),
        _ => None,
    };
    let semester = std::env::var("UFRGS_SEMESTER")
        .context("UFRGS_SEMESTER must be set (e.g. 2025/2)")?;
    let time_filter = std::env::var("UFRGS_TIME_FILTER").ok();
    let match_all_slots = std::env::var("UFRGS_MATCH_ALL_SLOTS").is_ok();

    let store = match std::env::var("UFRGS_SESSION_FILE") {
        Ok(path) if path.ends_with(".json") => SessionStore::new(path, SessionFormat::Json),
        Ok(path) => SessionStore::new(path, SessionFormat::Binary),
        Err(_) => SessionStore::binary_default(),
    };

    let session = establish(credentials.as_ref(), &store, DEFAULT_MAX_AGE_HOURS)
        .context("could not establish a portal session")?;

    let stages = curriculum::fetch_curriculum(&session)?.data;
    let eligible = filter::compute_eligible(&stages);
    info!(count = eligible.len(), "eligible disciplines computed");

    let Some(course_name) = enrollment::fetch_course_name(&session)?.data else {
        bail!("could not determine the enrolled course name from the portal");
    };
    info!(course = %course_name, "enrolled course");

    let Some(course_code) = enrollment::fetch_course_code(&session, &course_name)?.data else {
        bail!("could not resolve a course code for {course_name:?}");
    };

    let offerings = offerings::fetch_offerings(&session, &semester, &course_code)?.data;
    info!(count = offerings.len(), semester = %semester, "offerings fetched");

    let mut available = filter::intersect(offerings, &eligible);
    if let Some(pattern) = time_filter {
        let pattern = Regex::new(&pattern)
            .with_context(|| format!("invalid UFRGS_TIME_FILTER pattern {pattern:?}"))?;
        let mode = if match_all_slots {
            SlotMatch::All
        } else {
            SlotMatch::Any
        };
        available = filter::filter_by_time(available, &pattern, mode);
    }

    if available.is_empty() {
        warn!("no eligible disciplines are offered under the given constraints");
    }
    println!("{}", serde_json::to_string_pretty(&available)?);
    Ok(())
}
