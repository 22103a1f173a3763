//! Session lifecycle for the UFRGS portal.
//!
//! Login is a cookie dance against a server-rendered PHP portal: GET the
//! login page to prime cookies, POST the credential form with redirects
//! disabled, and judge success purely by the response shape — a redirect
//! into the intranet portal means success, a re-rendered login page (200)
//! means bad credentials. The resulting cookies are what make every later
//! page fetch authenticated.

pub mod store;

use crate::error::UfrgsError;
use reqwest::blocking::Client;
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, LOCATION, SET_COOKIE};
use reqwest::redirect::Policy;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use store::{LoadOutcome, SessionSnapshot, SessionStore};
use tracing::{debug, info, warn};
use url::Url;

/// Login endpoint of the portal.
pub const LOGIN_URL: &str = "https://www1.ufrgs.br/sistemas/portal/login";
/// Curriculum analysis page; also the default validity probe target.
pub const CURRICULUM_URL: &str =
    "https://www1.ufrgs.br/intranet/portal/public/index.php?cods=1,1,2,81";
/// Enrollment info page.
pub const ENROLLMENT_URL: &str =
    "https://www1.ufrgs.br/intranet/portal/public/index.php?cods=1,1,2,2";
/// Course selection / class schedule page.
pub const SCHEDULE_URL: &str =
    "https://www1.ufrgs.br/intranet/portal/public/index.php?cods=1,1,2,7";

const LOGOUT_URL: &str = "https://www1.ufrgs.br/portalservicos/sair.php";

/// Path a successful login redirects into.
const AUTHENTICATED_PATH: &str = "intranet/portal/public/index.php";

/// URL fragments that mean the portal bounced us back to authentication.
const LOGIN_INDICATORS: [&str; 2] = ["teste_intranet.php", "login"];

/// Fixed hidden fields of the login form, from the portal's form markup.
const LOGIN_DESTINATION: &str = "ccd7f388f9a3e25ef6aff3b98c773f65";
const LOGIN_ORIGIN: &str = "https%3A%2F%2Fwww.ufrgs.br%2F";

/// Bounded timeout for the validity probe, so a hung portal cannot block the
/// liveness check indefinitely. Other calls use the transport defaults.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Headers sent on every request to look like a regular browser.
const BROWSER_HEADERS: [(&str, &str); 4] = [
    (
        "User-Agent",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    ),
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
    ),
    ("Accept-Language", "en-US,en;q=0.5"),
    ("Upgrade-Insecure-Requests", "1"),
];

static PORTAL_ORIGIN: LazyLock<Url> =
    LazyLock::new(|| Url::parse("https://www1.ufrgs.br/").unwrap());

/// Portal credentials. Used only to produce a session, never persisted.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An authenticated portal session.
///
/// Two clients share one cookie jar: the redirect-following one for normal
/// page fetches and the probe, and one with redirects disabled so the login
/// POST's Location header can be inspected.
pub struct UfrgsSession {
    http: Client,
    http_no_redirect: Client,
    /// Cookie pairs observed at login / restored from a snapshot. This is
    /// what gets persisted; the jar handles the live requests.
    cookies: HashMap<String, String>,
    headers: HashMap<String, String>,
}

impl UfrgsSession {
    /// Creates a fresh, unauthenticated session.
    pub fn new() -> Result<Self, UfrgsError> {
        Self::build(Self::default_headers(), HashMap::new())
    }

    /// Restores a session from a saved snapshot.
    ///
    /// Snapshot headers are layered over the browser defaults, so a snapshot
    /// from an older version that lacks some of them still works.
    pub fn from_snapshot(snapshot: &SessionSnapshot) -> Result<Self, UfrgsError> {
        let mut headers = Self::default_headers();
        headers.extend(
            snapshot
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        Self::build(headers, snapshot.cookies.clone())
    }

    pub(crate) fn default_headers() -> HashMap<String, String> {
        BROWSER_HEADERS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn build(
        headers: HashMap<String, String>,
        cookies: HashMap<String, String>,
    ) -> Result<Self, UfrgsError> {
        let jar = Arc::new(Jar::default());
        for (name, value) in &cookies {
            jar.add_cookie_str(&format!("{name}={value}; Path=/"), &PORTAL_ORIGIN);
        }

        let mut header_map = HeaderMap::new();
        for (name, value) in &headers {
            let (Ok(name), Ok(value)) = (
                HeaderName::try_from(name.as_str()),
                HeaderValue::from_str(value),
            ) else {
                warn!(header = %name, "skipping malformed header from snapshot");
                continue;
            };
            header_map.insert(name, value);
        }

        let http = Client::builder()
            .default_headers(header_map.clone())
            .cookie_provider(jar.clone())
            .redirect(Policy::limited(10))
            .build()?;
        let http_no_redirect = Client::builder()
            .default_headers(header_map)
            .cookie_provider(jar.clone())
            .redirect(Policy::none())
            .build()?;

        Ok(Self {
            http,
            http_no_redirect,
            cookies,
            headers,
        })
    }

    /// Logs in with the given credentials.
    ///
    /// Success is determined only by response shape, not body content: the
    /// portal answers a good login with a redirect into the intranet, and a
    /// bad one by re-rendering the login page with HTTP 200.
    pub fn login(&mut self, credentials: &Credentials) -> Result<(), UfrgsError> {
        info!(username = %credentials.username, "attempting portal login");

        // Prime the session cookies before posting the form.
        let prime = self.http.get(LOGIN_URL).send()?.error_for_status()?;
        self.absorb_cookies(prime.headers());

        let form = [
            ("Destino", LOGIN_DESTINATION),
            ("Origem", LOGIN_ORIGIN),
            ("Var1", ""),
            ("Var2", ""),
            ("usuario", credentials.username.as_str()),
            ("senha", credentials.password.as_str()),
        ];
        let response = self.http_no_redirect.post(LOGIN_URL).form(&form).send()?;
        self.absorb_cookies(response.headers());

        let status = response.status();
        if status.is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|h| h.to_str().ok())
                .unwrap_or_default()
                .to_string();
            if location.contains(AUTHENTICATED_PATH) {
                info!(location = %location, "login successful");
                return Ok(());
            }
            warn!(location = %location, "login redirected to an unexpected location");
            return Err(UfrgsError::UnexpectedRedirect { location });
        }
        if status == StatusCode::OK {
            // Stayed on the login page.
            warn!("login failed: portal re-rendered the login page");
            return Err(UfrgsError::InvalidCredentials);
        }
        warn!(status = status.as_u16(), "unexpected login response status");
        Err(UfrgsError::UnexpectedLoginStatus {
            status: status.as_u16(),
        })
    }

    /// Probes whether this session is still accepted by the portal.
    ///
    /// Fetches a protected page (the curriculum analysis by default) with
    /// redirects followed. HTTP 200 at a non-login URL means valid; a bounce
    /// to the authentication test or login page, any other status, or any
    /// transport failure all mean invalid. This is a yes/no probe and never
    /// fails: callers fall back to a fresh login on `false`.
    pub fn is_valid(&self, probe_url: Option<&str>) -> bool {
        let url = probe_url.unwrap_or(CURRICULUM_URL);
        let response = match self.http.get(url).timeout(PROBE_TIMEOUT).send() {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "validity probe failed");
                return false;
            }
        };

        let final_url = response.url().as_str().to_lowercase();
        if response.status() != StatusCode::OK {
            info!(status = %response.status(), "session invalid: unexpected probe status");
            return false;
        }
        if LOGIN_INDICATORS
            .iter()
            .any(|marker| final_url.contains(marker))
        {
            info!(url = %final_url, "session invalid: probe landed on an authentication page");
            return false;
        }
        true
    }

    /// Fetches a page through the authenticated session. Non-2xx is an error.
    pub fn fetch(&self, url: &str) -> Result<String, UfrgsError> {
        let response = self.http.get(url).send()?.error_for_status()?;
        Ok(response.text()?)
    }

    /// Posts a form through the authenticated session. Non-2xx is an error.
    pub fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<String, UfrgsError> {
        let response = self.http.post(url).form(form).send()?.error_for_status()?;
        Ok(response.text()?)
    }

    /// Signs out of the portal and drops the recorded cookies.
    pub fn logout(&mut self) {
        match self.http.get(LOGOUT_URL).send() {
            Ok(response) if response.status() == StatusCode::OK => info!("logged out"),
            Ok(response) => warn!(status = %response.status(), "logout request not accepted"),
            Err(e) => warn!(error = %e, "logout request failed"),
        }
        self.cookies.clear();
    }

    /// Captures the current authentication state for persistence.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::new(self.cookies.clone(), self.headers.clone())
    }

    /// Records cookie pairs from `Set-Cookie` response headers.
    fn absorb_cookies(&mut self, headers: &HeaderMap) {
        for value in headers.get_all(SET_COOKIE) {
            let Ok(raw) = value.to_str() else { continue };
            let Some(pair) = raw.split(';').next() else {
                continue;
            };
            if let Some((name, value)) = pair.split_once('=') {
                self.cookies
                    .insert(name.trim().to_string(), value.trim().to_string());
            }
        }
    }
}

/// Establishes a usable session, reusing a saved one when possible.
///
/// In order: load from the store (absent/expired falls through), probe the
/// loaded session's validity, and only then log in fresh with the supplied
/// credentials and persist the result. The store is written exactly once,
/// on the fresh-login path. With no usable saved session and no credentials
/// this fails with [`UfrgsError::NoValidSession`].
pub fn establish(
    credentials: Option<&Credentials>,
    store: &SessionStore,
    max_age_hours: i64,
) -> Result<UfrgsSession, UfrgsError> {
    if let LoadOutcome::Loaded(snapshot) = store.load(max_age_hours) {
        let session = UfrgsSession::from_snapshot(&snapshot)?;
        if session.is_valid(None) {
            info!("reusing saved session");
            return Ok(session);
        }
        info!("saved session is no longer accepted by the portal");
    }

    let Some(credentials) = credentials else {
        return Err(UfrgsError::NoValidSession);
    };

    let mut session = UfrgsSession::new()?;
    session.login(credentials)?;
    // A failed save is not worth aborting a successful login over.
    if let Err(e) = store.save(&session.snapshot()) {
        warn!(error = %e, "could not persist the fresh session");
    }
    Ok(session)
}
