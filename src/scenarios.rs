// Parametrized contract scenarios against the booking service
// Each case builds its own inputs, issues one call under test and checks status and payload shape

use crate::client::{booking_path, to_json, with_token_cookie, ApiError, BookerClient, JSON};
use crate::fixtures::{self, BookingBuilder};
use crate::models::{AuthToken, BookingRecord, CreateBookingRequest, CreatedBooking, Credentials};
use crate::schema::{Schema, ValidationError};
use crate::transport::{header_map, ApiRequest, Transport};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde_json::{json, Value};
use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

// Selection markers, named after the markers the suite has always used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Auth,
    RequiresToken,
    WithoutToken,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::Auth,
        Category::RequiresToken,
        Category::WithoutToken,
    ];

    pub fn marker(&self) -> &'static str {
        match self {
            Category::Auth => "auth",
            Category::RequiresToken => "required_token",
            Category::WithoutToken => "without_token",
        }
    }

    pub fn from_marker(marker: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.marker() == marker)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Authenticate,
    DeleteBooking,
    GetBooking,
    CreateBooking,
    CreateThenGet,
}

impl Family {
    pub fn category(&self) -> Category {
        match self {
            Family::Authenticate => Category::Auth,
            Family::DeleteBooking => Category::RequiresToken,
            Family::GetBooking | Family::CreateBooking | Family::CreateThenGet => {
                Category::WithoutToken
            }
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Family::Authenticate => "authenticate",
            Family::DeleteBooking => "delete-booking",
            Family::GetBooking => "get-booking",
            Family::CreateBooking => "create-booking",
            Family::CreateThenGet => "create-then-get",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Remote call failed: {0}")]
    Api(#[from] ApiError),

    #[error("Assertion failed: {}", .0.join("; "))]
    Assertion(Vec<String>),
}

// Collects failed assertions so a case reports all of them at once
#[derive(Default)]
struct Checks {
    failures: Vec<String>,
}

impl Checks {
    fn check(&mut self, ok: bool, message: impl Into<String>) {
        if !ok {
            self.failures.push(message.into());
        }
    }

    fn finish(self) -> Result<(), ScenarioError> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(ScenarioError::Assertion(self.failures))
        }
    }
}

pub fn status_text(status: u16) -> Option<&'static str> {
    match status {
        201 => Some("Created"),
        403 => Some("Forbidden"),
        404 => Some("Not Found"),
        405 => Some("Method Not Allowed"),
        415 => Some("Unsupported Media Type"),
        418 => Some("I'm a Teapot"),
        _ => None,
    }
}

// A header sent with an empty value, which the service treats differently from no header
fn empty_header(name: HeaderName) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(name, HeaderValue::from_static(""));
    headers
}

fn plain_text_exchange() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    headers.insert(ACCEPT, HeaderValue::from_static("text/plain"));
    headers
}

// Authenticate

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthExpect {
    Token,
    NoToken,
    // A "Bad credentials" reason implies no token, anything else must carry one
    TokenXorReason,
    // Local validation must reject the input, listing these fields; nothing is sent
    Invalid(&'static [&'static str]),
}

#[derive(Debug, Clone)]
pub struct AuthCase {
    pub label: &'static str,
    pub username: &'static str,
    pub password: &'static str,
    pub headers: HeaderMap,
    pub expect: AuthExpect,
    pub known_discrepancy: bool,
}

pub fn auth_cases() -> Vec<AuthCase> {
    vec![
        AuthCase {
            label: "valid credentials",
            username: "admin",
            password: "password123",
            headers: fixtures::json_content(),
            expect: AuthExpect::Token,
            known_discrepancy: false,
        },
        AuthCase {
            label: "empty Content-Type",
            username: "admin",
            password: "password123",
            headers: empty_header(CONTENT_TYPE),
            expect: AuthExpect::TokenXorReason,
            known_discrepancy: false,
        },
        AuthCase {
            label: "no headers",
            username: "admin",
            password: "password123",
            headers: HeaderMap::new(),
            expect: AuthExpect::Token,
            known_discrepancy: false,
        },
        AuthCase {
            label: "unknown username",
            username: "admin1",
            password: "password123",
            headers: fixtures::json_content(),
            expect: AuthExpect::NoToken,
            known_discrepancy: false,
        },
        AuthCase {
            label: "empty username and password",
            username: "",
            password: "",
            headers: fixtures::json_content(),
            expect: AuthExpect::Invalid(&["username", "password"]),
            known_discrepancy: false,
        },
        AuthCase {
            label: "wrong username and password",
            username: "dsaqwe",
            password: "asd123",
            headers: fixtures::json_content(),
            expect: AuthExpect::NoToken,
            known_discrepancy: false,
        },
    ]
}

pub async fn run_auth_case<T: Transport>(
    client: &BookerClient<T>,
    case: &AuthCase,
) -> Result<(), ScenarioError> {
    let credentials = match (Credentials::new(case.username, case.password), &case.expect) {
        (Err(e), AuthExpect::Invalid(fields)) => {
            let mut checks = Checks::default();
            checks.check(
                e.missing_fields() == fields.to_vec(),
                format!("expected missing {:?}, got: {}", fields, e),
            );
            return checks.finish();
        }
        (Ok(_), AuthExpect::Invalid(fields)) => {
            return Err(ScenarioError::Assertion(vec![format!(
                "credentials validated but {:?} were expected to be rejected",
                fields
            )]));
        }
        (result, _) => result?,
    };

    let request = ApiRequest::new(Method::POST, "/auth")
        .headers(case.headers.clone())
        .json(to_json(&credentials)?);
    let response = client.execute(request).await?;

    let mut checks = Checks::default();
    checks.check(
        response.status == 200,
        format!("Request failed with status code {}", response.status),
    );
    let payload = response.json().unwrap_or(Value::Null);
    let has_token = payload
        .get("token")
        .and_then(|t| t.as_str())
        .map_or(false, |t| !t.is_empty());
    let token_field = payload.get("token").is_some();
    let rejected = payload.get("reason").and_then(|r| r.as_str()) == Some("Bad credentials");

    match case.expect {
        AuthExpect::Token => {
            checks.check(has_token, "Response does not contain a token");
        }
        AuthExpect::NoToken => {
            checks.check(
                !token_field,
                "Response contains a token for invalid credentials",
            );
        }
        AuthExpect::TokenXorReason if rejected => {
            checks.check(
                !token_field,
                "Response contains a token for invalid credentials",
            );
        }
        AuthExpect::TokenXorReason => {
            checks.check(has_token, "Response does not contain a token");
        }
        AuthExpect::Invalid(_) => {}
    }
    checks.finish()
}

// Delete booking

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    // Issue a fresh token when the case runs
    Issued,
    Literal(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingTarget {
    // Create a fresh booking when the case runs
    Fresh,
    Literal(&'static str),
}

#[derive(Debug, Clone)]
pub struct DeleteCase {
    pub label: &'static str,
    pub token: TokenSource,
    pub booking: BookingTarget,
    pub content_type: &'static str,
    pub expected_status: u16,
    pub known_discrepancy: bool,
}

pub fn delete_cases() -> Vec<DeleteCase> {
    vec![
        DeleteCase {
            label: "valid token and booking",
            token: TokenSource::Issued,
            booking: BookingTarget::Fresh,
            content_type: JSON,
            expected_status: 201,
            known_discrepancy: true,
        },
        DeleteCase {
            label: "invalid token",
            token: TokenSource::Literal("asd324sda"),
            booking: BookingTarget::Fresh,
            content_type: JSON,
            expected_status: 403,
            known_discrepancy: true,
        },
        DeleteCase {
            label: "invalid booking id",
            token: TokenSource::Issued,
            booking: BookingTarget::Literal("-1"),
            content_type: JSON,
            expected_status: 405,
            known_discrepancy: true,
        },
        DeleteCase {
            label: "text/plain Content-Type",
            token: TokenSource::Issued,
            booking: BookingTarget::Fresh,
            content_type: "text/plain",
            expected_status: 415,
            known_discrepancy: true,
        },
    ]
}

pub async fn run_delete_case<T: Transport>(
    client: &BookerClient<T>,
    case: &DeleteCase,
) -> Result<(), ScenarioError> {
    let token = match case.token {
        TokenSource::Issued => client.authenticate(&fixtures::admin_credentials()).await?,
        TokenSource::Literal(token) => AuthToken {
            token: token.to_string(),
        },
    };
    let booking_id = match case.booking {
        BookingTarget::Fresh => client.create_booking_id(&token).await?.to_string(),
        BookingTarget::Literal(id) => id.to_string(),
    };

    let headers = header_map(&[("Content-Type", case.content_type)])?;
    let request = ApiRequest::new(Method::DELETE, booking_path(&booking_id))
        .headers(with_token_cookie(headers, &token.token)?);
    let response = client.execute(request).await?;

    let mut checks = Checks::default();
    checks.check(
        response.status == case.expected_status,
        format!(
            "Delete booking request failed with status code {}",
            response.status
        ),
    );
    if let Some(text) = status_text(response.status) {
        checks.check(
            response.body == text,
            format!("Delete booking response should contain {:?}", text),
        );
    }
    checks.finish()
}

// Get booking

#[derive(Debug, Clone)]
pub struct GetCase {
    pub label: &'static str,
    pub booking_id: &'static str,
    // None sends no headers beyond the transport defaults
    pub headers: Option<HeaderMap>,
    pub expected_status: u16,
    pub known_discrepancy: bool,
}

pub fn get_cases() -> Vec<GetCase> {
    vec![
        GetCase {
            label: "existing booking",
            booking_id: "1",
            headers: Some(fixtures::json_accept()),
            expected_status: 200,
            known_discrepancy: false,
        },
        GetCase {
            label: "zero id",
            booking_id: "0",
            headers: Some(fixtures::json_accept()),
            expected_status: 404,
            known_discrepancy: false,
        },
        GetCase {
            label: "negative id",
            booking_id: "-1",
            headers: Some(fixtures::json_accept()),
            expected_status: 404,
            known_discrepancy: false,
        },
        GetCase {
            label: "non-numeric id",
            booking_id: "a",
            headers: Some(fixtures::json_accept()),
            expected_status: 404,
            known_discrepancy: false,
        },
        GetCase {
            label: "empty Accept",
            booking_id: "1",
            headers: Some(empty_header(ACCEPT)),
            expected_status: 418,
            known_discrepancy: false,
        },
        GetCase {
            label: "no Accept",
            booking_id: "1",
            headers: None,
            expected_status: 200,
            known_discrepancy: false,
        },
    ]
}

pub async fn run_get_case<T: Transport>(
    client: &BookerClient<T>,
    case: &GetCase,
) -> Result<(), ScenarioError> {
    let request = ApiRequest::new(Method::GET, booking_path(case.booking_id))
        .headers(case.headers.clone().unwrap_or_default());
    let response = client.execute(request).await?;

    let mut checks = Checks::default();
    checks.check(
        response.status == case.expected_status,
        format!("Request failed with status code {}", response.status),
    );
    if case.expected_status == 200 && response.status == 200 {
        // Non-negative price, boolean deposit and string dates are enforced by the schema
        let booking = response.parse::<BookingRecord>()?;
        checks.check(!booking.firstname.is_empty(), "Firstname is missing");
        checks.check(!booking.lastname.is_empty(), "Lastname is missing");
    }
    checks.finish()
}

// Create booking

#[derive(Debug, Clone)]
pub struct CreateCase {
    pub label: &'static str,
    pub headers: Option<HeaderMap>,
    pub body: Value,
    pub expected_status: u16,
    pub known_discrepancy: bool,
}

fn literal_booking() -> Value {
    json!(fixtures::booking_payload())
}

pub fn create_cases() -> Vec<CreateCase> {
    vec![
        CreateCase {
            label: "json headers",
            headers: Some(fixtures::json_exchange()),
            body: literal_booking(),
            expected_status: 200,
            known_discrepancy: true,
        },
        CreateCase {
            label: "text/plain Content-Type and Accept",
            headers: Some(plain_text_exchange()),
            body: literal_booking(),
            expected_status: 415,
            known_discrepancy: true,
        },
        CreateCase {
            label: "no headers",
            headers: None,
            body: literal_booking(),
            expected_status: 200,
            known_discrepancy: true,
        },
    ]
}

pub async fn run_create_case<T: Transport>(
    client: &BookerClient<T>,
    case: &CreateCase,
) -> Result<(), ScenarioError> {
    let request_data = CreateBookingRequest::validate(&case.body)?;
    let request = ApiRequest::new(Method::POST, "/booking")
        .headers(case.headers.clone().unwrap_or_default())
        .json(to_json(&request_data)?);
    let response = client.execute(request).await?;

    let mut checks = Checks::default();
    checks.check(
        response.status == case.expected_status,
        format!("Request failed with status code {}", response.status),
    );
    if case.expected_status == 200 && response.status == 200 {
        let created = response.parse::<CreatedBooking>()?;
        let record: BookingRecord = created.booking.into();
        for field in record.mismatches(&request_data) {
            checks.check(false, format!("Invalid {} in the response", field));
        }
    }
    checks.finish()
}

// Create then get

#[derive(Debug, Clone)]
pub struct RoundTripCase {
    pub label: &'static str,
    pub booking: CreateBookingRequest,
    pub known_discrepancy: bool,
}

pub fn round_trip_cases() -> Vec<RoundTripCase> {
    vec![
        RoundTripCase {
            label: "default booking",
            booking: fixtures::booking_payload(),
            known_discrepancy: false,
        },
        RoundTripCase {
            label: "unpaid booking without extras",
            booking: BookingBuilder::default()
                .firstname("Sally")
                .lastname("Smith")
                .totalprice(0)
                .depositpaid(false)
                .dates("2024-03-01", "2024-03-04")
                .additionalneeds("")
                .build(),
            known_discrepancy: false,
        },
    ]
}

pub async fn run_round_trip_case<T: Transport>(
    client: &BookerClient<T>,
    case: &RoundTripCase,
) -> Result<(), ScenarioError> {
    let created = client.create_booking(&case.booking).await?;
    let fetched = client.get_booking(created.bookingid).await?;

    let mut checks = Checks::default();
    for field in fetched.mismatches(&case.booking) {
        checks.check(
            false,
            format!("{} differs after reading booking {}", field, created.bookingid),
        );
    }
    checks.finish()
}

// Runner

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseOutcome {
    Passed,
    Failed(String),
    // Failed, but the case documents a known discrepancy
    ExpectedFailure(String),
    UnexpectedPass,
}

#[derive(Debug, Clone)]
pub struct CaseResult {
    pub family: Family,
    pub label: String,
    pub outcome: CaseOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub results: Vec<CaseResult>,
}

impl RunReport {
    fn count(&self, predicate: impl Fn(&CaseOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| predicate(&r.outcome)).count()
    }

    pub fn passed(&self) -> usize {
        self.count(|o| *o == CaseOutcome::Passed)
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, CaseOutcome::Failed(_)))
    }

    pub fn expected_failures(&self) -> usize {
        self.count(|o| matches!(o, CaseOutcome::ExpectedFailure(_)))
    }

    pub fn unexpected_passes(&self) -> usize {
        self.count(|o| *o == CaseOutcome::UnexpectedPass)
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn failures(&self) -> Vec<&CaseResult> {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, CaseOutcome::Failed(_)))
            .collect()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} passed, {} failed, {} xfailed, {} xpassed",
            self.passed(),
            self.failed(),
            self.expected_failures(),
            self.unexpected_passes()
        )
    }
}

pub struct ScenarioRunner<T: Transport> {
    client: BookerClient<T>,
}

impl<T: Transport> ScenarioRunner<T> {
    pub fn new(client: BookerClient<T>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &BookerClient<T> {
        &self.client
    }

    // Families run sequentially, in catalog order, one call at a time
    pub async fn run(&self, categories: &[Category]) -> RunReport {
        let mut report = RunReport::default();
        let client = &self.client;

        if categories.contains(&Category::Auth) {
            for case in auth_cases() {
                let result = run_auth_case(client, &case).await;
                record(
                    &mut report,
                    Family::Authenticate,
                    case.label,
                    case.known_discrepancy,
                    result,
                );
            }
        }
        if categories.contains(&Category::RequiresToken) {
            for case in delete_cases() {
                let result = run_delete_case(client, &case).await;
                record(
                    &mut report,
                    Family::DeleteBooking,
                    case.label,
                    case.known_discrepancy,
                    result,
                );
            }
        }
        if categories.contains(&Category::WithoutToken) {
            for case in get_cases() {
                let result = run_get_case(client, &case).await;
                record(
                    &mut report,
                    Family::GetBooking,
                    case.label,
                    case.known_discrepancy,
                    result,
                );
            }
            for case in create_cases() {
                let result = run_create_case(client, &case).await;
                record(
                    &mut report,
                    Family::CreateBooking,
                    case.label,
                    case.known_discrepancy,
                    result,
                );
            }
            for case in round_trip_cases() {
                let result = run_round_trip_case(client, &case).await;
                record(
                    &mut report,
                    Family::CreateThenGet,
                    case.label,
                    case.known_discrepancy,
                    result,
                );
            }
        }

        info!(summary = %report.summary(), "scenario run finished");
        report
    }
}

// A case flagged as a known discrepancy inverts the meaning of its result
fn record(
    report: &mut RunReport,
    family: Family,
    label: &str,
    known_discrepancy: bool,
    result: Result<(), ScenarioError>,
) {
    let outcome = match (result, known_discrepancy) {
        (Ok(()), false) => CaseOutcome::Passed,
        (Ok(()), true) => {
            warn!(%family, label, "known discrepancy passed unexpectedly");
            CaseOutcome::UnexpectedPass
        }
        (Err(e), true) => CaseOutcome::ExpectedFailure(e.to_string()),
        (Err(e), false) => {
            warn!(%family, label, error = %e, "scenario failed");
            CaseOutcome::Failed(e.to_string())
        }
    };
    info!(%family, label, ?outcome, "scenario finished");
    report.results.push(CaseResult {
        family,
        label: label.to_string(),
        outcome,
    });
}
