// In-memory stand-in for the remote booking service
// Mirrors the status codes and bodies observed on the live service, quirks included

use crate::client::ApiError;
use crate::fixtures::{ADMIN_PASSWORD, ADMIN_USERNAME};
use crate::models::CreateBookingRequest;
use crate::schema::Schema;
use crate::transport::{header_str, ApiRequest, ApiResponse, Transport};
use async_trait::async_trait;
use parking_lot::Mutex;
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderName, ACCEPT, CONTENT_TYPE, COOKIE};
use reqwest::Method;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
struct State {
    tokens: HashSet<String>,
    bookings: HashMap<i64, Value>,
    next_id: i64,
    requests: Vec<ApiRequest>,
}

type Rewrite = Box<dyn Fn(&ApiRequest, &mut ApiResponse) + Send + Sync>;

pub struct MockBooker {
    state: Mutex<State>,
    fail_next_requests: AtomicUsize,
    rewrite: Mutex<Option<Rewrite>>,
}

impl MockBooker {
    // Starts with booking 1 present, like the public instance
    pub fn new() -> Self {
        let mut state = State {
            next_id: 2,
            ..Default::default()
        };
        state.bookings.insert(
            1,
            json!({
                "firstname": "Sally",
                "lastname": "Brown",
                "totalprice": 539,
                "depositpaid": false,
                "bookingdates": {"checkin": "2020-06-22", "checkout": "2021-07-19"},
                "additionalneeds": "Breakfast"
            }),
        );
        Self {
            state: Mutex::new(state),
            fail_next_requests: AtomicUsize::new(0),
            rewrite: Mutex::new(None),
        }
    }

    // Stores a raw booking as-is, valid or not
    pub fn insert_booking(&self, id: i64, booking: Value) {
        self.state.lock().bookings.insert(id, booking);
    }

    // Applied to every response before it is returned
    pub fn rewrite_responses<F>(&self, rewrite: F)
    where
        F: Fn(&ApiRequest, &mut ApiResponse) + Send + Sync + 'static,
    {
        *self.rewrite.lock() = Some(Box::new(rewrite));
    }

    pub fn fail_next_requests(&self, count: usize) {
        self.fail_next_requests.store(count, Ordering::SeqCst);
    }

    pub fn is_token_valid(&self, token: &str) -> bool {
        self.state.lock().tokens.contains(token)
    }

    pub fn booking_count(&self) -> usize {
        self.state.lock().bookings.len()
    }

    pub fn request_count(&self) -> usize {
        self.state.lock().requests.len()
    }

    pub fn last_request(&self) -> Option<ApiRequest> {
        self.state.lock().requests.last().cloned()
    }

    fn handle(&self, request: &ApiRequest) -> ApiResponse {
        let segments: Vec<&str> = request
            .path
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        let method = &request.method;
        match segments.as_slice() {
            ["auth"] if *method == Method::POST => self.auth(request),
            ["booking"] if *method == Method::POST => self.create(request),
            ["booking", id] if *method == Method::GET => self.get(request, id),
            ["booking", id] if *method == Method::DELETE => self.delete(request, id),
            _ => ApiResponse::new(404, "Not Found"),
        }
    }

    fn auth(&self, request: &ApiRequest) -> ApiResponse {
        // Bodies without a JSON content type are never parsed
        let body = if is_json(&request.headers, CONTENT_TYPE) {
            request.body.clone().unwrap_or(Value::Null)
        } else {
            Value::Null
        };
        let username = body.get("username").and_then(|v| v.as_str());
        let password = body.get("password").and_then(|v| v.as_str());

        if username == Some(ADMIN_USERNAME) && password == Some(ADMIN_PASSWORD) {
            let token: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(15)
                .map(char::from)
                .collect();
            self.state.lock().tokens.insert(token.clone());
            ApiResponse::new(200, json!({ "token": token }).to_string())
        } else {
            ApiResponse::new(200, json!({ "reason": "Bad credentials" }).to_string())
        }
    }

    fn create(&self, request: &ApiRequest) -> ApiResponse {
        if !is_json(&request.headers, CONTENT_TYPE) {
            return ApiResponse::new(500, "Internal Server Error");
        }
        let booking = match request
            .body
            .as_ref()
            .map(CreateBookingRequest::validate)
        {
            Some(Ok(booking)) => booking,
            _ => return ApiResponse::new(500, "Internal Server Error"),
        };

        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        let stored = match serde_json::to_value(&booking) {
            Ok(stored) => stored,
            Err(_) => return ApiResponse::new(500, "Internal Server Error"),
        };
        state.bookings.insert(id, stored.clone());
        ApiResponse::new(
            200,
            json!({ "bookingid": id, "booking": stored }).to_string(),
        )
    }

    fn get(&self, request: &ApiRequest, id: &str) -> ApiResponse {
        if let Some(accept) = request.headers.get(ACCEPT) {
            let accept = accept.to_str().unwrap_or("");
            if !accepts_json(accept) {
                return ApiResponse::new(418, "I'm a Teapot");
            }
        }
        let state = self.state.lock();
        match id.parse::<i64>().ok().and_then(|id| state.bookings.get(&id)) {
            Some(booking) => ApiResponse::new(200, booking.to_string()),
            None => ApiResponse::new(404, "Not Found"),
        }
    }

    fn delete(&self, request: &ApiRequest, id: &str) -> ApiResponse {
        let mut state = self.state.lock();
        let authorised = header_str(&request.headers, COOKIE)
            .and_then(cookie_token)
            .map_or(false, |token| state.tokens.contains(token));
        if !authorised {
            return ApiResponse::new(403, "Forbidden");
        }
        match id.parse::<i64>().ok().and_then(|id| state.bookings.remove(&id)) {
            Some(_) => ApiResponse::new(201, "Created"),
            None => ApiResponse::new(405, "Method Not Allowed"),
        }
    }
}

impl Default for MockBooker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockBooker {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        self.state.lock().requests.push(request.clone());

        let pending = self.fail_next_requests.load(Ordering::SeqCst);
        if pending > 0 {
            self.fail_next_requests.store(pending - 1, Ordering::SeqCst);
            return Err(ApiError::NetworkError("connection reset".to_string()));
        }

        let mut response = self.handle(request);
        if let Some(rewrite) = self.rewrite.lock().as_ref() {
            rewrite(request, &mut response);
        }
        Ok(response)
    }
}

fn is_json(headers: &HeaderMap, name: HeaderName) -> bool {
    header_str(headers, name).map_or(false, |v| v.trim().starts_with("application/json"))
}

fn accepts_json(accept: &str) -> bool {
    accept
        .split(',')
        .map(|part| part.split(';').next().unwrap_or("").trim())
        .any(|media| media == "application/json" || media == "*/*" || media == "application/*")
}

fn cookie_token(cookie: &str) -> Option<&str> {
    cookie
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix("token="))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("application/json", true; "#1 json")]
    #[test_case("*/*", true; "#2 wildcard")]
    #[test_case("text/html, application/json;q=0.9", true; "#3 list")]
    #[test_case("", false; "#4 empty")]
    #[test_case("text/plain", false; "#5 plain")]
    fn test_accepts_json(accept: &str, expected: bool) {
        assert_eq!(accepts_json(accept), expected);
    }

    #[test]
    fn test_cookie_token() {
        assert_eq!(cookie_token("token=abc"), Some("abc"));
        assert_eq!(cookie_token("a=1; token=xyz"), Some("xyz"));
        assert_eq!(cookie_token("session=1"), None);
    }

    #[tokio::test]
    async fn test_failures_are_injected_then_cleared() {
        let mock = MockBooker::new();
        mock.fail_next_requests(1);
        let request = ApiRequest::new(Method::GET, "/booking/1");
        assert!(matches!(
            mock.send(&request).await,
            Err(ApiError::NetworkError(_))
        ));
        assert_eq!(mock.send(&request).await.unwrap().status, 200);
        assert_eq!(mock.request_count(), 2);
    }

    #[tokio::test]
    async fn test_rewrite_and_raw_bookings() {
        let mock = MockBooker::new();
        mock.insert_booking(7, json!({"firstname": ""}));
        mock.rewrite_responses(|_, response| response.status += 1);

        let response = mock
            .send(&ApiRequest::new(Method::GET, "/booking/7"))
            .await
            .unwrap();
        assert_eq!(response.status, 201);
        assert_eq!(response.body, r#"{"firstname":""}"#);
    }
}
