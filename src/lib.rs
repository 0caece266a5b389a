// Contract-test harness for the restful-booker booking API

pub mod client;
pub mod config;
pub mod fixtures;
pub mod models;
pub mod scenarios;
pub mod schema;
pub mod transport;

#[cfg(test)]
mod mock_server;

// Re-export key types for convenience
pub use client::{ApiError, BookerClient};
pub use config::{ClientConfig, ConfigError};
pub use models::{
    AuthToken, BookingRecord, CreateBookingRequest, CreatedBooking, Credentials, DateRange,
};
pub use scenarios::{CaseOutcome, Category, Family, RunReport, ScenarioError, ScenarioRunner};
pub use schema::{FieldError, FieldErrorKind, Schema, ValidationError};
pub use transport::{header_map, header_str, ApiRequest, ApiResponse, HttpTransport, Transport};
