// Named test data with override hooks
// Every call returns a fresh value, so cases never share state through fixtures

use crate::client::JSON;
use crate::models::{CreateBookingRequest, Credentials, DateRange};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "password123";

pub fn admin_credentials() -> Credentials {
    Credentials {
        username: ADMIN_USERNAME.to_string(),
        password: ADMIN_PASSWORD.to_string(),
    }
}

pub fn booking_payload() -> CreateBookingRequest {
    BookingBuilder::default().build()
}

pub fn json_content() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON));
    headers
}

pub fn json_accept() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(JSON));
    headers
}

pub fn json_exchange() -> HeaderMap {
    let mut headers = json_content();
    headers.insert(ACCEPT, HeaderValue::from_static(JSON));
    headers
}

// Builder over the default "Jim Brown" booking
#[derive(Debug, Clone)]
pub struct BookingBuilder {
    booking: CreateBookingRequest,
}

impl Default for BookingBuilder {
    fn default() -> Self {
        Self {
            booking: CreateBookingRequest {
                firstname: "Jim".to_string(),
                lastname: "Brown".to_string(),
                totalprice: 111,
                depositpaid: true,
                bookingdates: DateRange {
                    checkin: "2018-01-01".to_string(),
                    checkout: "2019-01-01".to_string(),
                },
                additionalneeds: "Breakfast".to_string(),
            },
        }
    }
}

impl BookingBuilder {
    pub fn firstname(mut self, firstname: &str) -> Self {
        self.booking.firstname = firstname.to_string();
        self
    }

    pub fn lastname(mut self, lastname: &str) -> Self {
        self.booking.lastname = lastname.to_string();
        self
    }

    pub fn totalprice(mut self, totalprice: u64) -> Self {
        self.booking.totalprice = totalprice;
        self
    }

    pub fn depositpaid(mut self, depositpaid: bool) -> Self {
        self.booking.depositpaid = depositpaid;
        self
    }

    pub fn dates(mut self, checkin: &str, checkout: &str) -> Self {
        self.booking.bookingdates = DateRange {
            checkin: checkin.to_string(),
            checkout: checkout.to_string(),
        };
        self
    }

    pub fn additionalneeds(mut self, needs: &str) -> Self {
        self.booking.additionalneeds = needs.to_string();
        self
    }

    pub fn build(self) -> CreateBookingRequest {
        self.booking
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_leave_other_fields_alone() {
        let booking = BookingBuilder::default()
            .firstname("Sally")
            .totalprice(0)
            .dates("2024-02-01", "2024-02-03")
            .build();
        assert_eq!(booking.firstname, "Sally");
        assert_eq!(booking.lastname, "Brown");
        assert_eq!(booking.totalprice, 0);
        assert_eq!(booking.bookingdates.checkout, "2024-02-03");
        assert_eq!(booking.additionalneeds, "Breakfast");
        assert_eq!(booking_payload().firstname, "Jim");
    }

    #[test]
    fn test_header_sets() {
        assert_eq!(json_exchange().get(ACCEPT).unwrap(), JSON);
        assert_eq!(json_exchange().get(CONTENT_TYPE).unwrap(), JSON);
        assert!(!json_accept().contains_key(CONTENT_TYPE));
    }
}
