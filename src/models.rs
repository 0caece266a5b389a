use crate::schema::{FieldReader, Schema, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

// Deserializing goes through the schema, so serde cannot build an unvalidated record
macro_rules! validated_deserialize {
    ($($model:ty),+) => {
        $(
            impl TryFrom<Value> for $model {
                type Error = ValidationError;

                fn try_from(value: Value) -> Result<Self, Self::Error> {
                    <$model as Schema>::validate(&value)
                }
            }
        )+
    };
}

validated_deserialize!(
    Credentials,
    AuthToken,
    DateRange,
    BookingRecord,
    CreateBookingRequest,
    CreatedBooking
);

// Body of POST /auth
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "Value")]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Result<Self, ValidationError> {
        Self::validate(&json!({ "username": username, "password": password }))
    }
}

impl Schema for Credentials {
    const NAME: &'static str = "Credentials";

    fn read(reader: &mut FieldReader<'_>) -> Option<Self> {
        let username = reader.non_empty_string("username");
        let password = reader.non_empty_string("password");
        Some(Self {
            username: username?,
            password: password?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "Value")]
pub struct AuthToken {
    pub token: String,
}

impl Schema for AuthToken {
    const NAME: &'static str = "AuthToken";

    fn read(reader: &mut FieldReader<'_>) -> Option<Self> {
        Some(Self {
            token: reader.string("token")?,
        })
    }
}

// Stay dates, kept as the ISO strings the service returns
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "Value")]
pub struct DateRange {
    pub checkin: String,
    pub checkout: String,
}

impl Schema for DateRange {
    const NAME: &'static str = "DateRange";

    fn read(reader: &mut FieldReader<'_>) -> Option<Self> {
        let checkin = reader.string("checkin");
        let checkout = reader.string("checkout");
        Some(Self {
            checkin: checkin?,
            checkout: checkout?,
        })
    }
}

// Booking as returned by GET /booking/{id}
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "Value")]
pub struct BookingRecord {
    pub firstname: String,
    pub lastname: String,
    pub totalprice: u64,
    pub depositpaid: bool,
    pub bookingdates: DateRange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additionalneeds: Option<String>,
}

impl BookingRecord {
    // Names of the fields that differ from the submitted payload
    pub fn mismatches(&self, submitted: &CreateBookingRequest) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.firstname != submitted.firstname {
            fields.push("firstname");
        }
        if self.lastname != submitted.lastname {
            fields.push("lastname");
        }
        if self.totalprice != submitted.totalprice {
            fields.push("totalprice");
        }
        if self.depositpaid != submitted.depositpaid {
            fields.push("depositpaid");
        }
        if self.bookingdates != submitted.bookingdates {
            fields.push("bookingdates");
        }
        if self.additionalneeds.as_deref() != Some(submitted.additionalneeds.as_str()) {
            fields.push("additionalneeds");
        }
        fields
    }
}

impl Schema for BookingRecord {
    const NAME: &'static str = "BookingRecord";

    fn read(reader: &mut FieldReader<'_>) -> Option<Self> {
        let firstname = reader.string("firstname");
        let lastname = reader.string("lastname");
        let totalprice = reader.non_negative("totalprice");
        let depositpaid = reader.boolean("depositpaid");
        let bookingdates = reader.nested::<DateRange>("bookingdates");
        let additionalneeds = reader.optional_string("additionalneeds");
        Some(Self {
            firstname: firstname?,
            lastname: lastname?,
            totalprice: totalprice?,
            depositpaid: depositpaid?,
            bookingdates: bookingdates?,
            additionalneeds: additionalneeds?,
        })
    }
}

// Body of POST /booking; unlike a read, additionalneeds is mandatory here
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "Value")]
pub struct CreateBookingRequest {
    pub firstname: String,
    pub lastname: String,
    pub totalprice: u64,
    pub depositpaid: bool,
    pub bookingdates: DateRange,
    pub additionalneeds: String,
}

impl From<CreateBookingRequest> for BookingRecord {
    fn from(item: CreateBookingRequest) -> Self {
        BookingRecord {
            firstname: item.firstname,
            lastname: item.lastname,
            totalprice: item.totalprice,
            depositpaid: item.depositpaid,
            bookingdates: item.bookingdates,
            additionalneeds: Some(item.additionalneeds),
        }
    }
}

impl Schema for CreateBookingRequest {
    const NAME: &'static str = "CreateBookingRequest";

    fn read(reader: &mut FieldReader<'_>) -> Option<Self> {
        let firstname = reader.string("firstname");
        let lastname = reader.string("lastname");
        let totalprice = reader.non_negative("totalprice");
        let depositpaid = reader.boolean("depositpaid");
        let bookingdates = reader.nested::<DateRange>("bookingdates");
        let additionalneeds = reader.string("additionalneeds");
        Some(Self {
            firstname: firstname?,
            lastname: lastname?,
            totalprice: totalprice?,
            depositpaid: depositpaid?,
            bookingdates: bookingdates?,
            additionalneeds: additionalneeds?,
        })
    }
}

// Response of POST /booking
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "Value")]
pub struct CreatedBooking {
    pub bookingid: i64,
    pub booking: CreateBookingRequest,
}

impl Schema for CreatedBooking {
    const NAME: &'static str = "CreatedBooking";

    fn read(reader: &mut FieldReader<'_>) -> Option<Self> {
        let bookingid = reader.integer("bookingid");
        let booking = reader.nested::<CreateBookingRequest>("booking");
        Some(Self {
            bookingid: bookingid?,
            booking: booking?,
        })
    }
}
