//! Resource IDs recovered from `Location` headers
//!
//! Creation endpoints answer with an empty body and point at the new resource
//! through the `Location` header, so the ID has to be parsed back out of it.

use lazy_static::lazy_static;
use regex::Regex;

use super::ClientError;

lazy_static! {
    static ref BOARD_ID: Regex = Regex::new(r"/boards/([^/.]+)").unwrap();
    static ref CARD_NUMBER: Regex = Regex::new(r"/cards/(\d+)").unwrap();
    static ref STEP_ID: Regex = Regex::new(r"/steps/([^/]+)\.json").unwrap();
}

fn capture<'a>(location: Option<&'a str>, pattern: &Regex) -> Result<&'a str, ClientError> {
    let location = location.ok_or(ClientError::MissingLocation)?;
    pattern
        .captures(location)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| ClientError::LocationParse {
            location: location.to_string(),
        })
}

/// Board ID: the path segment after `/boards/`, up to a `/` or extension
pub fn board_id(location: Option<&str>) -> Result<String, ClientError> {
    capture(location, &BOARD_ID).map(str::to_string)
}

/// Card number: the digits after `/cards/`, which must form a positive integer
pub fn card_number(location: Option<&str>) -> Result<u64, ClientError> {
    let digits = capture(location, &CARD_NUMBER)?;
    match digits.parse::<u64>() {
        Ok(number) if number > 0 => Ok(number),
        _ => Err(ClientError::LocationParse {
            location: location.unwrap_or_default().to_string(),
        }),
    }
}

/// Step ID: the segment after `/steps/` that precedes `.json`
pub fn step_id(location: Option<&str>) -> Result<String, ClientError> {
    capture(location, &STEP_ID).map(str::to_string)
}
