//! Device identity carried in player User-Agent strings.
//!
//! SMIL players identify themselves with a header like
//! `ADAPI/2.0 (UUID:a8294bat-c28f-50af-f94o-800869af5854; NAME:Lobby) SK8855-ADAPI/2.0.5 (MODEL:XMP-330)`.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref UUID_TOKEN: Regex = Regex::new(r"UUID:\s*([^;)\s]+)").unwrap();
    static ref NAME_TOKEN: Regex = Regex::new(r"NAME:\s*([^;)]+)").unwrap();
    static ref MODEL_TOKEN: Regex = Regex::new(r"MODEL:\s*([^;)]+)").unwrap();
    static ref FIRMWARE_TOKEN: Regex = Regex::new(r"(\S+)\s*\(MODEL:").unwrap();
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub uuid: Option<String>,
    pub name: Option<String>,
    pub model: Option<String>,
    pub firmware: Option<String>,
}

fn capture(re: &Regex, user_agent: &str) -> Option<String> {
    re.captures(user_agent)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn parse_user_agent(user_agent: &str) -> DeviceIdentity {
    DeviceIdentity {
        uuid: capture(&UUID_TOKEN, user_agent),
        name: capture(&NAME_TOKEN, user_agent),
        model: capture(&MODEL_TOKEN, user_agent),
        firmware: capture(&FIRMWARE_TOKEN, user_agent),
    }
}
