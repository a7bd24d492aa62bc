//! BattleScribe document readers
//!
//! Each reader scans the document for its root element (case-insensitive tag
//! match) and lifts a fixed attribute set into the typed record. Nothing
//! below the root element is inspected.

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::{Error, Result};
use crate::files::model::{Catalogue, GameSystem, Roster};

pub const CATALOGUE_TAG: &str = "catalogue";
pub const GAME_SYSTEM_TAG: &str = "gameSystem";
pub const ROSTER_TAG: &str = "roster";

const ID_ATTRIBUTE: &str = "id";
const NAME_ATTRIBUTE: &str = "name";
const REVISION_ATTRIBUTE: &str = "revision";
const BATTLESCRIBE_VERSION_ATTRIBUTE: &str = "battleScribeVersion";
const AUTHOR_NAME_ATTRIBUTE: &str = "authorName";
const AUTHOR_CONTACT_ATTRIBUTE: &str = "authorContact";
const AUTHOR_URL_ATTRIBUTE: &str = "authorUrl";
const GAME_SYSTEM_ID_ATTRIBUTE: &str = "gameSystemId";
const GAME_SYSTEM_NAME_ATTRIBUTE: &str = "gameSystemName";
const GAME_SYSTEM_REVISION_ATTRIBUTE: &str = "gameSystemRevision";
const POINTS_ATTRIBUTE: &str = "points";
const POINTS_LIMIT_ATTRIBUTE: &str = "pointsLimit";
const DESCRIPTION_ATTRIBUTE: &str = "description";

fn malformed(reason: impl std::fmt::Display) -> Error {
    Error::MalformedDataFile(reason.to_string())
}

/// Parse up to the first start element, validate its tag and return its
/// attributes.
fn root_attributes(data: &[u8], expected_tag: &str) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_reader(data);
    let mut buf = Vec::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| malformed(format!("XML parse error: {e}")))?;

        let element = match event {
            Event::Start(e) => e,
            Event::Empty(e) => e,
            Event::Eof => return Err(malformed("document has no root element")),
            _ => continue,
        };

        let tag = String::from_utf8_lossy(element.name().as_ref()).into_owned();
        if !tag.eq_ignore_ascii_case(expected_tag) {
            return Err(malformed(format!(
                "expected root element <{expected_tag}>, found <{tag}>"
            )));
        }

        let mut attributes = HashMap::new();
        for attribute in element.attributes() {
            let attribute = attribute.map_err(|e| malformed(format!("bad attribute: {e}")))?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute
                .unescape_value()
                .map_err(|e| malformed(format!("bad attribute value: {e}")))?
                .into_owned();
            attributes.insert(key, value);
        }
        return Ok(attributes);
    }
}

fn required<'a>(attributes: &'a HashMap<String, String>, key: &str) -> Result<&'a str> {
    attributes
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| malformed(format!("missing required attribute {key}")))
}

fn required_i32(attributes: &HashMap<String, String>, key: &str) -> Result<i32> {
    required(attributes, key)?
        .parse()
        .map_err(|e| malformed(format!("attribute {key} is not an integer: {e}")))
}

fn required_f64(attributes: &HashMap<String, String>, key: &str) -> Result<f64> {
    required(attributes, key)?
        .parse()
        .map_err(|e| malformed(format!("attribute {key} is not a number: {e}")))
}

fn optional(attributes: &HashMap<String, String>, key: &str) -> String {
    attributes.get(key).cloned().unwrap_or_default()
}

fn optional_i32(attributes: &HashMap<String, String>, key: &str) -> Result<i32> {
    match attributes.get(key) {
        Some(value) => value
            .parse()
            .map_err(|e| malformed(format!("attribute {key} is not an integer: {e}"))),
        None => Ok(0),
    }
}

pub fn read_catalogue(data: &[u8]) -> Result<Catalogue> {
    let attributes = root_attributes(data, CATALOGUE_TAG)?;
    Ok(Catalogue {
        id: required(&attributes, ID_ATTRIBUTE)?.to_string(),
        name: required(&attributes, NAME_ATTRIBUTE)?.to_string(),
        revision: required_i32(&attributes, REVISION_ATTRIBUTE)?,
        battle_scribe_version: required(&attributes, BATTLESCRIBE_VERSION_ATTRIBUTE)?.to_string(),
        game_system_id: required(&attributes, GAME_SYSTEM_ID_ATTRIBUTE)?.to_string(),
        game_system_revision: optional_i32(&attributes, GAME_SYSTEM_REVISION_ATTRIBUTE)?,
        author_name: required(&attributes, AUTHOR_NAME_ATTRIBUTE)?.to_string(),
        author_contact: required(&attributes, AUTHOR_CONTACT_ATTRIBUTE)?.to_string(),
        author_url: required(&attributes, AUTHOR_URL_ATTRIBUTE)?.to_string(),
    })
}

pub fn read_game_system(data: &[u8]) -> Result<GameSystem> {
    let attributes = root_attributes(data, GAME_SYSTEM_TAG)?;
    Ok(GameSystem {
        id: required(&attributes, ID_ATTRIBUTE)?.to_string(),
        name: required(&attributes, NAME_ATTRIBUTE)?.to_string(),
        revision: required_i32(&attributes, REVISION_ATTRIBUTE)?,
        battle_scribe_version: required(&attributes, BATTLESCRIBE_VERSION_ATTRIBUTE)?.to_string(),
        author_name: required(&attributes, AUTHOR_NAME_ATTRIBUTE)?.to_string(),
        author_contact: required(&attributes, AUTHOR_CONTACT_ATTRIBUTE)?.to_string(),
        author_url: required(&attributes, AUTHOR_URL_ATTRIBUTE)?.to_string(),
    })
}

pub fn read_roster(data: &[u8]) -> Result<Roster> {
    let attributes = root_attributes(data, ROSTER_TAG)?;
    Ok(Roster {
        id: String::new(),
        name: required(&attributes, NAME_ATTRIBUTE)?.to_string(),
        description: required(&attributes, DESCRIPTION_ATTRIBUTE)?.to_string(),
        battle_scribe_version: required(&attributes, BATTLESCRIBE_VERSION_ATTRIBUTE)?.to_string(),
        points: required_f64(&attributes, POINTS_ATTRIBUTE)?,
        points_limit: required_f64(&attributes, POINTS_LIMIT_ATTRIBUTE)?,
        game_system_id: required(&attributes, GAME_SYSTEM_ID_ATTRIBUTE)?.to_string(),
        game_system_name: optional(&attributes, GAME_SYSTEM_NAME_ATTRIBUTE),
        game_system_revision: optional_i32(&attributes, GAME_SYSTEM_REVISION_ATTRIBUTE)?,
        author_name: String::new(),
        author_contact: String::new(),
        author_url: String::new(),
    })
}
