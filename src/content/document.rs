//! Document models and normalization
//!
//! `RawDocument` mirrors the wire shape of the content API loosely enough
//! that any published document deserializes; `Document` is the stable shape
//! the pages consume. The only way to obtain a `Document` is the explicit
//! normalization step, which rejects payloads missing required fields
//! instead of letting them crash rendering later.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::richtext::RichTextNode;

/// Wire format of the `first_publication_date` fields ("+0000" offsets)
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// A document as returned by the content API, before normalization.
/// Unknown fields are dropped on deserialization.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDocument {
    /// Backend-internal identity, used for neighbor queries
    pub id: String,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub first_publication_date: Option<String>,
    #[serde(default)]
    pub last_publication_date: Option<String>,
    #[serde(default)]
    pub data: RawData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawData {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub banner: Option<RawBanner>,
    #[serde(default)]
    pub content: Vec<RawBlock>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBanner {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBlock {
    #[serde(default)]
    pub heading: String,
    /// Body arrays may be absent on the wire
    #[serde(default)]
    pub body: Vec<RichTextNode>,
}

/// A normalized article document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub uid: String,
    pub first_publication_date: DateTime<Utc>,
    pub last_publication_date: DateTime<Utc>,
    pub data: DocumentData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentData {
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub banner: Banner,
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Banner {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentBlock {
    pub heading: String,
    pub body: Vec<RichTextNode>,
}

/// A neighbor document reference for previous/next navigation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavDoc {
    pub uid: String,
    pub title: String,
}

impl NavDoc {
    /// Build a navigation reference from a raw neighbor result; a result
    /// missing either field renders as no neighbor at all
    pub fn from_raw(raw: &RawDocument) -> Option<Self> {
        Some(Self {
            uid: raw.uid.clone()?,
            title: raw.data.title.clone()?,
        })
    }
}

/// Normalization failure: the backend payload is missing or mangling a
/// field the pages require
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("document `{id}` is missing required field `{field}`")]
    MissingField { id: String, field: &'static str },

    #[error("document `{id}` has an unparsable `{field}` timestamp")]
    InvalidTimestamp {
        id: String,
        field: &'static str,
        #[source]
        source: chrono::ParseError,
    },
}

impl Document {
    /// Normalize a raw backend document.
    ///
    /// Keeps exactly the attributes the pages consume; everything else in
    /// the payload is discarded. Body arrays are copied, never aliased.
    pub fn from_raw(raw: &RawDocument) -> Result<Self, NormalizeError> {
        let uid = require(&raw.id, raw.uid.as_deref(), "uid")?.to_string();
        let first_publication_date =
            parse_timestamp(&raw.id, &raw.first_publication_date, "first_publication_date")?;
        let last_publication_date =
            parse_timestamp(&raw.id, &raw.last_publication_date, "last_publication_date")?;

        let title = require(&raw.id, raw.data.title.as_deref(), "data.title")?.to_string();
        let subtitle = require(&raw.id, raw.data.subtitle.as_deref(), "data.subtitle")?.to_string();
        let author = require(&raw.id, raw.data.author.as_deref(), "data.author")?.to_string();

        let banner_url = raw
            .data
            .banner
            .as_ref()
            .and_then(|b| b.url.as_deref())
            .ok_or(NormalizeError::MissingField {
                id: raw.id.clone(),
                field: "data.banner.url",
            })?
            .to_string();

        let content = raw
            .data
            .content
            .iter()
            .map(|block| ContentBlock {
                heading: block.heading.clone(),
                body: block.body.clone(),
            })
            .collect();

        Ok(Self {
            uid,
            first_publication_date,
            last_publication_date,
            data: DocumentData {
                title,
                subtitle,
                author,
                banner: Banner { url: banner_url },
                content,
            },
        })
    }

    /// Whether the document was edited after first publication
    pub fn edited(&self) -> bool {
        self.first_publication_date != self.last_publication_date
    }
}

fn require<'a>(
    id: &str,
    value: Option<&'a str>,
    field: &'static str,
) -> Result<&'a str, NormalizeError> {
    value.ok_or(NormalizeError::MissingField {
        id: id.to_string(),
        field,
    })
}

fn parse_timestamp(
    id: &str,
    value: &Option<String>,
    field: &'static str,
) -> Result<DateTime<Utc>, NormalizeError> {
    let value = value.as_deref().ok_or(NormalizeError::MissingField {
        id: id.to_string(),
        field,
    })?;
    DateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|source| NormalizeError::InvalidTimestamp {
            id: id.to_string(),
            field,
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn raw_json() -> serde_json::Value {
        json!({
            "id": "YA1a2b",
            "uid": "como-utilizar-hooks",
            "type": "post",
            "href": "https://example.cdn.prismic.io/api/v2/documents/YA1a2b",
            "tags": ["react"],
            "first_publication_date": "2021-03-15T19:25:28+0000",
            "last_publication_date": "2021-03-19T15:49:01+0000",
            "data": {
                "title": "Como utilizar Hooks",
                "subtitle": "Pensando em sincronização",
                "author": "Joseph Oliveira",
                "banner": { "url": "https://images.example.com/banner.png" },
                "content": [
                    {
                        "heading": "Proin et varius",
                        "body": [
                            { "type": "paragraph", "text": "hello world foo", "spans": [] }
                        ]
                    },
                    {
                        "heading": "Sem body no payload"
                    }
                ],
                "internal_only": { "not": "ours" }
            }
        })
    }

    #[test]
    fn test_normalization_keeps_only_the_stable_shape() {
        let raw: RawDocument = serde_json::from_value(raw_json()).unwrap();
        let doc = Document::from_raw(&raw).unwrap();

        assert_eq!(doc.uid, "como-utilizar-hooks");
        assert_eq!(
            doc.first_publication_date,
            Utc.with_ymd_and_hms(2021, 3, 15, 19, 25, 28).unwrap()
        );
        assert_eq!(doc.data.title, "Como utilizar Hooks");
        assert_eq!(doc.data.subtitle, "Pensando em sincronização");
        assert_eq!(doc.data.author, "Joseph Oliveira");
        assert_eq!(doc.data.banner.url, "https://images.example.com/banner.png");
        assert_eq!(doc.data.content.len(), 2);

        // the serialized output carries exactly the stable attributes
        let value = serde_json::to_value(&doc).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        assert_eq!(
            keys,
            ["uid", "first_publication_date", "last_publication_date", "data"]
        );
        let data_keys: Vec<&str> = value["data"]
            .as_object()
            .unwrap()
            .keys()
            .map(|k| k.as_str())
            .collect();
        assert_eq!(data_keys, ["title", "subtitle", "author", "banner", "content"]);
    }

    #[test]
    fn test_missing_body_array_is_empty() {
        let raw: RawDocument = serde_json::from_value(raw_json()).unwrap();
        let doc = Document::from_raw(&raw).unwrap();
        assert!(doc.data.content[1].body.is_empty());
    }

    #[test]
    fn test_missing_uid_is_a_typed_error() {
        let mut value = raw_json();
        value.as_object_mut().unwrap().remove("uid");
        let raw: RawDocument = serde_json::from_value(value).unwrap();
        match Document::from_raw(&raw) {
            Err(NormalizeError::MissingField { field, .. }) => assert_eq!(field, "uid"),
            other => panic!("expected MissingField, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_missing_banner_is_a_typed_error() {
        let mut value = raw_json();
        value["data"].as_object_mut().unwrap().remove("banner");
        let raw: RawDocument = serde_json::from_value(value).unwrap();
        match Document::from_raw(&raw) {
            Err(NormalizeError::MissingField { field, .. }) => {
                assert_eq!(field, "data.banner.url")
            }
            other => panic!("expected MissingField, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_bad_timestamp_is_a_typed_error() {
        let mut value = raw_json();
        value["first_publication_date"] = json!("yesterday");
        let raw: RawDocument = serde_json::from_value(value).unwrap();
        assert!(matches!(
            Document::from_raw(&raw),
            Err(NormalizeError::InvalidTimestamp {
                field: "first_publication_date",
                ..
            })
        ));
    }

    #[test]
    fn test_edited_marker_condition() {
        let raw: RawDocument = serde_json::from_value(raw_json()).unwrap();
        let doc = Document::from_raw(&raw).unwrap();
        assert!(doc.edited());

        let mut same = raw_json();
        same["last_publication_date"] = same["first_publication_date"].clone();
        let raw: RawDocument = serde_json::from_value(same).unwrap();
        let doc = Document::from_raw(&raw).unwrap();
        assert!(!doc.edited());
    }
}
