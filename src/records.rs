//! Card records as returned by the content API's GraphQL endpoint.
//!
//! ```text
//! { "data": { "wegCardCollection": [ { "name", "sections", "images", "origin" } ] } }
//! ```
//!
//! `sections` and `images` are JSON documents encoded as strings and are parsed
//! separately.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, WegError};
use crate::sections::{parse_sections, Section};

/// Prefix for image paths the API returns relative to its own host.
pub const ODIN_BASE_URL: &str = "https://odin.tradoc.army.mil";

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WegCardCollectionData {
    #[serde(rename = "wegCardCollection")]
    pub weg_card_collection: Option<Vec<WegCardRecord>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WegCardRecord {
    pub name: Option<String>,
    #[serde(rename = "sections")]
    pub sections_raw: Option<String>,
    #[serde(rename = "images")]
    pub images_raw: Option<String>,
    #[serde(default)]
    pub origin: Option<Vec<OriginCategory>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginCategory {
    pub name: Option<String>,
    #[serde(rename = "velocityVar")]
    pub velocity_var: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebImage {
    pub url: Option<String>,
}

impl WegCardRecord {
    pub fn sections(&self) -> Vec<Section> {
        parse_sections(self.sections_raw.as_deref())
    }

    pub fn images(&self) -> Vec<WebImage> {
        parse_images(self.images_raw.as_deref())
    }

    /// Absolute URL of the first image, or `""`.
    pub fn first_image_url(&self) -> String {
        self.images()
            .first()
            .map(|img| absolute_url(img.url.as_deref()))
            .unwrap_or_default()
    }

    pub fn origin_names(&self) -> Vec<&str> {
        self.origin
            .iter()
            .flatten()
            .filter_map(|o| o.name.as_deref())
            .collect()
    }
}

/// Parses a GraphQL card-collection response body. A missing `data` or collection
/// is an empty result; a body that is not JSON is an error.
pub fn parse_card_collection(body: &str) -> Result<Vec<WegCardRecord>> {
    let response: GraphQlResponse<WegCardCollectionData> =
        serde_json::from_str(body).map_err(|e| WegError::MalformedInput {
            what: "card collection response",
            details: e.to_string(),
        })?;
    Ok(response
        .data
        .and_then(|d| d.weg_card_collection)
        .unwrap_or_default())
}

/// Parses the raw `images` payload; blank or malformed input yields no images.
pub fn parse_images(raw: Option<&str>) -> Vec<WebImage> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Vec::new();
    };
    match serde_json::from_str::<Option<Vec<WebImage>>>(raw) {
        Ok(images) => images.unwrap_or_default(),
        Err(err) => {
            warn!(error = %err, "treating malformed images payload as empty");
            Vec::new()
        }
    }
}

/// Makes an image path absolute. Values already starting with `http` pass through.
pub fn absolute_url(relative: Option<&str>) -> String {
    match relative.map(str::trim) {
        None | Some("") => String::new(),
        Some(url) if url.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("http")) => url.to_string(),
        Some(url) => format!("{ODIN_BASE_URL}{url}"),
    }
}
