use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::masonry::Tile;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("invalid JSON event: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid YAML event: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("photo {id}: aspectRatio must be a positive number, got {value}")]
    AspectRatio { id: Uuid, value: f64 },
    #[error("photo {0} appears more than once")]
    DuplicatePhoto(Uuid),
    #[error("end_at {end_at} is earlier than start_at {start_at}")]
    EndBeforeStart {
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
    },
}

/// Camera metadata as extracted at upload time. Every field is optional since
/// phones and scanners report wildly different subsets.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Exif {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposure_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub f_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photographic_sensitivity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposure_bias_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focal_length: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focal_length_in_35mm_film: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lens_make: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lens_model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gps_latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gps_longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gps_altitude: Option<f64>,
}

fn with_unit(value: &str, prefix: &str, suffix: &str) -> String {
    let value = value.trim();
    let value = value.strip_prefix(prefix).unwrap_or(value);
    let value = value.strip_suffix(suffix).unwrap_or(value);
    format!("{prefix}{value}{suffix}")
}

impl Exif {
    /// One-line camera summary, e.g. `FUJIFILM X-T4 · 23mm · f/2 · 1/250s · ISO 160`.
    pub fn summary(&self) -> Option<String> {
        let mut parts = vec![];
        match (&self.make, &self.model) {
            (Some(make), Some(model)) if model.starts_with(make.as_str()) => {
                parts.push(model.clone())
            }
            (Some(make), Some(model)) => parts.push(format!("{make} {model}")),
            (Some(single), None) | (None, Some(single)) => parts.push(single.clone()),
            (None, None) => (),
        }
        if let Some(lens) = &self.lens_model {
            parts.push(lens.clone());
        }
        if let Some(focal_length) = &self.focal_length {
            parts.push(with_unit(focal_length, "", "mm"));
        }
        if let Some(f_number) = &self.f_number {
            parts.push(with_unit(f_number, "f/", ""));
        }
        if let Some(exposure_time) = &self.exposure_time {
            parts.push(with_unit(exposure_time, "", "s"));
        }
        if let Some(iso) = &self.photographic_sensitivity {
            parts.push(with_unit(iso, "ISO ", ""));
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" · "))
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: Uuid,
    #[serde(rename = "URL")]
    pub url: Url,
    #[serde(rename = "thumbnailURL")]
    pub thumbnail_url: Url,
    pub description: String,
    pub place: String,
    #[serde(
        default,
        deserialize_with = "utc_timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub date_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    pub aspect_ratio: f64,
    pub exif: Exif,
}

impl Tile for Photo {
    fn height(&self) -> f64 {
        self.aspect_ratio
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EventMeta {
    pub title: String,
    pub description: String,
    #[serde(deserialize_with = "utc_timestamp::required")]
    pub start_at: DateTime<Utc>,
    #[serde(
        default,
        deserialize_with = "utc_timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Event {
    pub meta: EventMeta,
    pub photos: Vec<Photo>,
}

impl Event {
    pub fn validate(&self) -> Result<(), SchemaError> {
        if let Some(end_at) = self.meta.end_at {
            if end_at < self.meta.start_at {
                return Err(SchemaError::EndBeforeStart {
                    start_at: self.meta.start_at,
                    end_at,
                });
            }
        }
        let mut seen = HashSet::with_capacity(self.photos.len());
        for photo in &self.photos {
            if !photo.aspect_ratio.is_finite() || photo.aspect_ratio <= 0.0 {
                return Err(SchemaError::AspectRatio {
                    id: photo.id,
                    value: photo.aspect_ratio,
                });
            }
            if !seen.insert(photo.id) {
                return Err(SchemaError::DuplicatePhoto(photo.id));
            }
        }
        Ok(())
    }
}

pub fn parse_event_json(text: &str) -> Result<Event, SchemaError> {
    let event: Event = serde_json::from_str(text)?;
    event.validate()?;
    Ok(event)
}

pub fn parse_event_yaml(text: &str) -> Result<Event, SchemaError> {
    let event: Event = serde_yaml::from_str(text)?;
    event.validate()?;
    Ok(event)
}

/// Timestamps in event files must be UTC and spelled with a trailing `Z`;
/// explicit offsets are rejected rather than silently normalized.
mod utc_timestamp {
    use chrono::{DateTime, Utc};
    use serde::{de::Error, Deserialize, Deserializer};

    pub fn parse(raw: &str) -> Result<DateTime<Utc>, String> {
        if !raw.ends_with('Z') {
            return Err(format!("timestamp {raw:?} must be UTC with a 'Z' suffix"));
        }
        DateTime::parse_from_rfc3339(raw)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(|e| format!("invalid timestamp {raw:?}: {e}"))
    }

    pub fn required<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(D::Error::custom)
    }

    pub fn option<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| parse(&raw).map_err(D::Error::custom))
            .transpose()
    }
}
