//! The single counselor profile document.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::collection::upper;
use crate::defaults::{
    PROFILE_EMOTION_EMOJI, PROFILE_EMOTION_LABEL, PROFILE_NAME, PROFILE_QUOTE, PROFILE_SCHOOL_NAME, PROFILE_SINCE,
};
use crate::error::{Error, Result};
use crate::models::{now_millis, Attachment};
use crate::uuid_utils::unique_id;

/// Mood shown next to the counselor's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEmotion {
    pub emoji: String,
    pub label: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// Which manually entered KPI value is being updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KpiKind {
    Individual,
    Group,
}

/// The two attachment lists kept on the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileList {
    Jadual,
    Takwim,
}

impl ProfileList {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileList::Jadual => "jadualUrls",
            ProfileList::Takwim => "takwimUrls",
        }
    }
}

impl fmt::Display for ProfileList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileList {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "jadual" | "jadualUrls" => Ok(ProfileList::Jadual),
            "takwim" | "takwimUrls" => Ok(ProfileList::Takwim),
            other => Err(Error::NotFound(format!("profile list {}", other))),
        }
    }
}

/// Counselor profile: identity, branding images, schedules, mood and KPIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub since: String,
    #[serde(default)]
    pub quote: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidebar_bg_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prs_logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prs_group_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prs_duty_schedule_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_logo_url: Option<String>,
    #[serde(default)]
    pub holland_images: BTreeMap<String, String>,
    #[serde(default)]
    pub jadual_urls: Vec<Attachment>,
    #[serde(default)]
    pub takwim_urls: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_emotion: Option<UserEmotion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_kpi_individual: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_kpi_group: Option<f64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub last_update_individual: Option<DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub last_update_group: Option<DateTime<Utc>>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: PROFILE_NAME.to_string(),
            since: PROFILE_SINCE.to_string(),
            quote: PROFILE_QUOTE.to_string(),
            avatar_url: None,
            logo_url: None,
            sidebar_bg_url: None,
            school_logo_url: None,
            school_name: Some(PROFILE_SCHOOL_NAME.to_string()),
            prs_logo_url: None,
            prs_group_image_url: None,
            prs_duty_schedule_url: None,
            session_logo_url: None,
            holland_images: BTreeMap::new(),
            jadual_urls: Vec::new(),
            takwim_urls: Vec::new(),
            current_emotion: Some(UserEmotion {
                emoji: PROFILE_EMOTION_EMOJI.to_string(),
                label: PROFILE_EMOTION_LABEL.to_string(),
                timestamp: DateTime::<Utc>::default(),
            }),
            manual_kpi_individual: None,
            manual_kpi_group: None,
            last_update_individual: None,
            last_update_group: None,
        }
    }
}

impl Profile {
    /// Shallow JSON merge of `patch` into the profile.
    pub fn update(&mut self, patch: &JsonValue) -> Result<()> {
        let patch = patch
            .as_object()
            .ok_or_else(|| Error::InvalidInput("profile update must be a JSON object".to_string()))?;
        let mut merged = match serde_json::to_value(&*self)? {
            JsonValue::Object(map) => map,
            _ => return Err(Error::Internal("profile did not serialize to an object".to_string())),
        };
        for (key, value) in patch {
            merged.insert(key.clone(), value.clone());
        }
        let mut updated: Profile =
            serde_json::from_value(JsonValue::Object(merged)).map_err(|e| Error::InvalidInput(e.to_string()))?;
        upper(&mut updated.name);
        if let Some(school) = updated.school_name.as_mut() {
            upper(school);
        }
        *self = updated;
        Ok(())
    }

    pub fn set_emotion(&mut self, emoji: &str, label: &str) -> Result<&UserEmotion> {
        if emoji.trim().is_empty() {
            return Err(Error::InvalidInput("emotion emoji is required".to_string()));
        }
        Ok(self.current_emotion.insert(UserEmotion {
            emoji: emoji.trim().to_string(),
            label: label.trim().to_uppercase(),
            timestamp: now_millis(),
        }))
    }

    /// Set a manual KPI value and stamp the matching last-update instant.
    pub fn update_kpi(&mut self, kind: KpiKind, value: f64) -> Result<()> {
        if !value.is_finite() || value < 0.0 {
            return Err(Error::InvalidInput("KPI value must be a non-negative number".to_string()));
        }
        let now = now_millis();
        match kind {
            KpiKind::Individual => {
                self.manual_kpi_individual = Some(value);
                self.last_update_individual = Some(now);
            }
            KpiKind::Group => {
                self.manual_kpi_group = Some(value);
                self.last_update_group = Some(now);
            }
        }
        Ok(())
    }

    /// Set the image for a Holland code. An empty URL removes it.
    pub fn set_holland_image(&mut self, code: &str, url: &str) -> Result<()> {
        let code = code.trim().to_uppercase();
        if code.is_empty() {
            return Err(Error::InvalidInput("holland code is required".to_string()));
        }
        if url.trim().is_empty() {
            self.holland_images.remove(&code);
        } else {
            self.holland_images.insert(code, url.to_string());
        }
        Ok(())
    }

    pub fn list(&self, list: ProfileList) -> &[Attachment] {
        match list {
            ProfileList::Jadual => &self.jadual_urls,
            ProfileList::Takwim => &self.takwim_urls,
        }
    }

    fn list_mut(&mut self, list: ProfileList) -> &mut Vec<Attachment> {
        match list {
            ProfileList::Jadual => &mut self.jadual_urls,
            ProfileList::Takwim => &mut self.takwim_urls,
        }
    }

    pub fn add_attachments(&mut self, list: ProfileList, attachments: Vec<Attachment>) -> Vec<Attachment> {
        let target = self.list_mut(list);
        let mut added = Vec::with_capacity(attachments.len());
        for mut att in attachments {
            if att.id.is_empty() || target.iter().any(|a| a.id == att.id) {
                att.id = unique_id(|c| target.iter().any(|a| a.id == c));
            }
            target.push(att.clone());
            added.push(att);
        }
        added
    }

    pub fn remove_attachment(&mut self, list: ProfileList, attachment_id: &str) -> Result<Attachment> {
        let target = self.list_mut(list);
        let idx = target
            .iter()
            .position(|a| a.id == attachment_id)
            .ok_or_else(|| Error::NotFound(format!("attachment {}", attachment_id)))?;
        Ok(target.remove(idx))
    }

    pub fn attachment_mut(&mut self, list: ProfileList, attachment_id: &str) -> Result<&mut Attachment> {
        self.list_mut(list)
            .iter_mut()
            .find(|a| a.id == attachment_id)
            .ok_or_else(|| Error::NotFound(format!("attachment {}", attachment_id)))
    }
}
