//! Generic record collections.
//!
//! Every record category is an ordered list of records of one type, stored
//! under a fixed key. [`Collection`] implements list/get/add/delete/update and
//! the attachment operations once for all of them; the per-type
//! configuration (stamping, validation, uppercasing, attachment slots) comes
//! from the [`Record`] trait.
//!
//! [`DynCollection`] is an object-safe JSON-level view over a collection so a
//! single set of handlers can serve every kind.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::defaults::{REMOTE_MODULE_FEEDBACKS, REMOTE_MODULE_RECORDS};
use crate::error::{Error, Result};
use crate::interactions::Interactions;
use crate::models::{now_millis, Attachment, DutyDetails};
use crate::uuid_utils::unique_id;

// =============================================================================
// RECORD TRAIT
// =============================================================================

/// Per-type configuration of a collection element.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// JSON fields a merge update or replacement never changes.
    const PROTECTED_FIELDS: &'static [&'static str] = &["id", "createdAt"];

    fn id(&self) -> &str;

    /// Assign the id and the creation instant of a new record.
    fn stamp(&mut self, id: String, now: DateTime<Utc>);

    /// Called after every successful update or replacement.
    fn touch(&mut self, _now: DateTime<Utc>) {}

    /// Required-field checks.
    fn validate(&self) -> Result<()>;

    /// Uppercase free-text fields.
    fn normalize(&mut self) {}

    /// Named attachment lists this record currently exposes.
    fn attachment_slots(&self) -> Vec<String> {
        Vec::new()
    }

    fn attachments(&self, _slot: &str) -> Option<&[Attachment]> {
        None
    }

    /// Lookup only; never adds a slot.
    fn attachments_mut(&mut self, _slot: &str) -> Option<&mut Vec<Attachment>> {
        None
    }

    /// Slot an upload lands in. Records with open-ended slots create them here.
    fn attachments_mut_or_create(&mut self, slot: &str) -> Option<&mut Vec<Attachment>> {
        self.attachments_mut(slot)
    }

    /// Record-level comment thread and reactions, for records that carry
    /// their own.
    fn interactions_mut(&mut self) -> Option<&mut dyn Interactions> {
        None
    }

    fn interactions(&self) -> Option<&dyn Interactions> {
        None
    }

    fn attachment_count(&self) -> usize {
        self.attachment_slots()
            .iter()
            .filter_map(|slot| self.attachments(slot))
            .map(|list| list.len())
            .sum()
    }

    fn comment_count(&self) -> usize {
        let on_attachments: usize = self
            .attachment_slots()
            .iter()
            .filter_map(|slot| self.attachments(slot))
            .flat_map(|list| list.iter())
            .map(|att| att.comments.len())
            .sum();
        on_attachments + self.interactions().map_or(0, |i| i.comments().len())
    }
}

/// Fail with `InvalidInput` when a required text field is blank.
pub(crate) fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{} is required", field)));
    }
    Ok(())
}

pub(crate) fn upper(value: &mut String) {
    *value = value.trim().to_uppercase();
}

pub(crate) fn upper_opt(value: &mut Option<String>) {
    if let Some(v) = value.as_mut() {
        upper(v);
    }
}

// =============================================================================
// COLLECTION KIND
// =============================================================================

/// Every record collection the dashboard keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CollectionKind {
    Records,
    Sessions,
    Bilik,
    Sumbangan,
    Bureaus,
    Inovasi,
    Rujukan,
    Teachin,
    Assembly,
    Meeting,
    Training,
    DutyWeekly,
    Success,
    Analisis,
    PrsMembers,
    PrsDuty,
    PrsActivity,
    PrsGallery,
    PrsOrgCharts,
    PsychometricScores,
    PsychometricEvidences,
    Feedbacks,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 22] = [
        CollectionKind::Records,
        CollectionKind::Sessions,
        CollectionKind::Bilik,
        CollectionKind::Sumbangan,
        CollectionKind::Bureaus,
        CollectionKind::Inovasi,
        CollectionKind::Rujukan,
        CollectionKind::Teachin,
        CollectionKind::Assembly,
        CollectionKind::Meeting,
        CollectionKind::Training,
        CollectionKind::DutyWeekly,
        CollectionKind::Success,
        CollectionKind::Analisis,
        CollectionKind::PrsMembers,
        CollectionKind::PrsDuty,
        CollectionKind::PrsActivity,
        CollectionKind::PrsGallery,
        CollectionKind::PrsOrgCharts,
        CollectionKind::PsychometricScores,
        CollectionKind::PsychometricEvidences,
        CollectionKind::Feedbacks,
    ];

    /// Key of the persisted document.
    pub fn storage_key(&self) -> &'static str {
        match self {
            CollectionKind::Records => "counseling_records",
            CollectionKind::Sessions => "counseling_sessions",
            CollectionKind::Bilik => "counseling_bilik",
            CollectionKind::Sumbangan => "school_sumbangan",
            CollectionKind::Bureaus => "school_bureaus",
            CollectionKind::Inovasi => "counseling_inovasi",
            CollectionKind::Rujukan => "counseling_rujukan",
            CollectionKind::Teachin => "counseling_teachin",
            CollectionKind::Assembly => "counseling_assembly",
            CollectionKind::Meeting => "counseling_meeting",
            CollectionKind::Training => "counseling_training",
            CollectionKind::DutyWeekly => "counseling_duty_weekly",
            CollectionKind::Success => "counseling_success",
            CollectionKind::Analisis => "counseling_analisis",
            CollectionKind::PrsMembers => "prs_members",
            CollectionKind::PrsDuty => "prs_duty",
            CollectionKind::PrsActivity => "prs_activity",
            CollectionKind::PrsGallery => "prs_gallery",
            CollectionKind::PrsOrgCharts => "prs_org_charts",
            CollectionKind::PsychometricScores => "counseling_psikometrik_scores",
            CollectionKind::PsychometricEvidences => "counseling_psikometrik_evidences",
            CollectionKind::Feedbacks => "visitor_feedbacks",
        }
    }

    /// Name used in URLs and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKind::Records => "records",
            CollectionKind::Sessions => "sessions",
            CollectionKind::Bilik => "bilik",
            CollectionKind::Sumbangan => "sumbangan",
            CollectionKind::Bureaus => "bureaus",
            CollectionKind::Inovasi => "inovasi",
            CollectionKind::Rujukan => "rujukan",
            CollectionKind::Teachin => "teachin",
            CollectionKind::Assembly => "assembly",
            CollectionKind::Meeting => "meeting",
            CollectionKind::Training => "training",
            CollectionKind::DutyWeekly => "dutyWeekly",
            CollectionKind::Success => "success",
            CollectionKind::Analisis => "analisis",
            CollectionKind::PrsMembers => "prsMembers",
            CollectionKind::PrsDuty => "prsDuty",
            CollectionKind::PrsActivity => "prsActivity",
            CollectionKind::PrsGallery => "prsGallery",
            CollectionKind::PrsOrgCharts => "prsOrgCharts",
            CollectionKind::PsychometricScores => "psychometricScores",
            CollectionKind::PsychometricEvidences => "psychometricEvidences",
            CollectionKind::Feedbacks => "feedbacks",
        }
    }

    /// Module name on the remote mirror, for the two mirrored collections.
    pub fn remote_module(&self) -> Option<&'static str> {
        match self {
            CollectionKind::Records => Some(REMOTE_MODULE_RECORDS),
            CollectionKind::Feedbacks => Some(REMOTE_MODULE_FEEDBACKS),
            _ => None,
        }
    }

    /// Whether reading needs the visitor access code (or administrator mode).
    pub fn read_gated(&self) -> bool {
        matches!(self, CollectionKind::Sessions)
    }

    /// Whether visitors may create records (guestbook only).
    pub fn visitor_writable(&self) -> bool {
        matches!(self, CollectionKind::Feedbacks)
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        CollectionKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s || k.storage_key() == s)
            .ok_or_else(|| Error::NotFound(format!("collection {}", s)))
    }
}

// =============================================================================
// COLLECTION
// =============================================================================

/// Ordered list of records, most recent first.
#[derive(Debug, Clone)]
pub struct Collection<T: Record> {
    kind: CollectionKind,
    items: Vec<T>,
}

impl<T: Record> Collection<T> {
    pub fn new(kind: CollectionKind) -> Self {
        Self {
            kind,
            items: Vec::new(),
        }
    }

    pub fn from_items(kind: CollectionKind, items: Vec<T>) -> Self {
        Self { kind, items }
    }

    /// Parse a persisted document (a JSON array of records).
    pub fn from_document(kind: CollectionKind, document: &str) -> Result<Self> {
        let items: Vec<T> = serde_json::from_str(document)?;
        Ok(Self::from_items(kind, items))
    }

    pub fn to_document(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.items)?)
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|r| r.id() == id)
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut T> {
        let kind = self.kind;
        self.items
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| Error::NotFound(format!("{} record {}", kind, id)))
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.items
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| Error::NotFound(format!("{} record {}", self.kind, id)))
    }

    /// Validate, stamp and prepend a new record. Returns the stored record.
    pub fn add(&mut self, mut record: T) -> Result<&T> {
        record.normalize();
        record.validate()?;

        let id = unique_id(|c| self.items.iter().any(|r| r.id() == c));
        record.stamp(id, now_millis());
        fill_attachment_ids(&mut record);

        self.items.insert(0, record);
        Ok(&self.items[0])
    }

    /// Remove a record and everything it owns.
    pub fn delete(&mut self, id: &str) -> Result<T> {
        let idx = self.position(id)?;
        Ok(self.items.remove(idx))
    }

    /// Shallow JSON merge of `patch` into the record. Protected fields in the
    /// patch are ignored. Nothing changes if the merged record is invalid.
    pub fn update(&mut self, id: &str, patch: &JsonValue) -> Result<&T> {
        let patch = patch
            .as_object()
            .ok_or_else(|| Error::InvalidInput("update body must be a JSON object".to_string()))?;

        let idx = self.position(id)?;
        let mut merged = match serde_json::to_value(&self.items[idx])? {
            JsonValue::Object(map) => map,
            _ => return Err(Error::Internal("record did not serialize to an object".to_string())),
        };
        for (key, value) in patch {
            if T::PROTECTED_FIELDS.contains(&key.as_str()) {
                continue;
            }
            merged.insert(key.clone(), value.clone());
        }

        let mut record: T = serde_json::from_value(JsonValue::Object(merged))
            .map_err(|e| Error::InvalidInput(e.to_string()))?;
        self.commit(idx, &mut record)?;
        self.items[idx] = record;
        Ok(&self.items[idx])
    }

    /// Replace the whole record, keeping its id and creation stamp.
    pub fn replace(&mut self, id: &str, record: T) -> Result<&T> {
        let idx = self.position(id)?;
        let mut incoming = match serde_json::to_value(&record)? {
            JsonValue::Object(map) => map,
            _ => return Err(Error::Internal("record did not serialize to an object".to_string())),
        };
        let current = serde_json::to_value(&self.items[idx])?;
        restore_protected::<T>(&mut incoming, &current);

        let mut record: T = serde_json::from_value(JsonValue::Object(incoming))
            .map_err(|e| Error::InvalidInput(e.to_string()))?;
        self.commit(idx, &mut record)?;
        self.items[idx] = record;
        Ok(&self.items[idx])
    }

    fn commit(&self, idx: usize, record: &mut T) -> Result<()> {
        record.normalize();
        record.validate()?;
        if record.id() != self.items[idx].id() {
            return Err(Error::Internal("record id changed during update".to_string()));
        }
        fill_attachment_ids(record);
        record.touch(now_millis());
        Ok(())
    }

    /// Append ingested attachments to a slot. Ids colliding with existing
    /// attachments in the slot are regenerated.
    pub fn add_attachments(
        &mut self,
        id: &str,
        slot: &str,
        attachments: Vec<Attachment>,
    ) -> Result<Vec<Attachment>> {
        let kind = self.kind;
        let record = self.get_mut(id)?;
        let list = record
            .attachments_mut_or_create(slot)
            .ok_or_else(|| unknown_slot(kind, slot))?;

        let mut added = Vec::with_capacity(attachments.len());
        for mut att in attachments {
            if att.id.is_empty() || list.iter().any(|a| a.id == att.id) {
                att.id = unique_id(|c| list.iter().any(|a| a.id == c));
            }
            list.push(att.clone());
            added.push(att);
        }
        Ok(added)
    }

    pub fn remove_attachment(&mut self, id: &str, slot: &str, attachment_id: &str) -> Result<Attachment> {
        let kind = self.kind;
        let list = self
            .get_mut(id)?
            .attachments_mut(slot)
            .ok_or_else(|| unknown_slot(kind, slot))?;
        let idx = list
            .iter()
            .position(|a| a.id == attachment_id)
            .ok_or_else(|| Error::NotFound(format!("attachment {}", attachment_id)))?;
        Ok(list.remove(idx))
    }

    /// Swap an attachment for `replacement`, keeping the original id.
    pub fn replace_attachment(
        &mut self,
        id: &str,
        slot: &str,
        attachment_id: &str,
        mut replacement: Attachment,
    ) -> Result<&Attachment> {
        let current = self.attachment_mut(id, slot, attachment_id)?;
        replacement.id = current.id.clone();
        *current = replacement;
        Ok(current)
    }

    pub fn set_duty_details(
        &mut self,
        id: &str,
        slot: &str,
        attachment_id: &str,
        mut details: DutyDetails,
    ) -> Result<&Attachment> {
        upper(&mut details.date);
        upper(&mut details.time);
        upper(&mut details.location);
        let current = self.attachment_mut(id, slot, attachment_id)?;
        current.duty_details = Some(details);
        Ok(current)
    }

    pub fn attachment(&self, id: &str, slot: &str, attachment_id: &str) -> Result<&Attachment> {
        let record = self
            .get(id)
            .ok_or_else(|| Error::NotFound(format!("{} record {}", self.kind, id)))?;
        record
            .attachments(slot)
            .ok_or_else(|| unknown_slot(self.kind, slot))?
            .iter()
            .find(|a| a.id == attachment_id)
            .ok_or_else(|| Error::NotFound(format!("attachment {}", attachment_id)))
    }

    pub fn attachment_mut(&mut self, id: &str, slot: &str, attachment_id: &str) -> Result<&mut Attachment> {
        let kind = self.kind;
        self.get_mut(id)?
            .attachments_mut(slot)
            .ok_or_else(|| unknown_slot(kind, slot))?
            .iter_mut()
            .find(|a| a.id == attachment_id)
            .ok_or_else(|| Error::NotFound(format!("attachment {}", attachment_id)))
    }

    /// Record-level interactions (guestbook entries).
    pub fn interactions_mut(&mut self, id: &str) -> Result<&mut dyn Interactions> {
        let kind = self.kind;
        self.get_mut(id)?
            .interactions_mut()
            .ok_or_else(|| Error::InvalidInput(format!("{} records have no comment thread", kind)))
    }
}

fn unknown_slot(kind: CollectionKind, slot: &str) -> Error {
    Error::NotFound(format!("attachment slot {} on {}", slot, kind))
}

fn fill_attachment_ids<T: Record>(record: &mut T) {
    for slot in record.attachment_slots() {
        if let Some(list) = record.attachments_mut(&slot) {
            for i in 0..list.len() {
                if list[i].id.is_empty() {
                    let id = unique_id(|c| list.iter().any(|a| a.id == c));
                    list[i].id = id;
                }
            }
        }
    }
}

fn restore_protected<T: Record>(incoming: &mut Map<String, JsonValue>, current: &JsonValue) {
    for field in T::PROTECTED_FIELDS {
        match current.get(*field) {
            Some(value) => {
                incoming.insert((*field).to_string(), value.clone());
            }
            None => {
                incoming.remove(*field);
            }
        }
    }
}

// =============================================================================
// DYNAMIC VIEW
// =============================================================================

/// Object-safe, JSON-level view of a collection.
pub trait DynCollection: Send + Sync {
    fn kind(&self) -> CollectionKind;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn list_json(&self) -> Result<JsonValue>;
    fn get_json(&self, id: &str) -> Result<JsonValue>;
    fn add_json(&mut self, record: JsonValue) -> Result<JsonValue>;
    fn update_json(&mut self, id: &str, patch: &JsonValue) -> Result<JsonValue>;
    fn replace_json(&mut self, id: &str, record: JsonValue) -> Result<JsonValue>;
    fn delete_json(&mut self, id: &str) -> Result<JsonValue>;
    /// Replace every record, as done when a remote snapshot arrives.
    fn reset_json(&mut self, records: JsonValue) -> Result<()>;
    fn to_document(&self) -> Result<String>;

    fn add_attachments(&mut self, id: &str, slot: &str, attachments: Vec<Attachment>) -> Result<Vec<Attachment>>;
    fn remove_attachment(&mut self, id: &str, slot: &str, attachment_id: &str) -> Result<Attachment>;
    fn replace_attachment(
        &mut self,
        id: &str,
        slot: &str,
        attachment_id: &str,
        replacement: Attachment,
    ) -> Result<Attachment>;
    fn set_duty_details(
        &mut self,
        id: &str,
        slot: &str,
        attachment_id: &str,
        details: DutyDetails,
    ) -> Result<Attachment>;
    fn attachment(&self, id: &str, slot: &str, attachment_id: &str) -> Result<&Attachment>;
    fn attachment_mut(&mut self, id: &str, slot: &str, attachment_id: &str) -> Result<&mut Attachment>;
    fn interactions_mut(&mut self, id: &str) -> Result<&mut dyn Interactions>;

    fn attachment_count(&self) -> usize;
    fn comment_count(&self) -> usize;
}

impl<T: Record> DynCollection for Collection<T> {
    fn kind(&self) -> CollectionKind {
        self.kind
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn list_json(&self) -> Result<JsonValue> {
        Ok(serde_json::to_value(&self.items)?)
    }

    fn get_json(&self, id: &str) -> Result<JsonValue> {
        let record = self
            .get(id)
            .ok_or_else(|| Error::NotFound(format!("{} record {}", self.kind, id)))?;
        Ok(serde_json::to_value(record)?)
    }

    fn add_json(&mut self, record: JsonValue) -> Result<JsonValue> {
        let record: T = serde_json::from_value(record).map_err(|e| Error::InvalidInput(e.to_string()))?;
        let stored = Collection::add(self, record)?;
        Ok(serde_json::to_value(stored)?)
    }

    fn update_json(&mut self, id: &str, patch: &JsonValue) -> Result<JsonValue> {
        let stored = Collection::update(self, id, patch)?;
        Ok(serde_json::to_value(stored)?)
    }

    fn replace_json(&mut self, id: &str, record: JsonValue) -> Result<JsonValue> {
        // Stamps are restored from the stored record, so absent ones are fine.
        let mut record = record;
        if let JsonValue::Object(map) = &mut record {
            if let Some(current) = self.get(id) {
                let current = serde_json::to_value(current)?;
                restore_protected::<T>(map, &current);
            }
        }
        let record: T = serde_json::from_value(record).map_err(|e| Error::InvalidInput(e.to_string()))?;
        let stored = Collection::replace(self, id, record)?;
        Ok(serde_json::to_value(stored)?)
    }

    fn delete_json(&mut self, id: &str) -> Result<JsonValue> {
        let removed = Collection::delete(self, id)?;
        Ok(serde_json::to_value(removed)?)
    }

    fn reset_json(&mut self, records: JsonValue) -> Result<()> {
        let items: Vec<T> = serde_json::from_value(records)?;
        self.items = items;
        Ok(())
    }

    fn to_document(&self) -> Result<String> {
        Collection::to_document(self)
    }

    fn add_attachments(&mut self, id: &str, slot: &str, attachments: Vec<Attachment>) -> Result<Vec<Attachment>> {
        Collection::add_attachments(self, id, slot, attachments)
    }

    fn remove_attachment(&mut self, id: &str, slot: &str, attachment_id: &str) -> Result<Attachment> {
        Collection::remove_attachment(self, id, slot, attachment_id)
    }

    fn replace_attachment(
        &mut self,
        id: &str,
        slot: &str,
        attachment_id: &str,
        replacement: Attachment,
    ) -> Result<Attachment> {
        Collection::replace_attachment(self, id, slot, attachment_id, replacement).cloned()
    }

    fn set_duty_details(
        &mut self,
        id: &str,
        slot: &str,
        attachment_id: &str,
        details: DutyDetails,
    ) -> Result<Attachment> {
        Collection::set_duty_details(self, id, slot, attachment_id, details).cloned()
    }

    fn attachment(&self, id: &str, slot: &str, attachment_id: &str) -> Result<&Attachment> {
        Collection::attachment(self, id, slot, attachment_id)
    }

    fn attachment_mut(&mut self, id: &str, slot: &str, attachment_id: &str) -> Result<&mut Attachment> {
        Collection::attachment_mut(self, id, slot, attachment_id)
    }

    fn interactions_mut(&mut self, id: &str) -> Result<&mut dyn Interactions> {
        Collection::interactions_mut(self, id)
    }

    fn attachment_count(&self) -> usize {
        self.items.iter().map(Record::attachment_count).sum()
    }

    fn comment_count(&self) -> usize {
        self.items.iter().map(Record::comment_count).sum()
    }
}
