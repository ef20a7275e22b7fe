//! Record types of every collection.
//!
//! Field names follow the documents the browser dashboard has always
//! written, so most are Malay (`namaProgram`, `tarikh`, `masa`, ...). Free-text
//! fields are uppercased by [`Record::normalize`]; dates, times, URLs and
//! enum values are stored as given.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::collection::{require, upper, upper_opt, Record};
use crate::defaults::{RATING_MAX, RATING_MIN};
use crate::error::{Error, Result};
use crate::interactions::Interactions;
use crate::models::{Attachment, Comment, Reaction};
use crate::uuid_utils::unique_id;

// =============================================================================
// ENUMS
// =============================================================================

/// The four focus areas a counseling program is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FocusArea {
    #[serde(rename = "Pembangunan dan pengembangan sahsiah diri murid")]
    Sahsiah,
    #[serde(rename = "Peningkatan disiplin diri murid")]
    Disiplin,
    #[serde(rename = "Pendidikan Kerjaya murid")]
    Kerjaya,
    #[serde(rename = "Psikososial dan kesejahteraan mental murid")]
    Psikososial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SumbanganCategory {
    #[serde(rename = "KURIKULUM")]
    Kurikulum,
    #[serde(rename = "KOKURIKULUM")]
    Kokurikulum,
    #[serde(rename = "HAL EHWAL MURID")]
    HalEhwalMurid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SumbanganType {
    #[serde(rename = "DALAM SEKOLAH")]
    DalamSekolah,
    #[serde(rename = "LUAR SEKOLAH")]
    LuarSekolah,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SumbanganLevel {
    #[serde(rename = "DAERAH")]
    Daerah,
    #[serde(rename = "NEGERI")]
    Negeri,
    #[serde(rename = "KEBANGSAAN")]
    Kebangsaan,
    #[serde(rename = "ANTARABANGSA")]
    Antarabangsa,
}

fn created_now() -> DateTime<Utc> {
    crate::models::now_millis()
}

fn require_positive(field: &str, value: u32) -> Result<()> {
    if value == 0 {
        return Err(Error::InvalidInput(format!("{} must be greater than zero", field)));
    }
    Ok(())
}

fn require_caption_or_image(caption: &str, images: &[Attachment]) -> Result<()> {
    if caption.trim().is_empty() && images.is_empty() {
        return Err(Error::InvalidInput("caption or at least one image is required".to_string()));
    }
    Ok(())
}

fn slot<'a>(name: &str, expected: &str, list: &'a [Attachment]) -> Option<&'a [Attachment]> {
    (name == expected).then_some(list)
}

fn slot_mut<'a>(name: &str, expected: &str, list: &'a mut Vec<Attachment>) -> Option<&'a mut Vec<Attachment>> {
    (name == expected).then_some(list)
}

// =============================================================================
// PROGRAM RECORDS
// =============================================================================

/// A counseling program with its one-page-report photos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramRecord {
    #[serde(default)]
    pub id: String,
    pub focus_area: FocusArea,
    #[serde(default)]
    pub nama_program: String,
    #[serde(default)]
    pub tarikh_mula: String,
    #[serde(default)]
    pub tarikh_tamat: String,
    #[serde(default)]
    pub tempat: String,
    #[serde(default)]
    pub sasaran: String,
    #[serde(default)]
    pub penyelaras: String,
    #[serde(default)]
    pub sumbangan: String,
    #[serde(default)]
    pub opr_images: Vec<Attachment>,
    #[serde(default = "created_now", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Record for ProgramRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn stamp(&mut self, id: String, now: DateTime<Utc>) {
        self.id = id;
        self.created_at = now;
    }

    fn validate(&self) -> Result<()> {
        require("namaProgram", &self.nama_program)?;
        require("tarikhMula", &self.tarikh_mula)?;
        require("tarikhTamat", &self.tarikh_tamat)?;
        require("penyelaras", &self.penyelaras)
    }

    fn normalize(&mut self) {
        upper(&mut self.nama_program);
        upper(&mut self.tempat);
        upper(&mut self.sasaran);
        upper(&mut self.penyelaras);
        upper(&mut self.sumbangan);
    }

    fn attachment_slots(&self) -> Vec<String> {
        vec!["oprImages".to_string()]
    }

    fn attachments(&self, name: &str) -> Option<&[Attachment]> {
        slot(name, "oprImages", &self.opr_images)
    }

    fn attachments_mut(&mut self, name: &str) -> Option<&mut Vec<Attachment>> {
        slot_mut(name, "oprImages", &mut self.opr_images)
    }
}

// =============================================================================
// CAPTIONED IMAGE RECORDS
// =============================================================================

/// Captioned photo entry. Counseling sessions, the counseling room and the
/// four peer-support (PRS) boards all store this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionedImages {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub images: Vec<Attachment>,
    #[serde(default = "created_now", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// Counseling session photo entry. Readable only with the visitor access code.
pub type SessionEntry = CaptionedImages;

/// Counseling room photo entry.
pub type BilikRecord = CaptionedImages;

/// Peer-support duty, activity, gallery and org-chart entry.
pub type PrsContent = CaptionedImages;

impl Record for CaptionedImages {
    fn id(&self) -> &str {
        &self.id
    }

    fn stamp(&mut self, id: String, now: DateTime<Utc>) {
        self.id = id;
        self.created_at = now;
    }

    fn validate(&self) -> Result<()> {
        require_caption_or_image(&self.caption, &self.images)
    }

    fn normalize(&mut self) {
        upper(&mut self.caption);
    }

    fn attachment_slots(&self) -> Vec<String> {
        vec!["images".to_string()]
    }

    fn attachments(&self, name: &str) -> Option<&[Attachment]> {
        slot(name, "images", &self.images)
    }

    fn attachments_mut(&mut self, name: &str) -> Option<&mut Vec<Attachment>> {
        slot_mut(name, "images", &mut self.images)
    }
}

// =============================================================================
// SCHOOL CONTRIBUTIONS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SumbanganRecord {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: SumbanganType,
    #[serde(default)]
    pub nama_program: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tarikh: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sumbangan_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peringkat: Option<SumbanganLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tugas: Option<String>,
    #[serde(default)]
    pub files: Vec<Attachment>,
    #[serde(default = "created_now", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Record for SumbanganRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn stamp(&mut self, id: String, now: DateTime<Utc>) {
        self.id = id;
        self.created_at = now;
    }

    fn validate(&self) -> Result<()> {
        require("namaProgram", &self.nama_program)
    }

    fn normalize(&mut self) {
        upper(&mut self.nama_program);
        upper_opt(&mut self.sumbangan_role);
        upper_opt(&mut self.tugas);
    }

    fn attachment_slots(&self) -> Vec<String> {
        vec!["files".to_string()]
    }

    fn attachments(&self, name: &str) -> Option<&[Attachment]> {
        slot(name, "files", &self.files)
    }

    fn attachments_mut(&mut self, name: &str) -> Option<&mut Vec<Attachment>> {
        slot_mut(name, "files", &mut self.files)
    }
}

/// Committee membership, filed under one of the three school categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BureauRecord {
    #[serde(default)]
    pub id: String,
    pub category: SumbanganCategory,
    #[serde(default)]
    pub jawatankuasa: String,
    #[serde(default)]
    pub jawatan: String,
    #[serde(default)]
    pub files: Vec<Attachment>,
    #[serde(default = "created_now", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Record for BureauRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn stamp(&mut self, id: String, now: DateTime<Utc>) {
        self.id = id;
        self.created_at = now;
    }

    fn validate(&self) -> Result<()> {
        require("jawatankuasa", &self.jawatankuasa)?;
        require("jawatan", &self.jawatan)
    }

    fn normalize(&mut self) {
        upper(&mut self.jawatankuasa);
        upper(&mut self.jawatan);
    }

    fn attachment_slots(&self) -> Vec<String> {
        vec!["files".to_string()]
    }

    fn attachments(&self, name: &str) -> Option<&[Attachment]> {
        slot(name, "files", &self.files)
    }

    fn attachments_mut(&mut self, name: &str) -> Option<&mut Vec<Attachment>> {
        slot_mut(name, "files", &mut self.files)
    }
}

// =============================================================================
// TITLED DOCUMENT RECORDS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InovasiRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub files: Vec<Attachment>,
    #[serde(default = "created_now", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Record for InovasiRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn stamp(&mut self, id: String, now: DateTime<Utc>) {
        self.id = id;
        self.created_at = now;
    }

    fn validate(&self) -> Result<()> {
        require("title", &self.title)
    }

    fn normalize(&mut self) {
        upper(&mut self.title);
        upper(&mut self.description);
    }

    fn attachment_slots(&self) -> Vec<String> {
        vec!["files".to_string()]
    }

    fn attachments(&self, name: &str) -> Option<&[Attachment]> {
        slot(name, "files", &self.files)
    }

    fn attachments_mut(&mut self, name: &str) -> Option<&mut Vec<Attachment>> {
        slot_mut(name, "files", &mut self.files)
    }
}

/// External link listed on a reference record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RujukanLink {
    #[serde(default)]
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RujukanRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub files: Vec<Attachment>,
    #[serde(default)]
    pub links: Vec<RujukanLink>,
    #[serde(default = "created_now", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Record for RujukanRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn stamp(&mut self, id: String, now: DateTime<Utc>) {
        self.id = id;
        self.created_at = now;
    }

    fn validate(&self) -> Result<()> {
        require("title", &self.title)?;
        for link in &self.links {
            require("links.url", &link.url)?;
        }
        Ok(())
    }

    fn normalize(&mut self) {
        upper(&mut self.title);
        upper(&mut self.description);
        for i in 0..self.links.len() {
            upper(&mut self.links[i].label);
            if self.links[i].id.is_empty() {
                let links = &self.links;
                let id = unique_id(|c| links.iter().any(|l| l.id == c));
                self.links[i].id = id;
            }
        }
    }

    fn attachment_slots(&self) -> Vec<String> {
        vec!["files".to_string()]
    }

    fn attachments(&self, name: &str) -> Option<&[Attachment]> {
        slot(name, "files", &self.files)
    }

    fn attachments_mut(&mut self, name: &str) -> Option<&mut Vec<Attachment>> {
        slot_mut(name, "files", &mut self.files)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessFormRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub files: Vec<Attachment>,
    #[serde(default = "created_now", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Record for SuccessFormRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn stamp(&mut self, id: String, now: DateTime<Utc>) {
        self.id = id;
        self.created_at = now;
    }

    fn validate(&self) -> Result<()> {
        require("title", &self.title)
    }

    fn normalize(&mut self) {
        upper(&mut self.title);
    }

    fn attachment_slots(&self) -> Vec<String> {
        vec!["files".to_string()]
    }

    fn attachments(&self, name: &str) -> Option<&[Attachment]> {
        slot(name, "files", &self.files)
    }

    fn attachments_mut(&mut self, name: &str) -> Option<&mut Vec<Attachment>> {
        slot_mut(name, "files", &mut self.files)
    }
}

/// Evidence documents backing the psychometric scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PsychometricEvidence {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub files: Vec<Attachment>,
    #[serde(default = "created_now", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Record for PsychometricEvidence {
    fn id(&self) -> &str {
        &self.id
    }

    fn stamp(&mut self, id: String, now: DateTime<Utc>) {
        self.id = id;
        self.created_at = now;
    }

    fn validate(&self) -> Result<()> {
        require("title", &self.title)
    }

    fn normalize(&mut self) {
        upper(&mut self.title);
    }

    fn attachment_slots(&self) -> Vec<String> {
        vec!["files".to_string()]
    }

    fn attachments(&self, name: &str) -> Option<&[Attachment]> {
        slot(name, "files", &self.files)
    }

    fn attachments_mut(&mut self, name: &str) -> Option<&mut Vec<Attachment>> {
        slot_mut(name, "files", &mut self.files)
    }
}

// =============================================================================
// DATED ACTIVITY RECORDS
// =============================================================================

/// Classroom teach-in log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeachInRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub tarikh: String,
    #[serde(default)]
    pub masa: String,
    #[serde(default)]
    pub kelas: String,
    #[serde(default)]
    pub catatan: String,
    #[serde(default)]
    pub images: Vec<Attachment>,
    #[serde(default = "created_now", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Record for TeachInRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn stamp(&mut self, id: String, now: DateTime<Utc>) {
        self.id = id;
        self.created_at = now;
    }

    fn validate(&self) -> Result<()> {
        require("tarikh", &self.tarikh)?;
        require("masa", &self.masa)?;
        require("kelas", &self.kelas)
    }

    fn normalize(&mut self) {
        upper(&mut self.kelas);
        upper(&mut self.catatan);
    }

    fn attachment_slots(&self) -> Vec<String> {
        vec!["images".to_string()]
    }

    fn attachments(&self, name: &str) -> Option<&[Attachment]> {
        slot(name, "images", &self.images)
    }

    fn attachments_mut(&mut self, name: &str) -> Option<&mut Vec<Attachment>> {
        slot_mut(name, "images", &mut self.images)
    }
}

/// School assembly slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssemblyRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub tarikh: String,
    #[serde(default)]
    pub masa: String,
    #[serde(default)]
    pub catatan: String,
    #[serde(default)]
    pub images: Vec<Attachment>,
    #[serde(default = "created_now", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Record for AssemblyRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn stamp(&mut self, id: String, now: DateTime<Utc>) {
        self.id = id;
        self.created_at = now;
    }

    fn validate(&self) -> Result<()> {
        require("tarikh", &self.tarikh)?;
        require("masa", &self.masa)
    }

    fn normalize(&mut self) {
        upper(&mut self.catatan);
    }

    fn attachment_slots(&self) -> Vec<String> {
        vec!["images".to_string()]
    }

    fn attachments(&self, name: &str) -> Option<&[Attachment]> {
        slot(name, "images", &self.images)
    }

    fn attachments_mut(&mut self, name: &str) -> Option<&mut Vec<Attachment>> {
        slot_mut(name, "images", &mut self.images)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub tarikh: String,
    #[serde(default)]
    pub masa: String,
    #[serde(default)]
    pub tempat: String,
    #[serde(default)]
    pub nama_mesyuarat: String,
    #[serde(default)]
    pub images: Vec<Attachment>,
    #[serde(default = "created_now", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Record for MeetingRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn stamp(&mut self, id: String, now: DateTime<Utc>) {
        self.id = id;
        self.created_at = now;
    }

    fn validate(&self) -> Result<()> {
        require("tarikh", &self.tarikh)?;
        require("masa", &self.masa)?;
        require("tempat", &self.tempat)?;
        require("namaMesyuarat", &self.nama_mesyuarat)
    }

    fn normalize(&mut self) {
        upper(&mut self.tempat);
        upper(&mut self.nama_mesyuarat);
    }

    fn attachment_slots(&self) -> Vec<String> {
        vec!["images".to_string()]
    }

    fn attachments(&self, name: &str) -> Option<&[Attachment]> {
        slot(name, "images", &self.images)
    }

    fn attachments_mut(&mut self, name: &str) -> Option<&mut Vec<Attachment>> {
        slot_mut(name, "images", &mut self.images)
    }
}

/// Training attended outside school.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalTrainingRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub nama_program: String,
    #[serde(default)]
    pub tarikh: String,
    #[serde(default)]
    pub tempat: String,
    #[serde(default)]
    pub anjuran: String,
    #[serde(default)]
    pub images: Vec<Attachment>,
    #[serde(default = "created_now", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Record for ExternalTrainingRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn stamp(&mut self, id: String, now: DateTime<Utc>) {
        self.id = id;
        self.created_at = now;
    }

    fn validate(&self) -> Result<()> {
        require("namaProgram", &self.nama_program)?;
        require("tarikh", &self.tarikh)?;
        require("tempat", &self.tempat)?;
        require("anjuran", &self.anjuran)
    }

    fn normalize(&mut self) {
        upper(&mut self.nama_program);
        upper(&mut self.tempat);
        upper(&mut self.anjuran);
    }

    fn attachment_slots(&self) -> Vec<String> {
        vec!["images".to_string()]
    }

    fn attachments(&self, name: &str) -> Option<&[Attachment]> {
        slot(name, "images", &self.images)
    }

    fn attachments_mut(&mut self, name: &str) -> Option<&mut Vec<Attachment>> {
        slot_mut(name, "images", &mut self.images)
    }
}

// =============================================================================
// WEEKLY RECORDS
// =============================================================================

/// Prefix of the per-day attachment slots of a duty week (`day:ISNIN`).
pub const DAY_SLOT_PREFIX: &str = "day:";

fn day_of_slot(name: &str) -> Option<String> {
    let day = name.strip_prefix(DAY_SLOT_PREFIX)?.trim().to_uppercase();
    (!day.is_empty()).then_some(day)
}

/// Photos taken on one day of a duty week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayLog {
    pub day: String,
    #[serde(default)]
    pub images: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyDutyRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub week_number: u32,
    #[serde(default)]
    pub week_range: String,
    #[serde(default)]
    pub schedule_images: Vec<Attachment>,
    #[serde(default)]
    pub day_logs: Vec<DayLog>,
    #[serde(default = "created_now", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Record for WeeklyDutyRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn stamp(&mut self, id: String, now: DateTime<Utc>) {
        self.id = id;
        self.created_at = now;
    }

    /// `weekNumber` is informational; weeks written by the browser carry 0.
    fn validate(&self) -> Result<()> {
        require("weekRange", &self.week_range)
    }

    fn normalize(&mut self) {
        upper(&mut self.week_range);
        for log in &mut self.day_logs {
            upper(&mut log.day);
        }
    }

    fn attachment_slots(&self) -> Vec<String> {
        let mut slots = vec!["scheduleImages".to_string()];
        slots.extend(
            self.day_logs
                .iter()
                .map(|log| format!("{}{}", DAY_SLOT_PREFIX, log.day)),
        );
        slots
    }

    fn attachments(&self, name: &str) -> Option<&[Attachment]> {
        if name == "scheduleImages" {
            return Some(&self.schedule_images);
        }
        let day = day_of_slot(name)?;
        match self.day_logs.iter().find(|log| log.day == day) {
            Some(log) => Some(&log.images),
            None => Some(&[]),
        }
    }

    fn attachments_mut(&mut self, name: &str) -> Option<&mut Vec<Attachment>> {
        if name == "scheduleImages" {
            return Some(&mut self.schedule_images);
        }
        let day = day_of_slot(name)?;
        self.day_logs
            .iter_mut()
            .find(|log| log.day == day)
            .map(|log| &mut log.images)
    }

    /// Day slots are created on first upload.
    fn attachments_mut_or_create(&mut self, name: &str) -> Option<&mut Vec<Attachment>> {
        if name == "scheduleImages" {
            return Some(&mut self.schedule_images);
        }
        let day = day_of_slot(name)?;
        let idx = match self.day_logs.iter().position(|log| log.day == day) {
            Some(idx) => idx,
            None => {
                self.day_logs.push(DayLog {
                    day,
                    images: Vec::new(),
                });
                self.day_logs.len() - 1
            }
        };
        Some(&mut self.day_logs[idx].images)
    }
}

/// Weekly analysis report: PDFs and images kept apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyAnalysis {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub week_number: u32,
    #[serde(default)]
    pub pdf_files: Vec<Attachment>,
    #[serde(default)]
    pub image_files: Vec<Attachment>,
    #[serde(default = "created_now", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Record for WeeklyAnalysis {
    fn id(&self) -> &str {
        &self.id
    }

    fn stamp(&mut self, id: String, now: DateTime<Utc>) {
        self.id = id;
        self.created_at = now;
    }

    fn validate(&self) -> Result<()> {
        require_positive("weekNumber", self.week_number)?;
        if self.pdf_files.is_empty() && self.image_files.is_empty() {
            return Err(Error::InvalidInput(
                "at least one PDF or image file is required".to_string(),
            ));
        }
        Ok(())
    }

    fn attachment_slots(&self) -> Vec<String> {
        vec!["pdfFiles".to_string(), "imageFiles".to_string()]
    }

    fn attachments(&self, name: &str) -> Option<&[Attachment]> {
        match name {
            "pdfFiles" => Some(&self.pdf_files),
            "imageFiles" => Some(&self.image_files),
            _ => None,
        }
    }

    fn attachments_mut(&mut self, name: &str) -> Option<&mut Vec<Attachment>> {
        match name {
            "pdfFiles" => Some(&mut self.pdf_files),
            "imageFiles" => Some(&mut self.image_files),
            _ => None,
        }
    }
}

// =============================================================================
// PEER SUPPORT MEMBERS AND PSYCHOMETRICS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrsMember {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub student_class: String,
    #[serde(default)]
    pub position: String,
    #[serde(default = "created_now", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Record for PrsMember {
    fn id(&self) -> &str {
        &self.id
    }

    fn stamp(&mut self, id: String, now: DateTime<Utc>) {
        self.id = id;
        self.created_at = now;
    }

    fn validate(&self) -> Result<()> {
        require("name", &self.name)
    }

    fn normalize(&mut self) {
        upper(&mut self.name);
        upper(&mut self.student_class);
        upper(&mut self.position);
    }
}

/// Holland (RIASEC) interest scores for one class. Carries `updatedAt`
/// instead of `createdAt`; it moves on every update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PsychometricScore {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub class_name: String,
    #[serde(default)]
    pub realistic: f64,
    #[serde(default)]
    pub investigative: f64,
    #[serde(default)]
    pub artistic: f64,
    #[serde(default)]
    pub social: f64,
    #[serde(default)]
    pub enterprising: f64,
    #[serde(default)]
    pub conventional: f64,
    #[serde(default)]
    pub total_students: u32,
    #[serde(default)]
    pub answered_count: u32,
    #[serde(default = "created_now", with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Record for PsychometricScore {
    const PROTECTED_FIELDS: &'static [&'static str] = &["id"];

    fn id(&self) -> &str {
        &self.id
    }

    fn stamp(&mut self, id: String, now: DateTime<Utc>) {
        self.id = id;
        self.updated_at = now;
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    fn validate(&self) -> Result<()> {
        require("className", &self.class_name)
    }

    fn normalize(&mut self) {
        upper(&mut self.class_name);
    }
}

// =============================================================================
// GUESTBOOK
// =============================================================================

/// Guestbook entry left by a visitor. Carries its own comment thread and
/// reactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorFeedback {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub rating: u8,
    #[serde(default = "created_now", with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
}

impl Record for VisitorFeedback {
    const PROTECTED_FIELDS: &'static [&'static str] = &["id", "timestamp"];

    fn id(&self) -> &str {
        &self.id
    }

    fn stamp(&mut self, id: String, now: DateTime<Utc>) {
        self.id = id;
        self.timestamp = now;
    }

    fn validate(&self) -> Result<()> {
        require("name", &self.name)?;
        require("comment", &self.comment)?;
        if !(RATING_MIN..=RATING_MAX).contains(&self.rating) {
            return Err(Error::InvalidInput(format!(
                "rating must be between {} and {}",
                RATING_MIN, RATING_MAX
            )));
        }
        Ok(())
    }

    fn normalize(&mut self) {
        upper(&mut self.name);
        upper(&mut self.comment);
    }

    fn interactions_mut(&mut self) -> Option<&mut dyn Interactions> {
        Some(self)
    }

    fn interactions(&self) -> Option<&dyn Interactions> {
        Some(self)
    }
}

impl Interactions for VisitorFeedback {
    fn comments(&self) -> &[Comment] {
        &self.comments
    }

    fn comments_mut(&mut self) -> &mut Vec<Comment> {
        &mut self.comments
    }

    fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    fn reactions_mut(&mut self) -> &mut Vec<Reaction> {
        &mut self.reactions
    }
}
