//! Application state: every collection plus the profile, loaded from and
//! persisted to a [`KeyValueStore`].
//!
//! Every mutation rewrites the owning collection's whole document before it
//! returns. When a [`RemoteMirror`] is attached, writes of the program records
//! (administrator sessions only) and of the guestbook are also pushed to it in
//! a detached task; mirror failures are logged and never reach the caller.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use kaunseling_core::defaults::{PROFILE_KEY, VISITOR_NAME};
use kaunseling_core::{
    Attachment, AssemblyRecord, BilikRecord, BureauRecord, Collection, CollectionKind, Comment, DutyDetails,
    DynCollection, Error, ExternalTrainingRecord, InovasiRecord, Interactions, KeyValueStore, KpiKind,
    MeetingRecord, Profile, ProfileList, ProgramRecord, PrsContent, PrsMember, PsychometricEvidence,
    PsychometricScore, Reaction, Record, RemoteMirror, Result, RujukanRecord, SessionEntry, SessionState,
    SuccessFormRecord, SumbanganCategory, SumbanganRecord, TeachInRecord, UserEmotion, VisitorFeedback,
    WeeklyAnalysis, WeeklyDutyRecord,
};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

/// Where a comment or reaction lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionTarget {
    /// An attachment inside a record.
    Attachment {
        kind: CollectionKind,
        record_id: String,
        slot: String,
        attachment_id: String,
    },
    /// A record with its own thread (guestbook entries).
    Record { kind: CollectionKind, record_id: String },
    /// An attachment in one of the profile's lists.
    ProfileAttachment { list: ProfileList, attachment_id: String },
}

impl InteractionTarget {
    fn kind(&self) -> Option<CollectionKind> {
        match self {
            InteractionTarget::Attachment { kind, .. } | InteractionTarget::Record { kind, .. } => Some(*kind),
            InteractionTarget::ProfileAttachment { .. } => None,
        }
    }
}

/// Counters behind the dashboard overview.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub collections: BTreeMap<String, usize>,
    pub total_records: usize,
    pub total_attachments: usize,
    pub total_comments: usize,
    pub average_rating: Option<f64>,
    pub manual_kpi_individual: Option<f64>,
    pub manual_kpi_group: Option<f64>,
}

/// The whole dashboard state.
pub struct Dashboard {
    store: Arc<dyn KeyValueStore>,
    mirror: Option<Arc<dyn RemoteMirror>>,
    /// Local write counter per collection, indexed by kind.
    revisions: [AtomicU64; CollectionKind::ALL.len()],
    records: Collection<ProgramRecord>,
    sessions: Collection<SessionEntry>,
    bilik: Collection<BilikRecord>,
    sumbangan: Collection<SumbanganRecord>,
    bureaus: Collection<BureauRecord>,
    inovasi: Collection<InovasiRecord>,
    rujukan: Collection<RujukanRecord>,
    teachin: Collection<TeachInRecord>,
    assembly: Collection<AssemblyRecord>,
    meeting: Collection<MeetingRecord>,
    training: Collection<ExternalTrainingRecord>,
    duty_weekly: Collection<WeeklyDutyRecord>,
    success: Collection<SuccessFormRecord>,
    analisis: Collection<WeeklyAnalysis>,
    prs_members: Collection<PrsMember>,
    prs_duty: Collection<PrsContent>,
    prs_activity: Collection<PrsContent>,
    prs_gallery: Collection<PrsContent>,
    prs_org_charts: Collection<PrsContent>,
    psychometric_scores: Collection<PsychometricScore>,
    psychometric_evidences: Collection<PsychometricEvidence>,
    feedbacks: Collection<VisitorFeedback>,
    profile: Profile,
}

async fn load_collection<T: Record>(store: &dyn KeyValueStore, kind: CollectionKind) -> Collection<T> {
    let key = kind.storage_key();
    match store.get(key).await {
        Ok(Some(document)) => match Collection::from_document(kind, &document) {
            Ok(collection) => collection,
            Err(e) => {
                warn!(subsystem = "store", storage_key = key, error = %e, "Unparsable collection document, starting empty");
                Collection::new(kind)
            }
        },
        Ok(None) => Collection::new(kind),
        Err(e) => {
            warn!(subsystem = "store", storage_key = key, error = %e, "Failed to read collection, starting empty");
            Collection::new(kind)
        }
    }
}

async fn load_profile(store: &dyn KeyValueStore) -> Profile {
    match store.get(PROFILE_KEY).await {
        Ok(Some(document)) => serde_json::from_str(&document).unwrap_or_else(|e| {
            warn!(subsystem = "store", storage_key = PROFILE_KEY, error = %e, "Unparsable profile, using default");
            Profile::default()
        }),
        Ok(None) => Profile::default(),
        Err(e) => {
            warn!(subsystem = "store", storage_key = PROFILE_KEY, error = %e, "Failed to read profile, using default");
            Profile::default()
        }
    }
}

impl Dashboard {
    /// Read every collection and the profile. Never fails: missing or broken
    /// documents start empty.
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let s = store.as_ref();
        let dashboard = Self {
            records: load_collection(s, CollectionKind::Records).await,
            sessions: load_collection(s, CollectionKind::Sessions).await,
            bilik: load_collection(s, CollectionKind::Bilik).await,
            sumbangan: load_collection(s, CollectionKind::Sumbangan).await,
            bureaus: load_collection(s, CollectionKind::Bureaus).await,
            inovasi: load_collection(s, CollectionKind::Inovasi).await,
            rujukan: load_collection(s, CollectionKind::Rujukan).await,
            teachin: load_collection(s, CollectionKind::Teachin).await,
            assembly: load_collection(s, CollectionKind::Assembly).await,
            meeting: load_collection(s, CollectionKind::Meeting).await,
            training: load_collection(s, CollectionKind::Training).await,
            duty_weekly: load_collection(s, CollectionKind::DutyWeekly).await,
            success: load_collection(s, CollectionKind::Success).await,
            analisis: load_collection(s, CollectionKind::Analisis).await,
            prs_members: load_collection(s, CollectionKind::PrsMembers).await,
            prs_duty: load_collection(s, CollectionKind::PrsDuty).await,
            prs_activity: load_collection(s, CollectionKind::PrsActivity).await,
            prs_gallery: load_collection(s, CollectionKind::PrsGallery).await,
            prs_org_charts: load_collection(s, CollectionKind::PrsOrgCharts).await,
            psychometric_scores: load_collection(s, CollectionKind::PsychometricScores).await,
            psychometric_evidences: load_collection(s, CollectionKind::PsychometricEvidences).await,
            feedbacks: load_collection(s, CollectionKind::Feedbacks).await,
            profile: load_profile(s).await,
            mirror: None,
            revisions: std::array::from_fn(|_| AtomicU64::new(0)),
            store,
        };
        info!(
            subsystem = "store",
            records = dashboard.total_records(),
            "Dashboard loaded"
        );
        dashboard
    }

    /// Attach a remote mirror for the mirrored collections.
    pub fn with_mirror(mut self, mirror: Arc<dyn RemoteMirror>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    pub fn has_mirror(&self) -> bool {
        self.mirror.is_some()
    }

    pub fn collection(&self, kind: CollectionKind) -> &dyn DynCollection {
        match kind {
            CollectionKind::Records => &self.records,
            CollectionKind::Sessions => &self.sessions,
            CollectionKind::Bilik => &self.bilik,
            CollectionKind::Sumbangan => &self.sumbangan,
            CollectionKind::Bureaus => &self.bureaus,
            CollectionKind::Inovasi => &self.inovasi,
            CollectionKind::Rujukan => &self.rujukan,
            CollectionKind::Teachin => &self.teachin,
            CollectionKind::Assembly => &self.assembly,
            CollectionKind::Meeting => &self.meeting,
            CollectionKind::Training => &self.training,
            CollectionKind::DutyWeekly => &self.duty_weekly,
            CollectionKind::Success => &self.success,
            CollectionKind::Analisis => &self.analisis,
            CollectionKind::PrsMembers => &self.prs_members,
            CollectionKind::PrsDuty => &self.prs_duty,
            CollectionKind::PrsActivity => &self.prs_activity,
            CollectionKind::PrsGallery => &self.prs_gallery,
            CollectionKind::PrsOrgCharts => &self.prs_org_charts,
            CollectionKind::PsychometricScores => &self.psychometric_scores,
            CollectionKind::PsychometricEvidences => &self.psychometric_evidences,
            CollectionKind::Feedbacks => &self.feedbacks,
        }
    }

    fn collection_mut(&mut self, kind: CollectionKind) -> &mut dyn DynCollection {
        match kind {
            CollectionKind::Records => &mut self.records,
            CollectionKind::Sessions => &mut self.sessions,
            CollectionKind::Bilik => &mut self.bilik,
            CollectionKind::Sumbangan => &mut self.sumbangan,
            CollectionKind::Bureaus => &mut self.bureaus,
            CollectionKind::Inovasi => &mut self.inovasi,
            CollectionKind::Rujukan => &mut self.rujukan,
            CollectionKind::Teachin => &mut self.teachin,
            CollectionKind::Assembly => &mut self.assembly,
            CollectionKind::Meeting => &mut self.meeting,
            CollectionKind::Training => &mut self.training,
            CollectionKind::DutyWeekly => &mut self.duty_weekly,
            CollectionKind::Success => &mut self.success,
            CollectionKind::Analisis => &mut self.analisis,
            CollectionKind::PrsMembers => &mut self.prs_members,
            CollectionKind::PrsDuty => &mut self.prs_duty,
            CollectionKind::PrsActivity => &mut self.prs_activity,
            CollectionKind::PrsGallery => &mut self.prs_gallery,
            CollectionKind::PrsOrgCharts => &mut self.prs_org_charts,
            CollectionKind::PsychometricScores => &mut self.psychometric_scores,
            CollectionKind::PsychometricEvidences => &mut self.psychometric_evidences,
            CollectionKind::Feedbacks => &mut self.feedbacks,
        }
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    fn total_records(&self) -> usize {
        CollectionKind::ALL.iter().map(|k| self.collection(*k).len()).sum()
    }

    // =========================================================================
    // GATING
    // =========================================================================

    fn check_read(kind: CollectionKind, session: &SessionState) -> Result<()> {
        if kind.read_gated() && !session.can_read_sessions() {
            return Err(Error::Forbidden(format!("{} requires the access code", kind)));
        }
        Ok(())
    }

    fn check_create(kind: CollectionKind, session: &SessionState) -> Result<()> {
        if kind.visitor_writable() {
            return Ok(());
        }
        session.require_owner()
    }

    // =========================================================================
    // PERSISTENCE
    // =========================================================================

    /// Write the collection's document, then mirror it if applicable.
    pub async fn persist(&self, kind: CollectionKind, session: &SessionState) -> Result<()> {
        self.revisions[kind as usize].fetch_add(1, Ordering::SeqCst);
        let collection = self.collection(kind);
        let document = collection.to_document()?;
        self.store
            .set(kind.storage_key(), &document)
            .await
            .map_err(|e| Error::Storage(format!("{}: {}", kind.storage_key(), e)))?;
        debug!(subsystem = "store", collection = %kind, count = collection.len(), "Collection persisted");

        if let (Some(mirror), Some(module)) = (self.mirror.as_ref(), kind.remote_module()) {
            if kind == CollectionKind::Feedbacks || session.is_owner {
                let data = collection.list_json()?;
                spawn_push(Arc::clone(mirror), module, data);
            }
        }
        Ok(())
    }

    async fn persist_profile(&self) -> Result<()> {
        let document = serde_json::to_string(&self.profile)?;
        self.store
            .set(PROFILE_KEY, &document)
            .await
            .map_err(|e| Error::Storage(format!("{}: {}", PROFILE_KEY, e)))
    }

    /// Number of local writes to `kind` since the dashboard was loaded.
    pub fn revision(&self, kind: CollectionKind) -> u64 {
        self.revisions[kind as usize].load(Ordering::SeqCst)
    }

    /// Replace a collection with a snapshot fetched from the remote mirror and
    /// write it locally. Not mirrored back.
    ///
    /// `fetched_at` is the collection's [`revision`](Self::revision) read
    /// before the fetch started. If a local write happened since, the snapshot
    /// is stale and is dropped; returns whether it was applied.
    pub async fn apply_remote(
        &mut self,
        kind: CollectionKind,
        entries: Vec<JsonValue>,
        fetched_at: u64,
    ) -> Result<bool> {
        let current = self.revision(kind);
        if current != fetched_at {
            warn!(
                subsystem = "sync",
                collection = %kind,
                fetched_at,
                current,
                "Local write during remote fetch, keeping local collection"
            );
            return Ok(false);
        }

        let count = entries.len();
        self.collection_mut(kind).reset_json(JsonValue::Array(entries))?;
        let document = self.collection(kind).to_document()?;
        self.store
            .set(kind.storage_key(), &document)
            .await
            .map_err(|e| Error::Storage(format!("{}: {}", kind.storage_key(), e)))?;
        info!(subsystem = "sync", collection = %kind, count, "Applied remote snapshot");
        Ok(true)
    }

    // =========================================================================
    // RECORD CRUD
    // =========================================================================

    pub fn list(&self, kind: CollectionKind, session: &SessionState) -> Result<JsonValue> {
        Self::check_read(kind, session)?;
        self.collection(kind).list_json()
    }

    pub fn get(&self, kind: CollectionKind, id: &str, session: &SessionState) -> Result<JsonValue> {
        Self::check_read(kind, session)?;
        self.collection(kind).get_json(id)
    }

    /// Committees filed under one category.
    pub fn bureaus_by_category(&self, category: SumbanganCategory) -> Vec<&BureauRecord> {
        self.bureaus.iter().filter(|b| b.category == category).collect()
    }

    pub async fn create(&mut self, kind: CollectionKind, record: JsonValue, session: &SessionState) -> Result<JsonValue> {
        Self::check_create(kind, session)?;
        let created = self.collection_mut(kind).add_json(record)?;
        info!(subsystem = "store", collection = %kind, record_id = %created["id"], "Record created");
        self.persist(kind, session).await?;
        Ok(created)
    }

    pub async fn update(
        &mut self,
        kind: CollectionKind,
        id: &str,
        patch: &JsonValue,
        session: &SessionState,
    ) -> Result<JsonValue> {
        session.require_owner()?;
        let updated = self.collection_mut(kind).update_json(id, patch)?;
        self.persist(kind, session).await?;
        Ok(updated)
    }

    pub async fn replace(
        &mut self,
        kind: CollectionKind,
        id: &str,
        record: JsonValue,
        session: &SessionState,
    ) -> Result<JsonValue> {
        session.require_owner()?;
        let replaced = self.collection_mut(kind).replace_json(id, record)?;
        self.persist(kind, session).await?;
        Ok(replaced)
    }

    pub async fn delete(&mut self, kind: CollectionKind, id: &str, session: &SessionState) -> Result<JsonValue> {
        session.require_owner()?;
        let removed = self.collection_mut(kind).delete_json(id)?;
        info!(subsystem = "store", collection = %kind, record_id = %id, "Record deleted");
        self.persist(kind, session).await?;
        Ok(removed)
    }

    // =========================================================================
    // ATTACHMENTS
    // =========================================================================

    pub async fn add_attachments(
        &mut self,
        kind: CollectionKind,
        id: &str,
        slot: &str,
        attachments: Vec<Attachment>,
        session: &SessionState,
    ) -> Result<Vec<Attachment>> {
        session.require_owner()?;
        let added = self.collection_mut(kind).add_attachments(id, slot, attachments)?;
        self.persist(kind, session).await?;
        Ok(added)
    }

    pub async fn remove_attachment(
        &mut self,
        kind: CollectionKind,
        id: &str,
        slot: &str,
        attachment_id: &str,
        session: &SessionState,
    ) -> Result<Attachment> {
        session.require_owner()?;
        let removed = self.collection_mut(kind).remove_attachment(id, slot, attachment_id)?;
        self.persist(kind, session).await?;
        Ok(removed)
    }

    pub async fn replace_attachment(
        &mut self,
        kind: CollectionKind,
        id: &str,
        slot: &str,
        attachment_id: &str,
        replacement: Attachment,
        session: &SessionState,
    ) -> Result<Attachment> {
        session.require_owner()?;
        let replaced = self
            .collection_mut(kind)
            .replace_attachment(id, slot, attachment_id, replacement)?;
        self.persist(kind, session).await?;
        Ok(replaced)
    }

    pub async fn set_duty_details(
        &mut self,
        kind: CollectionKind,
        id: &str,
        slot: &str,
        attachment_id: &str,
        details: DutyDetails,
        session: &SessionState,
    ) -> Result<Attachment> {
        session.require_owner()?;
        let updated = self
            .collection_mut(kind)
            .set_duty_details(id, slot, attachment_id, details)?;
        self.persist(kind, session).await?;
        Ok(updated)
    }

    pub fn attachment(
        &self,
        kind: CollectionKind,
        id: &str,
        slot: &str,
        attachment_id: &str,
        session: &SessionState,
    ) -> Result<Attachment> {
        Self::check_read(kind, session)?;
        self.collection(kind).attachment(id, slot, attachment_id).cloned()
    }

    // =========================================================================
    // INTERACTIONS
    // =========================================================================

    fn interactions_mut(&mut self, target: &InteractionTarget) -> Result<&mut dyn Interactions> {
        match target {
            InteractionTarget::Attachment {
                kind,
                record_id,
                slot,
                attachment_id,
            } => {
                let att = self
                    .collection_mut(*kind)
                    .attachment_mut(record_id, slot, attachment_id)?;
                Ok(att)
            }
            InteractionTarget::Record { kind, record_id } => self.collection_mut(*kind).interactions_mut(record_id),
            InteractionTarget::ProfileAttachment { list, attachment_id } => {
                let att = self.profile.attachment_mut(*list, attachment_id)?;
                Ok(att)
            }
        }
    }

    async fn persist_target(&self, target: &InteractionTarget, session: &SessionState) -> Result<()> {
        match target.kind() {
            Some(kind) => self.persist(kind, session).await,
            None => self.persist_profile().await,
        }
    }

    /// Comment on an attachment or guestbook entry. Open to visitors. A blank
    /// name falls back to the profile name for administrators and to the
    /// visitor label otherwise.
    pub async fn add_comment(
        &mut self,
        target: &InteractionTarget,
        text: &str,
        user_name: Option<&str>,
        session: &SessionState,
    ) -> Result<Comment> {
        if let Some(kind) = target.kind() {
            Self::check_read(kind, session)?;
        }
        let name = match user_name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => name.to_string(),
            None if session.is_owner => self.profile.name.clone(),
            None => VISITOR_NAME.to_string(),
        };
        let comment = self.interactions_mut(target)?.add_comment(text, &name)?;
        self.persist_target(target, session).await?;
        Ok(comment)
    }

    /// Remove a comment. Administrator only; an unknown comment id is not an
    /// error and writes nothing.
    pub async fn delete_comment(
        &mut self,
        target: &InteractionTarget,
        comment_id: &str,
        session: &SessionState,
    ) -> Result<bool> {
        session.require_owner()?;
        let removed = self.interactions_mut(target)?.delete_comment(comment_id);
        if removed {
            self.persist_target(target, session).await?;
        }
        Ok(removed)
    }

    pub async fn add_reaction(
        &mut self,
        target: &InteractionTarget,
        emoji: &str,
        session: &SessionState,
    ) -> Result<Reaction> {
        if let Some(kind) = target.kind() {
            Self::check_read(kind, session)?;
        }
        let reaction = self.interactions_mut(target)?.add_reaction(emoji)?;
        self.persist_target(target, session).await?;
        Ok(reaction)
    }

    // =========================================================================
    // PROFILE
    // =========================================================================

    pub async fn update_profile(&mut self, patch: &JsonValue, session: &SessionState) -> Result<&Profile> {
        session.require_owner()?;
        self.profile.update(patch)?;
        self.persist_profile().await?;
        Ok(&self.profile)
    }

    pub async fn set_emotion(&mut self, emoji: &str, label: &str, session: &SessionState) -> Result<UserEmotion> {
        session.require_owner()?;
        let emotion = self.profile.set_emotion(emoji, label)?.clone();
        self.persist_profile().await?;
        Ok(emotion)
    }

    pub async fn update_kpi(&mut self, kind: KpiKind, value: f64, session: &SessionState) -> Result<&Profile> {
        session.require_owner()?;
        self.profile.update_kpi(kind, value)?;
        self.persist_profile().await?;
        Ok(&self.profile)
    }

    pub async fn set_holland_image(&mut self, code: &str, url: &str, session: &SessionState) -> Result<&Profile> {
        session.require_owner()?;
        self.profile.set_holland_image(code, url)?;
        self.persist_profile().await?;
        Ok(&self.profile)
    }

    pub async fn add_profile_attachments(
        &mut self,
        list: ProfileList,
        attachments: Vec<Attachment>,
        session: &SessionState,
    ) -> Result<Vec<Attachment>> {
        session.require_owner()?;
        let added = self.profile.add_attachments(list, attachments);
        self.persist_profile().await?;
        Ok(added)
    }

    pub async fn remove_profile_attachment(
        &mut self,
        list: ProfileList,
        attachment_id: &str,
        session: &SessionState,
    ) -> Result<Attachment> {
        session.require_owner()?;
        let removed = self.profile.remove_attachment(list, attachment_id)?;
        self.persist_profile().await?;
        Ok(removed)
    }

    // =========================================================================
    // STATISTICS
    // =========================================================================

    pub fn stats(&self) -> DashboardStats {
        let mut stats = DashboardStats {
            manual_kpi_individual: self.profile.manual_kpi_individual,
            manual_kpi_group: self.profile.manual_kpi_group,
            ..DashboardStats::default()
        };
        for kind in CollectionKind::ALL {
            let collection = self.collection(kind);
            stats.collections.insert(kind.as_str().to_string(), collection.len());
            stats.total_records += collection.len();
            stats.total_attachments += collection.attachment_count();
            stats.total_comments += collection.comment_count();
        }
        stats.total_attachments += self.profile.jadual_urls.len() + self.profile.takwim_urls.len();

        if !self.feedbacks.is_empty() {
            let sum: u32 = self.feedbacks.iter().map(|f| u32::from(f.rating)).sum();
            stats.average_rating = Some(f64::from(sum) / self.feedbacks.len() as f64);
        }
        stats
    }
}

fn spawn_push(mirror: Arc<dyn RemoteMirror>, module: &'static str, data: JsonValue) {
    tokio::spawn(async move {
        match mirror.push(module, &data).await {
            Ok(()) => debug!(subsystem = "sync", module, "Remote mirror updated"),
            Err(e) => warn!(subsystem = "sync", module, error = %e, "Remote mirror push failed"),
        }
    });
}
