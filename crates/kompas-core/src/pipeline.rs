//! # Pipeline Orchestrator
//!
//! Sequences the four assessment stages and owns the confirm/load
//! boundary: a stage's `confirm` is the only way downstream stages
//! ever see updated baseline data. Live, unconfirmed edits never leak
//! downstream.
//!
//! ## State machine (per stage)
//!
//! ```text
//! Empty ──open/update──▶ Editing ──confirm──▶ Confirmed
//!                           ▲                     │
//!                           └───────update────────┘
//! ```
//!
//! `Confirmed` is not terminal: a stage may be re-opened for edit at
//! any time, but the last-confirmed snapshot stays visible to
//! downstream stages until a new confirm succeeds.
//!
//! ## Baseline capture
//!
//! Downstream baselines are captured when a stage is opened and kept
//! for the life of the working copy. Confirming an upstream stage
//! refreshes the captured baselines of already-open downstream stages;
//! nothing else does.

use serde::{Deserialize, Serialize};

use crate::stages::{
    bd_baseline::{
        self, BdBaselineCalculations, BdBaselineConfirmed, BdBaselineDraft, BdBaselinePatch,
        BdBaselineRecord,
    },
    human_capital::{
        self, HumanCapitalCalculations, HumanCapitalConfirmed, HumanCapitalDraft,
        HumanCapitalPatch, HumanCapitalRecord,
    },
    keys, now_millis,
    revenue::{self, RevenueCalculations, RevenueConfirmed, RevenueDraft, RevenuePatch, RevenueRecord},
    target_acquisition::{
        self, RevenueBaseline, TargetAcquisitionCalculations, TargetAcquisitionDocument,
        TargetAcquisitionPatch, TargetAcquisitionRecord,
    },
};
use crate::store::{KeyValueStore, StoreBackend, load_document, save_document};
use crate::types::KompasError;
use std::path::Path;

// =============================================================================
// STAGE IDENTITY
// =============================================================================

/// The four pipeline stages in flow order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageId {
    Revenue,
    HumanCapital,
    TargetAcquisition,
    BdBaseline,
}

/// All stages in flow order.
pub const ALL_STAGES: [StageId; 4] = [
    StageId::Revenue,
    StageId::HumanCapital,
    StageId::TargetAcquisition,
    StageId::BdBaseline,
];

impl StageId {
    /// Get the stage name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            StageId::Revenue => "Revenue",
            StageId::HumanCapital => "Human Capital",
            StageId::TargetAcquisition => "Target Acquisition",
            StageId::BdBaseline => "BD Baseline",
        }
    }

    /// Get the CLI/API slug for this stage.
    #[must_use]
    pub fn slug(&self) -> &'static str {
        match self {
            StageId::Revenue => "revenue",
            StageId::HumanCapital => "human-capital",
            StageId::TargetAcquisition => "target-acquisition",
            StageId::BdBaseline => "bd-baseline",
        }
    }

    /// Parse a stage from its slug.
    pub fn parse(slug: &str) -> Result<Self, KompasError> {
        match slug {
            "revenue" => Ok(StageId::Revenue),
            "human-capital" => Ok(StageId::HumanCapital),
            "target-acquisition" => Ok(StageId::TargetAcquisition),
            "bd-baseline" => Ok(StageId::BdBaseline),
            other => Err(KompasError::InvalidStage(other.to_string())),
        }
    }

    /// Get the next stage, if any.
    #[must_use]
    pub fn next(&self) -> Option<StageId> {
        match self {
            StageId::Revenue => Some(StageId::HumanCapital),
            StageId::HumanCapital => Some(StageId::TargetAcquisition),
            StageId::TargetAcquisition => Some(StageId::BdBaseline),
            StageId::BdBaseline => None,
        }
    }

    /// Get the previous stage, if any.
    #[must_use]
    pub fn previous(&self) -> Option<StageId> {
        match self {
            StageId::Revenue => None,
            StageId::HumanCapital => Some(StageId::Revenue),
            StageId::TargetAcquisition => Some(StageId::HumanCapital),
            StageId::BdBaseline => Some(StageId::TargetAcquisition),
        }
    }

    /// Check if this stage is the last one.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, StageId::BdBaseline)
    }
}

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// STAGE STATUS
// =============================================================================

/// Lifecycle state of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageStatus {
    /// Never visited: no draft, no confirmed snapshot.
    Empty,
    /// Has a draft (or live working copy) newer than any confirm.
    Editing,
    /// The current record is the confirmed baseline.
    Confirmed,
}

impl std::fmt::Display for StageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            StageStatus::Empty => "empty",
            StageStatus::Editing => "editing",
            StageStatus::Confirmed => "confirmed",
        };
        write!(f, "{label}")
    }
}

// =============================================================================
// STAGE VIEWS
// =============================================================================

/// Snapshot of the revenue stage for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueView {
    pub record: RevenueRecord,
    pub calculations: RevenueCalculations,
    pub status: StageStatus,
}

/// Snapshot of the human capital stage for rendering.
///
/// `calculations` is `None` while revenue is unconfirmed: a "complete
/// the previous step" state, never a fake zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanCapitalView {
    pub record: HumanCapitalRecord,
    pub total_units_per_month: Option<f64>,
    pub calculations: Option<HumanCapitalCalculations>,
    pub status: StageStatus,
}

/// Snapshot of the target acquisition stage for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetAcquisitionView {
    pub record: TargetAcquisitionRecord,
    pub revenue_baseline: Option<RevenueBaseline>,
    pub calculations: Option<TargetAcquisitionCalculations>,
    pub status: StageStatus,
}

/// Snapshot of the BD baseline stage for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BdBaselineView {
    pub record: BdBaselineRecord,
    pub calculations: BdBaselineCalculations,
    pub status: StageStatus,
}

/// Status of one stage in the overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageOverview {
    pub stage: StageId,
    pub name: String,
    pub status: StageStatus,
}

/// Status of the whole pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOverview {
    pub stages: Vec<StageOverview>,
}

// =============================================================================
// WORKING COPIES
// =============================================================================

/// In-memory working copy of the revenue stage.
#[derive(Debug, Clone)]
struct RevenueSlot {
    record: RevenueRecord,
    status: StageStatus,
}

/// In-memory working copy of the human capital stage, with the
/// baseline captured at open time.
#[derive(Debug, Clone)]
struct HumanCapitalSlot {
    record: HumanCapitalRecord,
    total_units_per_month: Option<f64>,
    status: StageStatus,
}

/// In-memory working copy of the target acquisition stage.
#[derive(Debug, Clone)]
struct TargetAcquisitionSlot {
    record: TargetAcquisitionRecord,
    revenue_baseline: Option<RevenueBaseline>,
    status: StageStatus,
}

/// In-memory working copy of the BD baseline stage.
#[derive(Debug, Clone)]
struct BdBaselineSlot {
    record: BdBaselineRecord,
    status: StageStatus,
}

// =============================================================================
// PIPELINE
// =============================================================================

/// The assessment pipeline: four stages over one document store.
///
/// Single-threaded and synchronous: every update recomputes derived
/// fields immediately, and cross-stage reads happen only at stage-open
/// time.
#[derive(Debug, Default)]
pub struct Pipeline {
    store: StoreBackend,
    revenue: Option<RevenueSlot>,
    human_capital: Option<HumanCapitalSlot>,
    target_acquisition: Option<TargetAcquisitionSlot>,
    bd_baseline: Option<BdBaselineSlot>,
}

impl Pipeline {
    /// Create a pipeline over a fresh in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pipeline over a redb store at the given path.
    pub fn with_redb(path: impl AsRef<Path>) -> Result<Self, KompasError> {
        Ok(Self::with_backend(StoreBackend::open_redb(path)?))
    }

    /// Create a pipeline over an existing backend.
    #[must_use]
    pub fn with_backend(store: StoreBackend) -> Self {
        Self {
            store,
            ..Self::default()
        }
    }

    /// Check if the underlying store persists across sessions.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        self.store.is_persistent()
    }

    /// Remove every stage document and drop all working copies.
    pub fn reset(&mut self) -> Result<(), KompasError> {
        for key in [
            keys::REVENUE_DATA,
            keys::REVENUE_CONFIRMED,
            keys::HUMAN_CAPITAL_DATA,
            keys::HUMAN_CAPITAL_CONFIRMED,
            keys::TARGET_ACQUISITION_DATA,
            keys::BD_BASELINE_DATA,
            keys::BD_BASELINE_CONFIRMED,
        ] {
            self.store.remove(key)?;
        }
        self.revenue = None;
        self.human_capital = None;
        self.target_acquisition = None;
        self.bd_baseline = None;
        Ok(())
    }

    // =========================================================================
    // STATUS
    // =========================================================================

    /// Current lifecycle state of one stage.
    ///
    /// A live working copy wins; otherwise the persisted documents
    /// decide (confirmed snapshot, then draft, then empty).
    pub fn status(&self, stage: StageId) -> Result<StageStatus, KompasError> {
        match stage {
            StageId::Revenue => {
                if let Some(slot) = &self.revenue {
                    return Ok(slot.status);
                }
                self.stored_status(keys::REVENUE_CONFIRMED, keys::REVENUE_DATA)
            }
            StageId::HumanCapital => {
                if let Some(slot) = &self.human_capital {
                    return Ok(slot.status);
                }
                self.stored_status(keys::HUMAN_CAPITAL_CONFIRMED, keys::HUMAN_CAPITAL_DATA)
            }
            StageId::TargetAcquisition => {
                if let Some(slot) = &self.target_acquisition {
                    return Ok(slot.status);
                }
                let doc: Option<TargetAcquisitionDocument> =
                    load_document(&self.store, keys::TARGET_ACQUISITION_DATA)?;
                Ok(match doc {
                    Some(doc) if doc.confirmed => StageStatus::Confirmed,
                    Some(_) => StageStatus::Editing,
                    None => StageStatus::Empty,
                })
            }
            StageId::BdBaseline => {
                if let Some(slot) = &self.bd_baseline {
                    return Ok(slot.status);
                }
                self.stored_status(keys::BD_BASELINE_CONFIRMED, keys::BD_BASELINE_DATA)
            }
        }
    }

    fn stored_status(&self, confirmed_key: &str, draft_key: &str) -> Result<StageStatus, KompasError> {
        #[derive(Deserialize)]
        struct Stamped {
            timestamp: u64,
        }
        let confirmed: Option<Stamped> = load_document(&self.store, confirmed_key)?;
        let draft: Option<Stamped> = load_document(&self.store, draft_key)?;
        Ok(match (confirmed, draft) {
            // A draft saved after the last confirm means the stage was
            // re-opened for edit; confirm rewrites both with one stamp.
            (Some(confirmed), Some(draft)) if draft.timestamp > confirmed.timestamp => {
                StageStatus::Editing
            }
            (Some(_), _) => StageStatus::Confirmed,
            (None, Some(_)) => StageStatus::Editing,
            (None, None) => StageStatus::Empty,
        })
    }

    /// Status of every stage in flow order.
    pub fn overview(&self) -> Result<PipelineOverview, KompasError> {
        let mut stages = Vec::with_capacity(ALL_STAGES.len());
        for stage in ALL_STAGES {
            stages.push(StageOverview {
                stage,
                name: stage.name().to_string(),
                status: self.status(stage)?,
            });
        }
        Ok(PipelineOverview { stages })
    }

    /// Error unless `stage`'s predecessor has been confirmed.
    fn require_upstream_confirmed(&self, stage: StageId) -> Result<(), KompasError> {
        let Some(previous) = stage.previous() else {
            return Ok(());
        };
        // The working copy of the previous stage may be mid-edit; what
        // matters is the persisted confirmed snapshot.
        let confirmed = match previous {
            StageId::Revenue => self.store.get_raw(keys::REVENUE_CONFIRMED)?.is_some(),
            StageId::HumanCapital => self.store.get_raw(keys::HUMAN_CAPITAL_CONFIRMED)?.is_some(),
            StageId::TargetAcquisition => {
                let doc: Option<TargetAcquisitionDocument> =
                    load_document(&self.store, keys::TARGET_ACQUISITION_DATA)?;
                doc.is_some_and(|d| d.confirmed)
            }
            StageId::BdBaseline => self.store.get_raw(keys::BD_BASELINE_CONFIRMED)?.is_some(),
        };
        if confirmed {
            Ok(())
        } else {
            Err(KompasError::MissingUpstreamData(previous))
        }
    }

    /// The confirmed revenue record, if revenue has ever been confirmed.
    fn confirmed_revenue(&self) -> Result<Option<RevenueConfirmed>, KompasError> {
        load_document(&self.store, keys::REVENUE_CONFIRMED)
    }

    // =========================================================================
    // REVENUE STAGE
    // =========================================================================

    /// Open the revenue stage, loading the draft (or the confirmed
    /// snapshot, or the default record).
    pub fn open_revenue(&mut self) -> Result<RevenueView, KompasError> {
        if self.revenue.is_none() {
            let draft: Option<RevenueDraft> = load_document(&self.store, keys::REVENUE_DATA)?;
            let slot = match draft {
                Some(draft) => RevenueSlot {
                    record: draft.revenue_data,
                    status: self.stored_status(keys::REVENUE_CONFIRMED, keys::REVENUE_DATA)?,
                },
                None => match self.confirmed_revenue()? {
                    Some(confirmed) => RevenueSlot {
                        record: confirmed.revenue_data,
                        status: StageStatus::Confirmed,
                    },
                    None => RevenueSlot {
                        record: RevenueRecord::default(),
                        status: StageStatus::Empty,
                    },
                },
            };
            self.revenue = Some(slot);
        }
        Ok(self.revenue_view())
    }

    fn revenue_view(&self) -> RevenueView {
        // Slot is always populated by open_revenue before this runs.
        let slot = self.revenue.as_ref().map_or_else(
            || RevenueSlot {
                record: RevenueRecord::default(),
                status: StageStatus::Empty,
            },
            Clone::clone,
        );
        RevenueView {
            calculations: revenue::compute(&slot.record),
            record: slot.record,
            status: slot.status,
        }
    }

    /// Merge a patch into the revenue working copy and recompute.
    pub fn update_revenue(&mut self, patch: &RevenuePatch) -> Result<RevenueView, KompasError> {
        self.open_revenue()?;
        if let Some(slot) = self.revenue.as_mut() {
            slot.record = slot.record.merged(patch);
            slot.status = StageStatus::Editing;
        }
        Ok(self.revenue_view())
    }

    /// Persist the revenue working copy as a draft.
    pub fn save_revenue_draft(&mut self) -> Result<(), KompasError> {
        self.open_revenue()?;
        let view = self.revenue_view();
        let draft = RevenueDraft {
            revenue_data: view.record,
            calculations: view.calculations,
            timestamp: now_millis(),
        };
        save_document(&mut self.store, keys::REVENUE_DATA, &draft)
    }

    /// Promote the revenue working copy to the confirmed baseline.
    ///
    /// Refreshes the captured baselines of already-open downstream
    /// stages: this is the only path by which they change.
    pub fn confirm_revenue(&mut self) -> Result<RevenueView, KompasError> {
        self.open_revenue()?;
        let view = self.revenue_view();
        let timestamp = now_millis();

        let confirmed = RevenueConfirmed {
            revenue_data: view.record.clone(),
            calculations: view.calculations,
            confirmed: true,
            timestamp,
        };
        save_document(&mut self.store, keys::REVENUE_CONFIRMED, &confirmed)?;

        let draft = RevenueDraft {
            revenue_data: view.record.clone(),
            calculations: view.calculations,
            timestamp,
        };
        save_document(&mut self.store, keys::REVENUE_DATA, &draft)?;

        if let Some(slot) = self.revenue.as_mut() {
            slot.status = StageStatus::Confirmed;
        }

        // Confirm is the one event that updates downstream baselines.
        if let Some(slot) = self.human_capital.as_mut() {
            slot.total_units_per_month = Some(view.calculations.total_units_per_month);
        }
        if let Some(slot) = self.target_acquisition.as_mut() {
            slot.revenue_baseline = Some(RevenueBaseline::from_revenue(&view.record));
        }

        Ok(self.revenue_view())
    }

    // =========================================================================
    // HUMAN CAPITAL STAGE
    // =========================================================================

    /// Open the human capital stage, capturing the revenue baseline.
    pub fn open_human_capital(&mut self) -> Result<HumanCapitalView, KompasError> {
        if self.human_capital.is_none() {
            let baseline = self
                .confirmed_revenue()?
                .map(|c| c.calculations.total_units_per_month);

            let draft: Option<HumanCapitalDraft> =
                load_document(&self.store, keys::HUMAN_CAPITAL_DATA)?;
            let slot = match draft {
                Some(draft) => HumanCapitalSlot {
                    record: draft.human_capital_data,
                    total_units_per_month: baseline,
                    status: self
                        .stored_status(keys::HUMAN_CAPITAL_CONFIRMED, keys::HUMAN_CAPITAL_DATA)?,
                },
                None => {
                    let confirmed: Option<HumanCapitalConfirmed> =
                        load_document(&self.store, keys::HUMAN_CAPITAL_CONFIRMED)?;
                    match confirmed {
                        Some(confirmed) => HumanCapitalSlot {
                            record: confirmed.human_capital_data,
                            total_units_per_month: baseline,
                            status: StageStatus::Confirmed,
                        },
                        None => HumanCapitalSlot {
                            record: HumanCapitalRecord::default(),
                            total_units_per_month: baseline,
                            status: StageStatus::Empty,
                        },
                    }
                }
            };
            self.human_capital = Some(slot);
        }
        Ok(self.human_capital_view())
    }

    fn human_capital_view(&self) -> HumanCapitalView {
        let slot = self.human_capital.as_ref().map_or_else(
            || HumanCapitalSlot {
                record: HumanCapitalRecord::default(),
                total_units_per_month: None,
                status: StageStatus::Empty,
            },
            Clone::clone,
        );
        HumanCapitalView {
            calculations: human_capital::compute(&slot.record, slot.total_units_per_month),
            record: slot.record,
            total_units_per_month: slot.total_units_per_month,
            status: slot.status,
        }
    }

    /// Merge a patch into the human capital working copy and recompute.
    pub fn update_human_capital(
        &mut self,
        patch: &HumanCapitalPatch,
    ) -> Result<HumanCapitalView, KompasError> {
        self.open_human_capital()?;
        if let Some(slot) = self.human_capital.as_mut() {
            slot.record = slot.record.merged(patch);
            slot.status = StageStatus::Editing;
        }
        Ok(self.human_capital_view())
    }

    /// Persist the human capital working copy as a draft.
    pub fn save_human_capital_draft(&mut self) -> Result<(), KompasError> {
        self.open_human_capital()?;
        let view = self.human_capital_view();
        let draft = HumanCapitalDraft {
            human_capital_data: view.record,
            total_units_per_month: view.total_units_per_month,
            calculations: view.calculations,
            timestamp: now_millis(),
        };
        save_document(&mut self.store, keys::HUMAN_CAPITAL_DATA, &draft)
    }

    /// Promote the human capital working copy to the confirmed baseline.
    ///
    /// Requires the revenue stage to be confirmed; without its unit
    /// volume there are no calculations to confirm.
    pub fn confirm_human_capital(&mut self) -> Result<HumanCapitalView, KompasError> {
        self.require_upstream_confirmed(StageId::HumanCapital)?;
        self.open_human_capital()?;

        let view = self.human_capital_view();
        let (Some(units), Some(calculations)) = (view.total_units_per_month, view.calculations)
        else {
            // Upstream was confirmed after this stage was opened with no
            // baseline; the working copy predates the snapshot.
            return Err(KompasError::MissingUpstreamData(StageId::Revenue));
        };

        let timestamp = now_millis();
        let confirmed = HumanCapitalConfirmed {
            human_capital_data: view.record.clone(),
            total_units_per_month: units,
            calculations,
            confirmed: true,
            timestamp,
        };
        save_document(&mut self.store, keys::HUMAN_CAPITAL_CONFIRMED, &confirmed)?;

        let draft = HumanCapitalDraft {
            human_capital_data: view.record,
            total_units_per_month: Some(units),
            calculations: Some(calculations),
            timestamp,
        };
        save_document(&mut self.store, keys::HUMAN_CAPITAL_DATA, &draft)?;

        if let Some(slot) = self.human_capital.as_mut() {
            slot.status = StageStatus::Confirmed;
        }
        Ok(self.human_capital_view())
    }

    // =========================================================================
    // TARGET ACQUISITION STAGE
    // =========================================================================

    /// Open the target acquisition stage, capturing the unit-economics
    /// baseline from confirmed revenue.
    pub fn open_target_acquisition(&mut self) -> Result<TargetAcquisitionView, KompasError> {
        if self.target_acquisition.is_none() {
            let baseline = self
                .confirmed_revenue()?
                .map(|c| RevenueBaseline::from_revenue(&c.revenue_data));

            let doc: Option<TargetAcquisitionDocument> =
                load_document(&self.store, keys::TARGET_ACQUISITION_DATA)?;
            let slot = match doc {
                Some(doc) => TargetAcquisitionSlot {
                    record: doc.target_data,
                    revenue_baseline: baseline,
                    status: if doc.confirmed {
                        StageStatus::Confirmed
                    } else {
                        StageStatus::Editing
                    },
                },
                None => TargetAcquisitionSlot {
                    record: TargetAcquisitionRecord::default(),
                    revenue_baseline: baseline,
                    status: StageStatus::Empty,
                },
            };
            self.target_acquisition = Some(slot);
        }
        Ok(self.target_acquisition_view())
    }

    fn target_acquisition_view(&self) -> TargetAcquisitionView {
        let slot = self.target_acquisition.as_ref().map_or_else(
            || TargetAcquisitionSlot {
                record: TargetAcquisitionRecord::default(),
                revenue_baseline: None,
                status: StageStatus::Empty,
            },
            Clone::clone,
        );
        TargetAcquisitionView {
            calculations: target_acquisition::compute(&slot.record, slot.revenue_baseline.as_ref()),
            record: slot.record,
            revenue_baseline: slot.revenue_baseline,
            status: slot.status,
        }
    }

    /// Merge a patch into the target acquisition working copy and recompute.
    pub fn update_target_acquisition(
        &mut self,
        patch: &TargetAcquisitionPatch,
    ) -> Result<TargetAcquisitionView, KompasError> {
        self.open_target_acquisition()?;
        if let Some(slot) = self.target_acquisition.as_mut() {
            slot.record = slot.record.merged(patch);
            slot.status = StageStatus::Editing;
        }
        Ok(self.target_acquisition_view())
    }

    /// Persist the target acquisition working copy as a draft.
    pub fn save_target_acquisition_draft(&mut self) -> Result<(), KompasError> {
        self.open_target_acquisition()?;
        let view = self.target_acquisition_view();
        let doc = TargetAcquisitionDocument {
            target_data: view.record,
            revenue_baseline: view.revenue_baseline,
            calculations: view.calculations,
            confirmed: false,
            timestamp: now_millis(),
        };
        save_document(&mut self.store, keys::TARGET_ACQUISITION_DATA, &doc)
    }

    /// Promote the target acquisition working copy to confirmed.
    ///
    /// Requires human capital to be confirmed (pipeline order) and the
    /// revenue baseline to be present.
    pub fn confirm_target_acquisition(&mut self) -> Result<TargetAcquisitionView, KompasError> {
        self.require_upstream_confirmed(StageId::TargetAcquisition)?;
        self.open_target_acquisition()?;

        let view = self.target_acquisition_view();
        if view.revenue_baseline.is_none() {
            return Err(KompasError::MissingUpstreamData(StageId::Revenue));
        }

        let doc = TargetAcquisitionDocument {
            target_data: view.record,
            revenue_baseline: view.revenue_baseline,
            calculations: view.calculations,
            confirmed: true,
            timestamp: now_millis(),
        };
        save_document(&mut self.store, keys::TARGET_ACQUISITION_DATA, &doc)?;

        if let Some(slot) = self.target_acquisition.as_mut() {
            slot.status = StageStatus::Confirmed;
        }
        Ok(self.target_acquisition_view())
    }

    // =========================================================================
    // BD BASELINE STAGE
    // =========================================================================

    /// Open the BD baseline stage.
    pub fn open_bd_baseline(&mut self) -> Result<BdBaselineView, KompasError> {
        if self.bd_baseline.is_none() {
            let draft: Option<BdBaselineDraft> =
                load_document(&self.store, keys::BD_BASELINE_DATA)?;
            let slot = match draft {
                Some(draft) => BdBaselineSlot {
                    record: draft.baseline,
                    status: self
                        .stored_status(keys::BD_BASELINE_CONFIRMED, keys::BD_BASELINE_DATA)?,
                },
                None => {
                    let confirmed: Option<BdBaselineConfirmed> =
                        load_document(&self.store, keys::BD_BASELINE_CONFIRMED)?;
                    match confirmed {
                        Some(confirmed) => BdBaselineSlot {
                            record: confirmed.baseline_data,
                            status: StageStatus::Confirmed,
                        },
                        None => BdBaselineSlot {
                            record: BdBaselineRecord::default(),
                            status: StageStatus::Empty,
                        },
                    }
                }
            };
            self.bd_baseline = Some(slot);
        }
        Ok(self.bd_baseline_view())
    }

    fn bd_baseline_view(&self) -> BdBaselineView {
        let slot = self.bd_baseline.as_ref().map_or_else(
            || BdBaselineSlot {
                record: BdBaselineRecord::default(),
                status: StageStatus::Empty,
            },
            Clone::clone,
        );
        BdBaselineView {
            calculations: bd_baseline::compute(&slot.record),
            record: slot.record,
            status: slot.status,
        }
    }

    /// Merge a patch into the BD baseline working copy and recompute.
    pub fn update_bd_baseline(
        &mut self,
        patch: &BdBaselinePatch,
    ) -> Result<BdBaselineView, KompasError> {
        self.open_bd_baseline()?;
        if let Some(slot) = self.bd_baseline.as_mut() {
            slot.record = slot.record.merged(patch);
            slot.status = StageStatus::Editing;
        }
        Ok(self.bd_baseline_view())
    }

    /// Persist the BD baseline working copy as a draft.
    ///
    /// The draft document carries no calculations; they are recomputed
    /// on load.
    pub fn save_bd_baseline_draft(&mut self) -> Result<(), KompasError> {
        self.open_bd_baseline()?;
        let view = self.bd_baseline_view();
        let draft = BdBaselineDraft {
            baseline: view.record,
            timestamp: now_millis(),
        };
        save_document(&mut self.store, keys::BD_BASELINE_DATA, &draft)
    }

    /// Promote the BD baseline working copy to confirmed.
    pub fn confirm_bd_baseline(&mut self) -> Result<BdBaselineView, KompasError> {
        self.require_upstream_confirmed(StageId::BdBaseline)?;
        self.open_bd_baseline()?;

        let view = self.bd_baseline_view();
        let timestamp = now_millis();

        let confirmed = BdBaselineConfirmed {
            baseline_data: view.record.clone(),
            calculations: view.calculations,
            confirmed: true,
            timestamp,
        };
        save_document(&mut self.store, keys::BD_BASELINE_CONFIRMED, &confirmed)?;

        let draft = BdBaselineDraft {
            baseline: view.record,
            timestamp,
        };
        save_document(&mut self.store, keys::BD_BASELINE_DATA, &draft)?;

        if let Some(slot) = self.bd_baseline.as_mut() {
            slot.status = StageStatus::Confirmed;
        }
        Ok(self.bd_baseline_view())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn revenue_patch() -> RevenuePatch {
        RevenuePatch {
            product_name: Some("Retainer".to_string()),
            avg_gross_per_unit: Some(2500.0),
            avg_orders_per_month_per_customer: Some(2.0),
            total_customers: Some(15),
        }
    }

    #[test]
    fn stage_order() {
        assert_eq!(StageId::Revenue.next(), Some(StageId::HumanCapital));
        assert_eq!(StageId::BdBaseline.next(), None);
        assert_eq!(StageId::Revenue.previous(), None);
        assert_eq!(
            StageId::BdBaseline.previous(),
            Some(StageId::TargetAcquisition)
        );
        assert!(StageId::BdBaseline.is_terminal());
        assert!(!StageId::Revenue.is_terminal());
    }

    #[test]
    fn stage_slug_round_trip() {
        for stage in ALL_STAGES {
            assert_eq!(StageId::parse(stage.slug()).expect("parse"), stage);
        }
        assert!(matches!(
            StageId::parse("warehouse"),
            Err(KompasError::InvalidStage(_))
        ));
    }

    #[test]
    fn fresh_pipeline_is_empty() {
        let pipeline = Pipeline::new();
        let overview = pipeline.overview().expect("overview");
        assert_eq!(overview.stages.len(), 4);
        for stage in &overview.stages {
            assert_eq!(stage.status, StageStatus::Empty);
        }
    }

    #[test]
    fn update_moves_stage_to_editing() {
        let mut pipeline = Pipeline::new();
        pipeline.update_revenue(&revenue_patch()).expect("update");
        assert_eq!(
            pipeline.status(StageId::Revenue).expect("status"),
            StageStatus::Editing
        );
    }

    #[test]
    fn confirm_revenue_publishes_baseline() {
        let mut pipeline = Pipeline::new();
        pipeline.update_revenue(&revenue_patch()).expect("update");
        let view = pipeline.confirm_revenue().expect("confirm");

        assert_eq!(view.status, StageStatus::Confirmed);
        assert_eq!(view.calculations.total_units_per_month, 30.0);

        let hc = pipeline.open_human_capital().expect("open");
        assert_eq!(hc.total_units_per_month, Some(30.0));
    }

    #[test]
    fn unconfirmed_revenue_leaves_downstream_without_baseline() {
        let mut pipeline = Pipeline::new();
        pipeline.update_revenue(&revenue_patch()).expect("update");
        // No confirm: downstream must see a "not yet available" state.
        let hc = pipeline.open_human_capital().expect("open");
        assert_eq!(hc.total_units_per_month, None);
        assert_eq!(hc.calculations, None);
    }

    #[test]
    fn unconfirmed_edit_does_not_move_loaded_baseline() {
        let mut pipeline = Pipeline::new();
        pipeline.update_revenue(&revenue_patch()).expect("update");
        pipeline.confirm_revenue().expect("confirm");

        let hc = pipeline.open_human_capital().expect("open");
        assert_eq!(hc.total_units_per_month, Some(30.0));

        // Edit revenue without confirming: the loaded baseline holds.
        pipeline
            .update_revenue(&RevenuePatch {
                total_customers: Some(100),
                ..RevenuePatch::default()
            })
            .expect("update");
        let hc = pipeline.open_human_capital().expect("open");
        assert_eq!(hc.total_units_per_month, Some(30.0));

        // Re-confirming is the one event that moves it.
        pipeline.confirm_revenue().expect("confirm");
        let hc = pipeline.open_human_capital().expect("open");
        assert_eq!(hc.total_units_per_month, Some(200.0));
    }

    #[test]
    fn confirm_out_of_order_is_rejected() {
        let mut pipeline = Pipeline::new();
        let err = pipeline.confirm_human_capital().expect_err("must fail");
        assert!(matches!(
            err,
            KompasError::MissingUpstreamData(StageId::Revenue)
        ));

        let err = pipeline.confirm_bd_baseline().expect_err("must fail");
        assert!(matches!(
            err,
            KompasError::MissingUpstreamData(StageId::TargetAcquisition)
        ));
    }

    #[test]
    fn full_pipeline_walkthrough() {
        let mut pipeline = Pipeline::new();

        pipeline.update_revenue(&revenue_patch()).expect("update");
        pipeline.confirm_revenue().expect("confirm revenue");

        pipeline
            .update_human_capital(&HumanCapitalPatch {
                total_team_members: Some(3),
                avg_hours_per_week: Some(40.0),
                founder_hours_per_week: Some(50.0),
                hours_per_unit: Some(8.0),
                contractor_hours: Some(60.0),
            })
            .expect("update");
        let hc = pipeline.confirm_human_capital().expect("confirm hc");
        assert_eq!(
            hc.calculations.expect("calcs").total_needed_hours,
            240.0
        );

        pipeline
            .update_target_acquisition(&TargetAcquisitionPatch {
                previous_revenue: Some(900_000.0),
                target_revenue: Some(1_350_000.0),
                time_horizon_months: Some(12),
            })
            .expect("update");
        let ta = pipeline.confirm_target_acquisition().expect("confirm ta");
        assert_eq!(ta.calculations.expect("calcs").new_customers_needed, 90.0);

        pipeline
            .update_bd_baseline(&BdBaselinePatch {
                social_followers: Some(5_000),
                email_list_size: Some(2_000),
                website_traffic: Some(3_000),
                active_leads: Some(50),
                monthly_spend: Some(4_000.0),
                primary_channel: Some("GOOGLE_ADS".to_string()),
            })
            .expect("update");
        let bd = pipeline.confirm_bd_baseline().expect("confirm bd");
        assert_eq!(bd.calculations.monthly_leads, 200.0);

        let overview = pipeline.overview().expect("overview");
        for stage in &overview.stages {
            assert_eq!(stage.status, StageStatus::Confirmed, "{}", stage.name);
        }
    }

    #[test]
    fn reconfirm_keeps_snapshot_until_new_confirm() {
        let mut pipeline = Pipeline::new();
        pipeline.update_revenue(&revenue_patch()).expect("update");
        pipeline.confirm_revenue().expect("confirm");

        // Re-open for edit: status drops to Editing but the stored
        // snapshot is untouched.
        pipeline
            .update_revenue(&RevenuePatch {
                total_customers: Some(1),
                ..RevenuePatch::default()
            })
            .expect("update");
        assert_eq!(
            pipeline.status(StageId::Revenue).expect("status"),
            StageStatus::Editing
        );

        // A second pipeline over the same store would still see the
        // confirmed snapshot; here we check via the upstream gate.
        pipeline
            .update_human_capital(&HumanCapitalPatch {
                hours_per_unit: Some(1.0),
                ..HumanCapitalPatch::default()
            })
            .expect("update");
        pipeline.confirm_human_capital().expect("gate still open");
    }

    #[test]
    fn malformed_draft_falls_back_to_default() {
        let mut pipeline = Pipeline::new();
        pipeline
            .store
            .put_raw(keys::REVENUE_DATA, "{broken json")
            .expect("put");

        let view = pipeline.open_revenue().expect("open");
        assert_eq!(view.record, RevenueRecord::default());
    }

    #[test]
    fn reset_clears_everything() {
        let mut pipeline = Pipeline::new();
        pipeline.update_revenue(&revenue_patch()).expect("update");
        pipeline.confirm_revenue().expect("confirm");
        pipeline.reset().expect("reset");

        assert_eq!(
            pipeline.status(StageId::Revenue).expect("status"),
            StageStatus::Empty
        );
        let hc = pipeline.open_human_capital().expect("open");
        assert_eq!(hc.total_units_per_month, None);
    }
}
