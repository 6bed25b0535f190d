use std::time::{Duration, Instant};

use folio_store::ArchiveTx;
use folio_types::PublicationEvent;
use tracing::{debug, info};

use crate::config::ShimConfig;
use crate::error::ShimResult;
use crate::stage::{ShimContext, ShimMarker, ShimReport, ShimStage};
use crate::stages::{AclShim, DirectoryShim, IdentityShim, LegacyIdShim, VersionShim};

// ---------------------------------------------------------------------------
// ShimOutcome
// ---------------------------------------------------------------------------

/// The outcome of running an event through the full pipeline.
#[derive(Clone, Debug)]
pub struct ShimOutcome {
    /// Whether the event arrived on the legacy path.
    pub legacy: bool,
    /// Per-stage reports in run order.
    pub reports: Vec<ShimReport>,
    pub elapsed: Duration,
}

impl ShimOutcome {
    /// Whether any stage changed the event or wrote rows.
    pub fn modified(&self) -> bool {
        self.reports.iter().any(|r| r.marker.is_modify())
    }

    /// Marker reported by the named stage, if it ran.
    pub fn marker(&self, stage: &str) -> Option<ShimMarker> {
        self.reports
            .iter()
            .find(|r| r.stage_name == stage)
            .map(|r| r.marker)
    }
}

// ---------------------------------------------------------------------------
// ShimPipeline
// ---------------------------------------------------------------------------

/// Ordered pipeline of [`ShimStage`]s every publication passes through
/// before it is written.
///
/// Stages run in sequence inside the caller's transaction. The first error
/// stops the run; the caller rolls the transaction back.
pub struct ShimPipeline {
    stages: Vec<Box<dyn ShimStage>>,
    config: ShimConfig,
}

impl ShimPipeline {
    /// An empty pipeline. Use [`Self::add_stage`] or
    /// [`Self::with_default_stages`].
    pub fn new(config: ShimConfig) -> Self {
        Self {
            stages: Vec::new(),
            config,
        }
    }

    /// The standard pipeline:
    /// identity -> legacy_id -> version -> directory -> acl,
    /// omitting whatever `config` disables.
    pub fn with_default_stages(config: ShimConfig) -> Self {
        let mut pipeline = Self::new(config);
        pipeline.add_stage(Box::new(IdentityShim));
        pipeline.add_stage(Box::new(LegacyIdShim));
        pipeline.add_stage(Box::new(VersionShim));
        if pipeline.config.directory {
            pipeline.add_stage(Box::new(DirectoryShim));
        }
        if pipeline.config.acl {
            pipeline.add_stage(Box::new(AclShim));
        }
        pipeline
    }

    pub fn add_stage(&mut self, stage: Box<dyn ShimStage>) {
        self.stages.push(stage);
    }

    pub fn config(&self) -> &ShimConfig {
        &self.config
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Canonicalize `event` in place.
    pub fn run(
        &self,
        tx: &mut dyn ArchiveTx,
        event: &mut PublicationEvent,
    ) -> ShimResult<ShimOutcome> {
        let pipeline_start = Instant::now();
        let mut context = ShimContext::new(event);

        for stage in &self.stages {
            let stage_start = Instant::now();
            let marker = stage.apply(tx, &mut context)?;
            let report = ShimReport {
                stage_name: stage.name().to_string(),
                marker,
                elapsed: stage_start.elapsed(),
            };
            debug!(stage = stage.name(), %marker, elapsed = ?report.elapsed, "shim stage finished");
            context.previous_stages.push(report);
        }

        let outcome = ShimOutcome {
            legacy: context.legacy,
            reports: context.previous_stages,
            elapsed: pipeline_start.elapsed(),
        };
        info!(
            title = %context.event.title,
            legacy = outcome.legacy,
            modified = outcome.modified(),
            elapsed = ?outcome.elapsed,
            "shims applied"
        );
        Ok(outcome)
    }
}

impl Default for ShimPipeline {
    fn default() -> Self {
        Self::with_default_stages(ShimConfig::default())
    }
}
