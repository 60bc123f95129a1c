use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

use crate::analysis::ResolutionPlan;
use crate::config::{self, AppConfig};
use crate::duplicates::{self, DuplicateGroup, FilterStats};
use crate::error::Error;
use crate::platform::{DiskSpaceProbe, SpaceProbe};
use crate::progress::{ProgressReporter, SilentReporter};
use crate::resolver::{DirectoryStatistics, PathResolver};
use crate::scanner::{self, ScanOutcome};

/// Drives scan → group/filter → plan for one configuration.
pub struct OrganizerEngine {
    config: AppConfig,
    reporter: Box<dyn ProgressReporter>,
    probe: Box<dyn SpaceProbe>,
}

#[derive(Debug)]
pub struct DuplicateReport {
    pub scan: ScanOutcome,
    pub groups: Vec<DuplicateGroup>,
    /// Present when the enhanced filter ran.
    pub filter_stats: Option<FilterStats>,
    pub statistics: duplicates::DuplicateStatistics,
}

#[derive(Debug)]
pub struct ResolutionReport {
    pub scan: ScanOutcome,
    pub statistics: DirectoryStatistics,
    pub plan: ResolutionPlan,
    /// (show name, organization score) for shows below the attention threshold.
    pub shows_needing_attention: Vec<(String, f64)>,
}

impl OrganizerEngine {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            reporter: Box::new(SilentReporter),
            probe: Box::new(DiskSpaceProbe),
        }
    }

    pub fn with_reporter(mut self, reporter: Box<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_space_probe(mut self, probe: Box<dyn SpaceProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn reporter(&self) -> &dyn ProgressReporter {
        self.reporter.as_ref()
    }

    /// Configured roots with nested roots removed. Empty configuration is fatal.
    fn roots(&self) -> Result<Vec<PathBuf>, Error> {
        if self.config.tv_directories.is_empty() {
            return Err(Error::NoDirectories);
        }
        let roots = config::non_overlapping_directories(self.config.tv_directories.clone());
        info!("Processing directories: {:?}", roots);
        Ok(roots.into_iter().map(PathBuf::from).collect())
    }

    pub fn scan(&self) -> Result<ScanOutcome, Error> {
        let roots = self.roots()?;
        Ok(scanner::scan_episodes(&roots, &self.config, self.reporter.as_ref()))
    }

    /// Scan and group duplicates. With `enhanced`, groups also pass the false-positive
    /// filter and must reach `min_confidence` (the configured value when `None`).
    pub fn find_duplicates(
        &self,
        enhanced: bool,
        min_confidence: Option<f64>,
    ) -> Result<DuplicateReport, Error> {
        let scan = self.scan()?;

        self.reporter.on_analysis_start("duplicates");
        let start = Instant::now();
        let groups = duplicates::detect_duplicates(&scan.episodes);

        let (groups, filter_stats) = if enhanced {
            let min_confidence = min_confidence.unwrap_or(self.config.duplicates.min_confidence);
            let outcome =
                duplicates::filter_duplicate_groups(groups, &self.config.duplicates, min_confidence);
            (outcome.groups, Some(outcome.stats))
        } else {
            (groups, None)
        };
        let statistics = duplicates::duplicate_statistics(&groups);
        self.reporter.on_analysis_complete(
            "duplicates",
            groups.len(),
            start.elapsed().as_secs_f64(),
        );
        debug!("Duplicate statistics: {:?}", statistics);

        Ok(DuplicateReport {
            scan,
            groups,
            filter_stats,
            statistics,
        })
    }

    /// Scan, discover show folders and plan where every loose episode should go.
    pub fn resolve_paths(&self) -> Result<ResolutionReport, Error> {
        let roots = self.roots()?;
        let scan = scanner::scan_episodes(&roots, &self.config, self.reporter.as_ref());

        self.reporter.on_analysis_start("path resolution");
        let start = Instant::now();
        let resolver = PathResolver::new(&self.config, roots, self.probe.as_ref());
        let statistics = resolver.directory_statistics(&scan.episodes);
        let shows_needing_attention = resolver
            .shows_needing_attention()
            .into_iter()
            .map(|s| (s.actual_name.clone(), s.organization_score))
            .collect();
        let plan = ResolutionPlan::new(resolver.resolve(&scan.episodes));
        self.reporter.on_analysis_complete(
            "path resolution",
            plan.resolutions.len(),
            start.elapsed().as_secs_f64(),
        );
        info!("{}", plan.summary());

        Ok(ResolutionReport {
            scan,
            statistics,
            plan,
            shows_needing_attention,
        })
    }
}
