//! Single entry point tying the analyzers and scorers together

use crate::analyzers::{
    analyze_dag_metadata, analyze_task_complexity, parse_module, DependencyEdgeExtractor,
    ImportClassifier, SourceMap, TopLevelSideEffectDetector,
};
use crate::config::ClassificationSets;
use crate::error::Result;
use crate::live::LiveDag;
use crate::models::{AnalysisReport, FindingsSummary, ModeKind, TopLevelCodeReport};
use crate::performance::{insights, PerformanceMetrics, PerformanceThresholds};
use crate::providers::{ProviderMapping, ProviderRecommender};
use crate::scoring::{band_for_score, calculate_dag_prognosis, static_score};
use indexmap::IndexMap;
use tracing::info;

/// Which scoring path produces the headline score
#[derive(Clone, Copy)]
pub enum AnalysisMode<'a> {
    /// Source text only
    Static,
    /// Source text plus the DAG object the caller built from it
    Runtime(&'a dyn LiveDag),
}

impl AnalysisMode<'_> {
    pub fn kind(&self) -> ModeKind {
        match self {
            AnalysisMode::Static => ModeKind::Static,
            AnalysisMode::Runtime(_) => ModeKind::Runtime,
        }
    }
}

/// Stateless analysis engine. Holds only shared read-only configuration, so
/// one engine can serve many threads.
#[derive(Clone, Copy)]
pub struct Engine<'a> {
    sets: &'a ClassificationSets,
    providers: &'a ProviderMapping,
}

impl<'a> Engine<'a> {
    pub fn new(sets: &'a ClassificationSets, providers: &'a ProviderMapping) -> Self {
        Self { sets, providers }
    }

    /// Analyze one DAG file. A syntax error aborts with
    /// `PrognosisError::Parse` and no report.
    pub fn analyze(&self, source: &str, mode: AnalysisMode<'_>) -> Result<AnalysisReport> {
        self.analyze_with_metrics(source, mode, None, &PerformanceThresholds::default())
    }

    /// [`Engine::analyze`] plus insights from a profiling harness document
    pub fn analyze_with_metrics(
        &self,
        source: &str,
        mode: AnalysisMode<'_>,
        metrics: Option<&PerformanceMetrics>,
        thresholds: &PerformanceThresholds,
    ) -> Result<AnalysisReport> {
        let suite = parse_module(source)?;
        let map = SourceMap::new(source);

        let import_analysis = ImportClassifier::new(self.sets).analyze(&suite, &map);
        let side_effects = TopLevelSideEffectDetector::new(self.sets).detect(&suite, &map);
        let dependencies = DependencyEdgeExtractor::new().extract(&suite, &map);

        let recommender = ProviderRecommender::new(self.providers);
        let provider_recommendations = recommender.recommend(&import_analysis.imports);
        let provider_findings =
            recommender.findings(&import_analysis.imports, &provider_recommendations);

        let top_level_code = TopLevelCodeReport::from_findings(&side_effects);
        let mut findings = import_analysis.findings;
        findings.extend(side_effects);
        findings.extend(provider_findings);

        let mut recommendations: Vec<String> = findings
            .iter()
            .filter_map(|f| f.recommendation.clone())
            .collect();

        let mut summary = format!(
            "DAG code analysis completed with {} findings.",
            findings.len()
        );

        let (score, task_metrics, dag_metadata, dag_prognosis) = match mode {
            AnalysisMode::Static => (static_score(&findings), None, None, None),
            AnalysisMode::Runtime(dag) => {
                let task_metrics: IndexMap<_, _> = dag
                    .tasks()
                    .into_iter()
                    .map(|task| (task.task_id().to_string(), analyze_task_complexity(task)))
                    .collect();
                let prognosis = calculate_dag_prognosis(dag);
                summary.push_str(&format!(
                    " Runtime analysis of DAG '{}' included.",
                    dag.dag_id()
                ));
                (
                    prognosis.score,
                    Some(task_metrics),
                    Some(analyze_dag_metadata(dag)),
                    Some(prognosis),
                )
            }
        };

        let performance_insights = metrics
            .map(|m| insights(m, thresholds))
            .unwrap_or_default();
        recommendations.extend(performance_insights.iter().map(|i| i.message.clone()));

        let band = band_for_score(score);
        info!(
            "Analysis complete: score {:.1} ({}), {} findings, {} edges",
            score,
            band,
            findings.len(),
            dependencies.len()
        );

        Ok(AnalysisReport {
            score,
            band,
            mode: mode.kind(),
            summary,
            imports: import_analysis.imports,
            findings_summary: FindingsSummary::from_findings(&findings),
            findings,
            top_level_code,
            dependencies,
            provider_recommendations,
            task_metrics,
            dag_metadata,
            dag_prognosis,
            performance_insights,
            recommendations,
        })
    }
}
