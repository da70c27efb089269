//! Ordered chart stages sharing one [`ArticleContext`].
//!
//! Stages run one after another. A stage that errors or exceeds the
//! configured timeout is replaced by placeholder charts and the next stage
//! still runs.

use crate::charts::choropleth::{draw_choropleth, AdminRow, Metric};
use crate::charts::dumbbell::{draw_dumbbell, DumbbellQuery, IndicatorRow};
use crate::charts::stacked::{draw_stacked, TimeseriesRow};
use crate::charts::symbol::{draw_symbols, BattleRow};
use crate::charts::waffle::{draw_waffle, SummaryRow};
use crate::charts::ChartOutput;
use crate::color::SidePalette;
use crate::config::AtlasConfig;
use crate::data::{load_boundaries, load_csv};
use crate::error::{AtlasError, Result};
use crate::map::{build_basemap, Basemap};
use crate::surface::Surface;
use async_trait::async_trait;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Values published by earlier stages for later ones
#[derive(Debug)]
pub struct ArticleContext {
    pub config: AtlasConfig,
    pub basemap: Option<Basemap>,
    pub side_palette: Option<SidePalette>,
}

impl ArticleContext {
    pub fn new(config: AtlasConfig) -> Self {
        Self {
            config,
            basemap: None,
            side_palette: None,
        }
    }

    fn require_basemap(&self, stage: &'static str) -> Result<&Basemap> {
        self.basemap.as_ref().ok_or(AtlasError::MissingDependency {
            stage,
            needs: "the basemap",
        })
    }
}

/// One step of the article build
#[async_trait]
pub trait ChartStage: Send + Sync {
    fn name(&self) -> &'static str;

    /// Output names this stage writes, used for placeholders on failure
    fn outputs(&self) -> &'static [&'static str];

    /// Size of the placeholder surfaces
    fn placeholder_size(&self, config: &AtlasConfig) -> (f64, f64) {
        (config.viewport.width, config.viewport.height)
    }

    async fn run(&self, ctx: &mut ArticleContext) -> Result<Vec<ChartOutput>>;
}

#[derive(Clone, Debug, PartialEq)]
pub enum StageOutcome {
    Rendered,
    Failed(String),
}

/// What happened to one stage
#[derive(Clone, Debug)]
pub struct StageReport {
    pub stage: &'static str,
    pub outcome: StageOutcome,
    pub outputs: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Default)]
pub struct PipelineRun {
    pub outputs: Vec<ChartOutput>,
    pub reports: Vec<StageReport>,
}

impl PipelineRun {
    pub fn failed(&self) -> impl Iterator<Item = &StageReport> {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, StageOutcome::Failed(_)))
    }
}

pub struct Pipeline {
    stages: Vec<Box<dyn ChartStage>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn ChartStage>>) -> Self {
        Self { stages }
    }

    /// basemap → symbol → stacked → waffle → choropleth → dumbbell
    pub fn article() -> Self {
        Self::new(vec![
            Box::new(BasemapStage),
            Box::new(SymbolStage),
            Box::new(StackedStage),
            Box::new(WaffleStage),
            Box::new(ChoroplethStage),
            Box::new(DumbbellStage),
        ])
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub async fn run(&self, ctx: &mut ArticleContext) -> PipelineRun {
        let timeout = ctx.config.stage_timeout();
        let mut run = PipelineRun::default();

        for stage in &self.stages {
            let name = stage.name();
            let started = Instant::now();
            let result = match tokio::time::timeout(timeout, stage.run(ctx)).await {
                Ok(result) => result,
                Err(_) => Err(AtlasError::Timeout {
                    stage: name,
                    after: timeout,
                }),
            };
            let elapsed = started.elapsed();

            let (outputs, outcome) = match result {
                Ok(outputs) => {
                    info!(stage = name, outputs = outputs.len(), ?elapsed, "stage finished");
                    (outputs, StageOutcome::Rendered)
                }
                Err(err) => {
                    warn!(stage = name, error = %err, "stage failed, writing placeholders");
                    let (w, h) = stage.placeholder_size(&ctx.config);
                    let reason = err.to_string();
                    let placeholders = stage
                        .outputs()
                        .iter()
                        .map(|&output| ChartOutput::new(output, Surface::placeholder(w, h, output, &reason)))
                        .collect();
                    (placeholders, StageOutcome::Failed(reason))
                }
            };

            run.reports.push(StageReport {
                stage: name,
                outcome,
                outputs: outputs.len(),
                elapsed,
            });
            run.outputs.extend(outputs);
        }
        run
    }
}

/// Write every output as `<dir>/<name>.svg`
pub async fn write_outputs(dir: &Path, outputs: &[ChartOutput]) -> Result<()> {
    tokio::fs::create_dir_all(dir).await.map_err(|source| AtlasError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    for output in outputs {
        let path = dir.join(format!("{}.svg", output.name));
        tokio::fs::write(&path, output.surface.to_svg())
            .await
            .map_err(|source| AtlasError::Io {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), "wrote chart");
    }
    Ok(())
}

// ─── Article stages ─────────────────────────────────────────────────────

pub struct BasemapStage;

#[async_trait]
impl ChartStage for BasemapStage {
    fn name(&self) -> &'static str {
        "basemap"
    }

    fn outputs(&self) -> &'static [&'static str] {
        &["basemap"]
    }

    async fn run(&self, ctx: &mut ArticleContext) -> Result<Vec<ChartOutput>> {
        let config = &ctx.config;
        let boundaries = load_boundaries(&config.datasets.boundaries, &config.name_property).await?;
        let basemap = build_basemap(&boundaries, config.viewport, &config.tiles, &config.basemap_style())?;
        let output = ChartOutput::new("basemap", basemap.surface.clone());
        ctx.basemap = Some(basemap);
        Ok(vec![output])
    }
}

pub struct SymbolStage;

#[async_trait]
impl ChartStage for SymbolStage {
    fn name(&self) -> &'static str {
        "symbol"
    }

    fn outputs(&self) -> &'static [&'static str] {
        &["symbol"]
    }

    async fn run(&self, ctx: &mut ArticleContext) -> Result<Vec<ChartOutput>> {
        let basemap = ctx.require_basemap(self.name())?;
        let rows: Vec<BattleRow> = load_csv(&ctx.config.datasets.battles).await?;
        let (surface, palette) = draw_symbols(basemap, &rows);
        ctx.side_palette = Some(palette);
        Ok(vec![ChartOutput::new("symbol", surface)])
    }
}

pub struct StackedStage;

#[async_trait]
impl ChartStage for StackedStage {
    fn name(&self) -> &'static str {
        "stacked"
    }

    fn outputs(&self) -> &'static [&'static str] {
        &["stacked", "stacked-cumulative"]
    }

    fn placeholder_size(&self, _config: &AtlasConfig) -> (f64, f64) {
        (1000.0, 400.0)
    }

    async fn run(&self, ctx: &mut ArticleContext) -> Result<Vec<ChartOutput>> {
        let rows: Vec<TimeseriesRow> = load_csv(&ctx.config.datasets.timeseries).await?;
        if ctx.side_palette.is_none() {
            debug!("no side palette from the symbol map, using category colors");
        }
        let palette = ctx.side_palette.as_ref();
        Ok(vec![
            ChartOutput::new("stacked", draw_stacked(&rows, false, palette)),
            ChartOutput::new("stacked-cumulative", draw_stacked(&rows, true, palette)),
        ])
    }
}

pub struct WaffleStage;

#[async_trait]
impl ChartStage for WaffleStage {
    fn name(&self) -> &'static str {
        "waffle"
    }

    fn outputs(&self) -> &'static [&'static str] {
        &["waffle"]
    }

    fn placeholder_size(&self, _config: &AtlasConfig) -> (f64, f64) {
        (400.0, 400.0)
    }

    async fn run(&self, ctx: &mut ArticleContext) -> Result<Vec<ChartOutput>> {
        let rows: Vec<SummaryRow> = load_csv(&ctx.config.datasets.summary).await?;
        Ok(vec![ChartOutput::new("waffle", draw_waffle(&rows))])
    }
}

pub struct ChoroplethStage;

#[async_trait]
impl ChartStage for ChoroplethStage {
    fn name(&self) -> &'static str {
        "choropleth"
    }

    fn outputs(&self) -> &'static [&'static str] {
        &["choropleth-fatalities", "choropleth-events"]
    }

    async fn run(&self, ctx: &mut ArticleContext) -> Result<Vec<ChartOutput>> {
        let basemap = ctx.require_basemap(self.name())?;
        let rows: Vec<AdminRow> = load_csv(&ctx.config.datasets.admin_totals).await?;
        Ok([Metric::Fatalities, Metric::Events]
            .into_iter()
            .map(|metric| ChartOutput::new(metric.chart_name(), draw_choropleth(basemap, &rows, metric)))
            .collect())
    }
}

pub struct DumbbellStage;

#[async_trait]
impl ChartStage for DumbbellStage {
    fn name(&self) -> &'static str {
        "dumbbell"
    }

    fn outputs(&self) -> &'static [&'static str] {
        &["dumbbell"]
    }

    fn placeholder_size(&self, _config: &AtlasConfig) -> (f64, f64) {
        (800.0, 400.0)
    }

    async fn run(&self, ctx: &mut ArticleContext) -> Result<Vec<ChartOutput>> {
        let rows: Vec<IndicatorRow> = load_csv(&ctx.config.datasets.indicators).await?;
        if rows.is_empty() {
            return Err(AtlasError::invalid("indicator table has no rows"));
        }
        let settings = &ctx.config.dumbbell;
        let mut query = DumbbellQuery::first_series(&rows);
        if let Some(code) = &settings.series_code {
            query.series_code = code.clone();
        }
        query.exclude_country = settings.exclude_country.clone();
        Ok(vec![ChartOutput::new("dumbbell", draw_dumbbell(&rows, &query))])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Datasets;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Failing;

    #[async_trait]
    impl ChartStage for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn outputs(&self) -> &'static [&'static str] {
            &["failing-a", "failing-b"]
        }
        async fn run(&self, _ctx: &mut ArticleContext) -> Result<Vec<ChartOutput>> {
            Err(AtlasError::invalid("broken table"))
        }
    }

    struct Slow;

    #[async_trait]
    impl ChartStage for Slow {
        fn name(&self) -> &'static str {
            "slow"
        }
        fn outputs(&self) -> &'static [&'static str] {
            &["slow"]
        }
        async fn run(&self, _ctx: &mut ArticleContext) -> Result<Vec<ChartOutput>> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Vec::new())
        }
    }

    struct Counting(Arc<AtomicUsize>);

    #[async_trait]
    impl ChartStage for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }
        fn outputs(&self) -> &'static [&'static str] {
            &["counting"]
        }
        async fn run(&self, _ctx: &mut ArticleContext) -> Result<Vec<ChartOutput>> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(vec![ChartOutput::new("counting", Surface::new(10.0, 10.0))])
        }
    }

    fn quick_config() -> AtlasConfig {
        AtlasConfig {
            stage_timeout_secs: 0.05,
            ..AtlasConfig::default()
        }
    }

    #[tokio::test]
    async fn test_failure_yields_placeholders_and_continues() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new(vec![Box::new(Failing), Box::new(Counting(calls.clone()))]);
        let mut ctx = ArticleContext::new(quick_config());
        let run = pipeline.run(&mut ctx).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let names: Vec<_> = run.outputs.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["failing-a", "failing-b", "counting"]);
        assert!(run.outputs[0].surface.to_svg().contains("data unavailable"));
        assert_eq!(run.failed().count(), 1);
        assert_eq!(run.reports[0].outcome, StageOutcome::Failed("invalid input: broken table".to_string()));
    }

    #[tokio::test]
    async fn test_timeout_is_reported_and_next_stage_runs() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new(vec![Box::new(Slow), Box::new(Counting(calls.clone()))]);
        let mut ctx = ArticleContext::new(quick_config());
        let run = pipeline.run(&mut ctx).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        match &run.reports[0].outcome {
            StageOutcome::Failed(reason) => assert!(reason.contains("timed out")),
            other => panic!("expected timeout, got {other:?}"),
        }
        assert_eq!(run.outputs[0].name, "slow");
    }

    #[tokio::test]
    async fn test_article_without_data_is_all_placeholders() {
        let missing = PathBuf::from("/nonexistent/conflict-atlas");
        let config = AtlasConfig {
            datasets: Datasets {
                boundaries: missing.join("a.geojson"),
                battles: missing.join("b.csv"),
                timeseries: missing.join("c.csv"),
                summary: missing.join("d.csv"),
                admin_totals: missing.join("e.csv"),
                indicators: missing.join("f.csv"),
            },
            ..AtlasConfig::default()
        };
        let pipeline = Pipeline::article();
        assert_eq!(
            pipeline.stage_names(),
            vec!["basemap", "symbol", "stacked", "waffle", "choropleth", "dumbbell"]
        );
        let mut ctx = ArticleContext::new(config);
        let run = pipeline.run(&mut ctx).await;
        assert_eq!(run.outputs.len(), 8);
        assert_eq!(run.failed().count(), 6);
        assert!(ctx.basemap.is_none());
    }

    fn write_fixture(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn test_article_end_to_end() {
        let dir = std::env::temp_dir().join(format!("conflict-atlas-e2e-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let geojson = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"ST": "Kachin"},
             "geometry": {"type": "Polygon", "coordinates": [[[96,24],[98,24],[98,27],[96,27],[96,24]]]}},
            {"type": "Feature", "properties": {"ST": "Shan"},
             "geometry": {"type": "Polygon", "coordinates": [[[97,20],[100,20],[100,24],[97,24],[97,20]]]}}
        ]}"#;
        let datasets = Datasets {
            boundaries: write_fixture(&dir, "regions.geojson", geojson),
            battles: write_fixture(&dir, "battles.csv", "latitude,longitude,side_b\n25,97,KIO\n21,98,Civilians\n"),
            timeseries: write_fixture(
                &dir,
                "timeseries.csv",
                "year,total_deaths,cumulative_deaths,side_b\n2021,3,3,KIO\n2022,4,7,KIO\n2022,1,1,NUG\n",
            ),
            summary: write_fixture(&dir, "summary.csv", "Type,Absolute,Percentage\nNon-deadly,70,70\nDeadly,30,30\n"),
            admin_totals: write_fixture(&dir, "admin.csv", "ADMIN1,FATALITIES,EVENTS\nKachin,10,4\nShan,2,9\n"),
            indicators: write_fixture(
                &dir,
                "indicators.csv",
                "Country Name,Country Code,Series Name,Series Code,2020 [YR2020],2021 [YR2021],2022 [YR2022]\n\
                 Myanmar,MMR,GDP,NY.GDP.MKTP.CD,79,65,59\n\
                 Thailand,THA,GDP,NY.GDP.MKTP.CD,500,505,..\n",
            ),
        };
        let config = AtlasConfig {
            datasets,
            output_dir: dir.join("out"),
            ..AtlasConfig::default()
        };
        let mut ctx = ArticleContext::new(config);
        let run = Pipeline::article().run(&mut ctx).await;
        assert_eq!(run.failed().count(), 0, "{:?}", run.reports);
        assert_eq!(run.outputs.len(), 8);
        assert!(ctx.side_palette.is_some());

        write_outputs(&ctx.config.output_dir, &run.outputs).await.unwrap();
        let symbol = std::fs::read_to_string(ctx.config.output_dir.join("symbol.svg")).unwrap();
        assert_eq!(symbol.matches(r#"class="battle-circle""#).count(), 2);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
