//! One forecast run, end to end.
//!
//! Stages run in a fixed order against a [`RunContext`]:
//! sales frame, partition, locations, lag history, calendar, weather, then
//! per entity feature assembly, prediction and explanation. Any error aborts
//! the run; nothing is returned for a partial run.

use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use chrono::{Datelike, Days, NaiveDate};
use demand_ingestor::{
    models::{location::Location, prediction::PredictionRecord},
    providers::{HolidaySource, LocationSource, SalesLedger, VacationSource, WeatherSource},
};
use tracing::info;

use crate::{
    calendar::CalendarService,
    config::{FeaturePlan, MissingModelPolicy, PipelineConfig},
    context::RunContext,
    error::PipelineError,
    explain::{ArticleSummary, ExplainFinalizer},
    features::FeatureAssembler,
    lags::{LagWindow, fetch_lag_frame},
    partition::EntityPartitioner,
    predict::Predictor,
    regressor::ModelRegistry,
    safety::SafetyFactors,
    sales_frame::SalesFrameAssembler,
    weather::WeatherService,
};

/// The external services a run reads from.
#[derive(Clone)]
pub struct Sources {
    pub ledger: Arc<dyn SalesLedger>,
    pub locations: Arc<dyn LocationSource>,
    pub holidays: Arc<dyn HolidaySource>,
    pub vacations: Arc<dyn VacationSource>,
    pub weather: Arc<dyn WeatherSource>,
}

/// Run parameters resolved from a normalized [`PipelineConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub start_date: NaiveDate,
    pub duration: u32,
    pub excluded_stores: Vec<u32>,
    pub missing_model: MissingModelPolicy,
    pub max_concurrent_pages: usize,
    pub weather_includes_lag_window: bool,
    pub plan: FeaturePlan,
}

impl RunSettings {
    pub fn from_config(cfg: &PipelineConfig) -> Result<Self, PipelineError> {
        if cfg.run.pred_duration == 0 {
            return Err(PipelineError::Config("pred_duration must be at least 1".into()));
        }
        Ok(Self {
            start_date: cfg.run.start_date,
            duration: cfg.run.pred_duration,
            excluded_stores: cfg.run.excluded_stores.clone(),
            missing_model: cfg.run.missing_model,
            max_concurrent_pages: cfg.run.max_concurrent_pages,
            weather_includes_lag_window: cfg.run.weather_includes_lag_window,
            plan: cfg.feature_plan()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastOutput {
    pub records: Vec<PredictionRecord>,
    pub summary: Vec<ArticleSummary>,
}

/// Years whose holidays can affect a datecode on `dates`: their own, and the
/// year two days later for dates just before New Year.
fn calendar_years(dates: &[NaiveDate]) -> BTreeSet<i32> {
    dates
        .iter()
        .flat_map(|d| {
            let ahead = d.checked_add_days(Days::new(2)).unwrap_or(*d);
            [d.year(), ahead.year()]
        })
        .collect()
}

pub async fn run(
    sources: &Sources,
    settings: &RunSettings,
    registry: &ModelRegistry,
    safety: &SafetyFactors,
    ctx: &mut RunContext,
) -> Result<ForecastOutput, PipelineError> {
    let frame = SalesFrameAssembler::new(sources.ledger.as_ref(), settings.max_concurrent_pages)
        .assemble(settings.start_date, settings.duration)
        .await?;
    let entities = EntityPartitioner::new(settings.excluded_stores.iter().copied())
        .partition(frame.rows)?;

    let all_locations = sources.locations.locations().await?;
    let by_store: HashMap<u32, &Location> = all_locations.iter().map(|l| (l.store, l)).collect();
    let mut store_locations: HashMap<u32, &Location> = HashMap::new();
    for key in entities.keys() {
        let location = by_store
            .get(&key.store)
            .copied()
            .ok_or(PipelineError::MissingLocation { store: key.store })?;
        store_locations.insert(key.store, location);
    }

    let plan = &settings.plan;
    let lag_window = LagWindow::for_dates(&frame.pred_dates, &plan.lags)
        .ok_or_else(|| PipelineError::Config("no prediction dates or no lags".into()))?;
    let lag_frame = fetch_lag_frame(sources.ledger.as_ref(), lag_window, frame.page_size).await?;

    let states: BTreeSet<String> = store_locations.values().map(|l| l.state.clone()).collect();
    CalendarService::new(sources.holidays.as_ref(), sources.vacations.as_ref())
        .extend(&mut ctx.calendar, &states, &calendar_years(&frame.pred_dates))
        .await?;

    let latlon_keys: BTreeSet<_> = store_locations.values().map(|l| l.latlon_key()).collect();
    let mut weather_dates = frame.pred_dates.clone();
    if settings.weather_includes_lag_window {
        weather_dates.extend(lag_window.dates());
    }
    WeatherService::new(sources.weather.as_ref())
        .fill(&mut ctx.weather, &latlon_keys, &weather_dates, ctx.today)
        .await?;

    let assembler = FeatureAssembler::new(
        &ctx.calendar,
        &ctx.weather,
        &lag_frame,
        plan,
        settings.duration,
    );
    let predictor = Predictor::new(registry, &plan.features, settings.missing_model);
    let mut predicted = Vec::with_capacity(entities.len());
    for (key, series) in &entities {
        let location = store_locations
            .get(&key.store)
            .ok_or(PipelineError::MissingLocation { store: key.store })?;
        let features = assembler.assemble(series, location)?;
        if let Some(entity) = predictor.predict(features)? {
            predicted.push(entity);
        }
    }
    info!(
        entities = entities.len(),
        predicted = predicted.len(),
        "predictions generated"
    );

    let finalized = ExplainFinalizer::new(registry, safety, &plan.categories).finalize(&predicted)?;
    Ok(ForecastOutput {
        records: finalized.records,
        summary: finalized.summary,
    })
}
