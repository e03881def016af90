//! One viewport's worth of state: the latest snapshot and its enrichments.
//!
//! Every query takes a generation token. A result is applied only if its token is still
//! the latest when it completes; anything older is dropped as stale. Queries are never
//! cancelled, so overlapping queries all run to completion.

use chrono::Utc;
use parking_lot::Mutex;
use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::{
    ai::{self, AnalysisPanel, EnrichmentSettings, TextGenerator},
    error::WeatherError,
    geolocation::{self, Geolocator},
    model::{AiAnalysis, Enrichment, WeatherData},
    normalize::normalize,
    provider::WeatherProvider,
    resolver::{LocationResolver, format_coordinates},
};

/// Notifications for the rendering layer, in the order they happened.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SnapshotReady { generation: u64, snapshot: Arc<WeatherData> },
    QueryFailed { generation: u64, message: String },
    SummaryReady { generation: u64, summary: String },
    SummaryUnavailable { generation: u64 },
    /// Informational text, e.g. after falling back from geolocation.
    Advisory(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Applied(Arc<WeatherData>),
    /// A newer query was issued while this one was in flight; its result was dropped.
    Stale,
}

#[derive(Debug)]
struct Viewport {
    generation: u64,
    snapshot: Arc<WeatherData>,
    summary: Enrichment<String>,
    analysis: Arc<AnalysisPanel>,
}

#[derive(Debug, Clone)]
struct Enricher {
    generator: Arc<dyn TextGenerator>,
    settings: EnrichmentSettings,
}

#[derive(Debug)]
pub struct WeatherSession {
    weather: Arc<dyn WeatherProvider>,
    enricher: Option<Enricher>,
    latest: Arc<AtomicU64>,
    viewport: Arc<Mutex<Option<Viewport>>>,
    events: UnboundedSender<SessionEvent>,
}

impl WeatherSession {
    pub fn new(weather: Arc<dyn WeatherProvider>) -> (Self, UnboundedReceiver<SessionEvent>) {
        let (events, rx) = mpsc::unbounded_channel();

        let session = Self {
            weather,
            enricher: None,
            latest: Arc::new(AtomicU64::new(0)),
            viewport: Arc::new(Mutex::new(None)),
            events,
        };

        (session, rx)
    }

    /// Enable the summary and deep-analysis tiers.
    pub fn with_enrichment(
        mut self,
        generator: Arc<dyn TextGenerator>,
        settings: EnrichmentSettings,
    ) -> Self {
        self.enricher = Some(Enricher { generator, settings });
        self
    }

    pub fn current(&self) -> Option<Arc<WeatherData>> {
        self.viewport.lock().as_ref().map(|v| v.snapshot.clone())
    }

    pub fn summary_state(&self) -> Enrichment<String> {
        self.viewport
            .lock()
            .as_ref()
            .map(|v| v.summary.clone())
            .unwrap_or_default()
    }

    pub fn analysis_state(&self) -> Enrichment<AiAnalysis> {
        self.viewport
            .lock()
            .as_ref()
            .map(|v| v.analysis.state())
            .unwrap_or_default()
    }

    /// Resolve, fetch and normalize `input`, then apply the snapshot if still current.
    pub async fn search(&self, input: &str) -> Result<QueryOutcome, WeatherError> {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Query #{} for {:?}", generation, input);

        let result = self.run_pipeline(input).await;

        let mut viewport = self.viewport.lock();
        if self.latest.load(Ordering::SeqCst) != generation {
            debug!("Dropping stale result of query #{}", generation);
            return Ok(QueryOutcome::Stale);
        }

        let snapshot = match result {
            Ok(snapshot) => Arc::new(snapshot),
            Err(e) => {
                warn!("Query #{} failed: {}", generation, e);
                self.emit(SessionEvent::QueryFailed {
                    generation,
                    message: e.user_message(),
                });
                return Err(e);
            }
        };

        info!("Applied snapshot #{} for {}", generation, snapshot.city);
        *viewport = Some(Viewport {
            generation,
            snapshot: snapshot.clone(),
            summary: if self.summaries_enabled() {
                Enrichment::Pending
            } else {
                Enrichment::Empty
            },
            analysis: Arc::new(AnalysisPanel::new()),
        });
        self.emit(SessionEvent::SnapshotReady {
            generation,
            snapshot: snapshot.clone(),
        });
        drop(viewport);

        self.spawn_summary(generation, snapshot.clone());
        Ok(QueryOutcome::Applied(snapshot))
    }

    /// Query the device position; on failure load `fallback` and, once its snapshot is
    /// applied, emit an advisory. No advisory follows a stale or failed fallback.
    pub async fn search_here(
        &self,
        geolocator: &dyn Geolocator,
        timeout: Duration,
        fallback: &str,
    ) -> Result<QueryOutcome, WeatherError> {
        match geolocation::locate_with_timeout(geolocator, timeout).await {
            Ok(coords) => {
                self.search(&format_coordinates(coords.latitude, coords.longitude))
                    .await
            }
            Err(e) => {
                warn!("Geolocation failed ({}), falling back to {}", e, fallback);
                let outcome = self.search(fallback).await;
                if let Ok(QueryOutcome::Applied(_)) = outcome {
                    self.emit(SessionEvent::Advisory(geolocation::advisory_message(&e, fallback)));
                }
                outcome
            }
        }
    }

    /// Run the deep analysis for the current snapshot. A no-op while one is in flight or
    /// when enrichment is disabled. Returns the panel state afterwards.
    pub async fn analyze_current(&self) -> Enrichment<AiAnalysis> {
        let Some(enricher) = &self.enricher else {
            debug!("Deep analysis requested without an AI provider");
            return Enrichment::Empty;
        };

        let Some((snapshot, panel)) = self
            .viewport
            .lock()
            .as_ref()
            .map(|v| (v.snapshot.clone(), v.analysis.clone()))
        else {
            return Enrichment::Empty;
        };

        panel
            .request(enricher.generator.as_ref(), &enricher.settings, &snapshot)
            .await;
        panel.state()
    }

    async fn run_pipeline(&self, input: &str) -> Result<WeatherData, WeatherError> {
        let location = LocationResolver::resolve(self.weather.as_ref(), input).await?;
        let payload = self.weather.forecast(&location).await?;
        Ok(normalize(&payload, &location, Utc::now()))
    }

    fn summaries_enabled(&self) -> bool {
        self.enricher.as_ref().is_some_and(|e| e.settings.quick_summary)
    }

    fn spawn_summary(&self, generation: u64, snapshot: Arc<WeatherData>) {
        let Some(enricher) = self.enricher.clone().filter(|e| e.settings.quick_summary) else {
            return;
        };
        let latest = self.latest.clone();
        let viewport = self.viewport.clone();
        let events = self.events.clone();

        tokio::spawn(async move {
            let summary = ai::summarize(
                enricher.generator.as_ref(),
                &enricher.settings.summary_model,
                &snapshot,
            )
            .await;

            let mut viewport = viewport.lock();
            let Some(current) = viewport.as_mut().filter(|v| v.generation == generation) else {
                return;
            };
            if latest.load(Ordering::SeqCst) != generation {
                return;
            }

            if summary.is_empty() {
                current.summary = Enrichment::Failed("no summary available".to_string());
                let _ = events.send(SessionEvent::SummaryUnavailable { generation });
                return;
            }

            current.summary = Enrichment::Ready(summary.clone());
            let _ = events.send(SessionEvent::SummaryReady { generation, summary });
        });
    }

    fn emit(&self, event: SessionEvent) {
        // The receiver may have been dropped by a renderer that is shutting down.
        let _ = self.events.send(event);
    }
}
