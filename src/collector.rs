use crate::credentials::CredentialResolver;
use crate::kubernetes::{Transport, item_names, namespaces_path, pods_path};
use crate::ledger::MetricsLedger;
use crate::metrics::{header_lines, render_heartbeat, render_probe};
use crate::probe::AccessProber;
use crate::types::{BearerToken, CollectionSummary, Settings};
use chrono::{DateTime, TimeZone, Timelike, Utc};
use http::Method;
use std::future::Future;
use std::io;
use tracing::{debug, info, warn};

/// True while the minute of the hour is below `before_minute`.
pub fn gate_open<T: Timelike>(now: &T, before_minute: u32) -> bool {
    now.minute() < before_minute
}

/// Executes one gated run.
///
/// Outside the window nothing is touched and `connect` is never called, so
/// setup failures only surface when a run is actually due.
pub async fn run<T, Tz, F, Fut>(
    settings: &Settings,
    now: DateTime<Tz>,
    connect: F,
) -> anyhow::Result<Option<CollectionSummary>>
where
    T: Transport,
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
    F: FnOnce() -> Fut,
    Fut: Future<Output = anyhow::Result<(T, BearerToken)>>,
{
    if !gate_open(&now, settings.run_before_minute) {
        info!(
            "Minute {} is outside the collection window (< {}), skipping",
            now.minute(),
            settings.run_before_minute
        );
        return Ok(None);
    }

    let (transport, identity) = connect().await?;

    let mut ledger = MetricsLedger::create(&settings.output)?;
    for line in header_lines(&now) {
        ledger.add(line)?;
    }

    let collector = Collector::new(settings, &transport, &identity);
    let summary = collector.collect(&mut ledger).await?;
    Ok(Some(summary))
}

/// Walks every namespace and pod and records one probe result per pod.
pub struct Collector<'a, T> {
    transport: &'a T,
    identity: &'a BearerToken,
    prober: AccessProber<'a, T>,
}

impl<'a, T: Transport> Collector<'a, T> {
    pub fn new(settings: &Settings, transport: &'a T, identity: &'a BearerToken) -> Self {
        let resolver = CredentialResolver::new(transport, identity, settings);
        Self {
            transport,
            identity,
            prober: AccessProber::new(transport, resolver),
        }
    }

    pub async fn collect(&self, ledger: &mut MetricsLedger) -> io::Result<CollectionSummary> {
        let mut summary = CollectionSummary::default();

        for namespace in self.list_names(&namespaces_path()).await {
            summary.namespaces += 1;
            for pod in self.list_names(&pods_path(&namespace)).await {
                let result = self.prober.probe_pod(&namespace, &pod).await;
                summary.pods += 1;
                if result.accessible {
                    summary.accessible += 1;
                }
                ledger.add(render_probe(&result))?;
            }
        }

        ledger.add(render_heartbeat(&Utc::now()))?;
        summary.duplicates = ledger.duplicates();
        summary.lines = ledger.lines().len();
        Ok(summary)
    }

    /// Lists object names at `path`; a failed listing yields no names.
    async fn list_names(&self, path: &str) -> Vec<String> {
        let body = match self
            .transport
            .request(self.identity, Method::GET, path, None)
            .await
        {
            Ok(body) => body,
            Err(e) => {
                warn!("Listing {} failed: {}", path, e);
                return Vec::new();
            }
        };

        match item_names(&body) {
            Ok(names) => {
                debug!("Listed {} objects at {}", names.len(), path);
                names
            }
            Err(e) => {
                warn!("Unexpected list payload from {}: {}", path, e);
                Vec::new()
            }
        }
    }
}
