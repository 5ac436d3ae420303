//! Network work runs off the UI thread; results come back over an mpsc channel.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;

use crate::error::TransportError;
use crate::openmeteo::forecast::ForecastClient;
use crate::openmeteo::geocoding::GeocodingClient;
use crate::weather::{ForecastData, Location};

/// Tags a request so a completion can be matched to the search that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestId(pub u64);

/// Messages sent from worker threads back to the UI loop
#[derive(Debug)]
pub enum Completion {
    Geocoded {
        id: RequestId,
        result: Result<Option<Location>, TransportError>,
    },
    Forecast {
        id: RequestId,
        result: Result<ForecastData, TransportError>,
    },
}

/// Starts network requests. Each call must eventually produce exactly one
/// `Completion` carrying the same id.
pub trait Fetcher {
    fn geocode(&mut self, id: RequestId, query: String);
    fn forecast(&mut self, id: RequestId, location: Location);
}

pub struct ThreadFetcher {
    geocoder: Arc<GeocodingClient>,
    forecaster: Arc<ForecastClient>,
    tx: Sender<Completion>,
}

impl ThreadFetcher {
    pub fn new(
        geocoder: GeocodingClient,
        forecaster: ForecastClient,
        tx: Sender<Completion>,
    ) -> Self {
        Self {
            geocoder: Arc::new(geocoder),
            forecaster: Arc::new(forecaster),
            tx,
        }
    }
}

impl Fetcher for ThreadFetcher {
    fn geocode(&mut self, id: RequestId, query: String) {
        let geocoder = Arc::clone(&self.geocoder);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = guarded(|| geocoder.resolve(&query));
            // receiver gone means the app is shutting down
            let _ = tx.send(Completion::Geocoded { id, result });
        });
    }

    fn forecast(&mut self, id: RequestId, location: Location) {
        let forecaster = Arc::clone(&self.forecaster);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = guarded(|| forecaster.fetch(location.latitude, location.longitude));
            let _ = tx.send(Completion::Forecast { id, result });
        });
    }
}

/// Turns a panic inside a request into an error so the UI never waits forever.
fn guarded<T>(
    request: impl FnOnce() -> Result<T, TransportError>,
) -> Result<T, TransportError> {
    panic::catch_unwind(AssertUnwindSafe(request)).unwrap_or_else(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        tracing::error!(%reason, "request worker panicked");
        Err(TransportError::Worker(reason))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guarded_passes_results_through() {
        let ok: Result<u8, TransportError> = guarded(|| Ok(7));
        assert_eq!(ok.unwrap(), 7);
        let err: Result<u8, TransportError> =
            guarded(|| Err(TransportError::Malformed("bad".into())));
        assert!(matches!(err, Err(TransportError::Malformed(_))));
    }

    #[test]
    fn guarded_turns_panics_into_worker_errors() {
        let err: Result<u8, TransportError> = guarded(|| panic!("boom"));
        match err {
            Err(TransportError::Worker(reason)) => assert_eq!(reason, "boom"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn thread_fetcher_reports_failures_on_the_channel() {
        let (tx, rx) = std::sync::mpsc::channel();
        // nothing listens on port 9 so the request fails fast
        let geocoder = GeocodingClient::with_base_url("http://127.0.0.1:9/v1/search").unwrap();
        let forecaster = ForecastClient::with_base_url("http://127.0.0.1:9/v1/forecast").unwrap();
        let mut fetcher = ThreadFetcher::new(geocoder, forecaster, tx);

        fetcher.geocode(RequestId(4), "Lisbon".into());
        match rx.recv().unwrap() {
            Completion::Geocoded { id, result } => {
                assert_eq!(id, RequestId(4));
                assert!(matches!(result, Err(TransportError::Request(_))));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
