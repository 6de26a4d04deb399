//! Data providers for widgets whose values come from outside.
//!
//! A provider answers from its own cache and never blocks. Whatever fetches
//! the data (an HTTP poller, a `/proc` sampler) runs elsewhere and calls
//! [`Cached::update`].

#![allow(missing_docs)]

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use smol_str::SmolStr;

/// Capability name for weather data.
pub const WEATHER: &str = "weather";
/// Capability name for host metrics.
pub const SYSTEM_METRICS: &str = "system-metrics";

/// Latest known weather.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReading {
    pub temperature_c: f64,
    /// WMO weather interpretation code.
    pub weather_code: Option<i64>,
}

/// Latest host metrics, each in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemMetrics {
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
}

/// A cached value plus whether it is older than the provider's horizon.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading<T> {
    pub value: T,
    pub stale: bool,
}

pub trait WeatherProvider: Send + Sync {
    fn current(&self) -> Option<Reading<WeatherReading>>;
}

pub trait SystemMetricsProvider: Send + Sync {
    fn current(&self) -> Option<Reading<SystemMetrics>>;
}

#[derive(Debug)]
struct Slot<T> {
    value: T,
    updated: Instant,
}

/// Last-known value with a staleness horizon.
#[derive(Debug)]
pub struct Cached<T> {
    slot: RwLock<Option<Slot<T>>>,
    max_age: Duration,
}

impl<T: Clone> Cached<T> {
    #[must_use]
    pub fn new(max_age: Duration) -> Self {
        Self {
            slot: RwLock::new(None),
            max_age,
        }
    }

    pub fn update(&self, value: T) {
        *self.slot.write() = Some(Slot {
            value,
            updated: Instant::now(),
        });
    }

    pub fn clear(&self) {
        *self.slot.write() = None;
    }

    #[must_use]
    pub fn get(&self) -> Option<Reading<T>> {
        self.slot.read().as_ref().map(|slot| Reading {
            value: slot.value.clone(),
            stale: slot.updated.elapsed() > self.max_age,
        })
    }
}

/// Weather cache; readings older than 30 minutes are stale.
pub type CachedWeather = Cached<WeatherReading>;
/// Metrics cache; readings older than 5 seconds are stale.
pub type CachedMetrics = Cached<SystemMetrics>;

impl CachedWeather {
    #[must_use]
    pub fn weather() -> Self {
        Self::new(Duration::from_secs(1800))
    }
}

impl CachedMetrics {
    #[must_use]
    pub fn metrics() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl WeatherProvider for CachedWeather {
    fn current(&self) -> Option<Reading<WeatherReading>> {
        self.get()
    }
}

impl SystemMetricsProvider for CachedMetrics {
    fn current(&self) -> Option<Reading<SystemMetrics>> {
        self.get()
    }
}

/// Providers handed to the built-in widget factories.
#[derive(Clone)]
pub struct Providers {
    pub weather: Option<Arc<dyn WeatherProvider>>,
    pub metrics: Option<Arc<dyn SystemMetricsProvider>>,
}

impl Providers {
    /// No providers: data-driven widgets render placeholders.
    #[must_use]
    pub fn none() -> Self {
        Self {
            weather: None,
            metrics: None,
        }
    }

    #[must_use]
    pub fn with_weather(mut self, provider: Arc<dyn WeatherProvider>) -> Self {
        self.weather = Some(provider);
        self
    }

    #[must_use]
    pub fn with_metrics(mut self, provider: Arc<dyn SystemMetricsProvider>) -> Self {
        self.metrics = Some(provider);
        self
    }

    /// Capability names available to widgets.
    #[must_use]
    pub fn capabilities(&self) -> BTreeSet<SmolStr> {
        let mut names = BTreeSet::new();
        if self.weather.is_some() {
            names.insert(SmolStr::new(WEATHER));
        }
        if self.metrics.is_some() {
            names.insert(SmolStr::new(SYSTEM_METRICS));
        }
        names
    }
}

impl Default for Providers {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Providers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Providers")
            .field("capabilities", &self.capabilities())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_starts_empty_and_returns_last_value() {
        let cache = CachedWeather::weather();
        assert!(cache.current().is_none());
        cache.update(WeatherReading {
            temperature_c: 21.4,
            weather_code: Some(3),
        });
        let reading = cache.current().unwrap();
        assert_eq!(reading.value.temperature_c, 21.4);
        assert!(!reading.stale);
        cache.clear();
        assert!(cache.current().is_none());
    }

    #[test]
    fn zero_horizon_marks_readings_stale() {
        let cache = CachedMetrics::new(Duration::ZERO);
        cache.update(SystemMetrics {
            cpu: 1.0,
            memory: 2.0,
            disk: 3.0,
        });
        std::thread::sleep(Duration::from_millis(2));
        assert!(cache.current().unwrap().stale);
    }

    #[test]
    fn capabilities_follow_configured_providers() {
        let providers = Providers::none().with_weather(Arc::new(CachedWeather::weather()));
        let capabilities = providers.capabilities();
        let names: Vec<&str> = capabilities.iter().map(SmolStr::as_str).collect();
        assert_eq!(names, vec![WEATHER]);
    }
}
