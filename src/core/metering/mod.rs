//! Usage metering for synthesis calls.
//!
//! Every successful provider call must report usage, independent of what
//! happens to the returned audio afterwards. The meter is an injected
//! collaborator so the surrounding billing system can substitute its own
//! sink; the default sink emits structured tracing events.

use async_trait::async_trait;
use parking_lot::Mutex;

/// Approximate narration speed used for duration estimates.
const CHARS_PER_SECOND: f64 = 15.0;

/// Provider cost in cents per 1000 characters.
const COST_CENTS_PER_1K_CHARS: f64 = 1.5;

/// One successful synthesis call.
#[derive(Debug, Clone)]
pub struct UsageEvent {
    pub provider: &'static str,
    pub voice: String,
    pub characters: usize,
    pub estimated_duration_secs: f64,
    pub cost_cents: f64,
}

impl UsageEvent {
    pub fn new(provider: &'static str, voice: String, characters: usize) -> Self {
        Self {
            provider,
            voice,
            characters,
            estimated_duration_secs: characters as f64 / CHARS_PER_SECOND,
            cost_cents: characters as f64 / 1000.0 * COST_CENTS_PER_1K_CHARS,
        }
    }
}

#[async_trait]
pub trait UsageMeter: Send + Sync {
    async fn record(&self, event: UsageEvent);
}

/// Default meter: logs usage as structured tracing events.
#[derive(Debug, Default)]
pub struct TracingMeter;

#[async_trait]
impl UsageMeter for TracingMeter {
    async fn record(&self, event: UsageEvent) {
        tracing::info!(
            provider = event.provider,
            voice = %event.voice,
            characters = event.characters,
            estimated_duration_secs = event.estimated_duration_secs,
            cost_cents = event.cost_cents,
            "synthesis usage"
        );
    }
}

/// Meter that collects events in memory. Used by tests to assert exactly how
/// many billed synthesis calls a pipeline made.
#[derive(Debug, Default)]
pub struct RecordingMeter {
    events: Mutex<Vec<UsageEvent>>,
}

impl RecordingMeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<UsageEvent> {
        self.events.lock().clone()
    }

    pub fn total_characters(&self) -> usize {
        self.events.lock().iter().map(|e| e.characters).sum()
    }

    pub fn call_count(&self) -> usize {
        self.events.lock().len()
    }
}

#[async_trait]
impl UsageMeter for RecordingMeter {
    async fn record(&self, event: UsageEvent) {
        self.events.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_event_estimates() {
        let event = UsageEvent::new("openai", "alloy".to_string(), 3000);
        assert_eq!(event.characters, 3000);
        assert!((event.estimated_duration_secs - 200.0).abs() < f64::EPSILON);
        assert!((event.cost_cents - 4.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_recording_meter_accumulates() {
        let meter = RecordingMeter::new();
        meter.record(UsageEvent::new("openai", "alloy".to_string(), 100)).await;
        meter.record(UsageEvent::new("openai", "nova".to_string(), 250)).await;
        assert_eq!(meter.call_count(), 2);
        assert_eq!(meter.total_characters(), 350);
    }
}
