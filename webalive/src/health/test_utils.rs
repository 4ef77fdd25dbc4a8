//! テスト用のプローバーと時計

use super::clock::Clock;
use super::prober::Prober;
use crate::common::error::ProbeError;
use crate::types::{ProbeOutcome, ProbeResult};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// 10秒境界に揃った基準時刻
pub(crate) fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// 呼び出し回数を数えるプローバー
pub(crate) struct CountingProber {
    calls: AtomicUsize,
    response: Mutex<Result<u16, ProbeError>>,
    delay: Option<Duration>,
}

impl CountingProber {
    pub(crate) fn returning(status: u16) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            response: Mutex::new(Ok(status)),
            delay: None,
        }
    }

    pub(crate) fn failing(error: ProbeError) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            response: Mutex::new(Err(error)),
            delay: None,
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn set_status(&self, status: u16) {
        *self.response.lock().unwrap() = Ok(status);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Prober for CountingProber {
    async fn probe(&self, _url: &str, expected_status: u16) -> ProbeResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let response = self.response.lock().unwrap().clone();
        response.map(|status| ProbeOutcome::from_status(expected_status, status))
    }
}

/// tokioの（一時停止可能な）時間に追従する時計
pub(crate) struct TokioClock {
    origin: tokio::time::Instant,
}

impl TokioClock {
    pub(crate) fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = self.origin.elapsed();
        epoch() + chrono::Duration::from_std(elapsed).unwrap()
    }
}
