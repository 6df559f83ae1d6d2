//! 计时管理器
//!
//! 普通计时器按名称开始/停止；编号计时器每次停止后编号加一，
//! 依次记录为 `name0`、`name1`……。关闭时所有计时调用都不生效。

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::measurement::RuntimeMeasurement;

pub type TimingResult<T> = Result<T, TimingError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimingError {
    #[error("Timer not started: {0}")]
    NotStarted(String),

    #[error("No timing recorded for: {0}")]
    NotFound(String),
}

#[derive(Debug, Default)]
pub struct RuntimeMeasurementsManager {
    enabled: bool,
    timings: HashMap<String, RuntimeMeasurement>,
    numberings: HashMap<String, u32>,
    running: HashMap<String, Instant>,
}

impl RuntimeMeasurementsManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn start_regular_timer(&mut self, name: &str) {
        if !self.enabled {
            return;
        }
        if self.running.insert(name.to_string(), Instant::now()).is_some() {
            warn!("Timer {} restarted before it was stopped", name);
        }
    }

    pub fn stop_regular_timer(&mut self, name: &str) -> TimingResult<()> {
        if !self.enabled {
            return Ok(());
        }
        let started = self
            .running
            .remove(name)
            .ok_or_else(|| TimingError::NotStarted(name.to_string()))?;
        self.record(name, started.elapsed());
        Ok(())
    }

    pub fn start_numbered_timer(&mut self, name: &str) {
        if !self.enabled {
            return;
        }
        let number = *self.numberings.entry(name.to_string()).or_insert(0);
        self.start_regular_timer(&format!("{}{}", name, number));
    }

    pub fn stop_numbered_timer(&mut self, name: &str) -> TimingResult<()> {
        if !self.enabled {
            return Ok(());
        }
        let number = *self
            .numberings
            .get(name)
            .ok_or_else(|| TimingError::NotStarted(name.to_string()))?;
        self.stop_regular_timer(&format!("{}{}", name, number))?;
        self.numberings.insert(name.to_string(), number + 1);
        Ok(())
    }

    /// 直接记录一个样本
    pub fn record(&mut self, name: &str, elapsed: Duration) {
        if !self.enabled {
            return;
        }
        self.timings
            .entry(name.to_string())
            .or_insert_with(|| RuntimeMeasurement::new(name))
            .add_sample(elapsed.as_secs_f64() * 1000.0);
    }

    /// 计时执行闭包
    pub fn time<T>(&mut self, name: &str, f: impl FnOnce() -> T) -> T {
        if !self.enabled {
            return f();
        }
        let started = Instant::now();
        let value = f();
        self.record(name, started.elapsed());
        value
    }

    pub fn timing(&self, name: &str) -> TimingResult<&RuntimeMeasurement> {
        self.timings
            .get(name)
            .ok_or_else(|| TimingError::NotFound(name.to_string()))
    }

    pub fn print(&self, name: &str) -> TimingResult<()> {
        info!("{}", self.timing(name)?);
        Ok(())
    }

    pub fn print_all(&self) {
        let mut names: Vec<_> = self.timings.keys().collect();
        names.sort();
        for name in names {
            info!("{}", self.timings[name]);
        }
    }
}
