//! 单个计时项的样本统计

use serde::Serialize;
use std::fmt;

/// 以毫秒为单位的样本集合
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuntimeMeasurement {
    name: String,
    samples: Vec<f64>,
}

impl RuntimeMeasurement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            samples: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_sample(&mut self, millis: f64) {
        self.samples.push(millis);
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.samples.iter().sum()
    }

    pub fn mean(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.sum() / self.samples.len() as f64
    }

    /// 总体标准差
    pub fn std_deviation(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        let variance = self
            .samples
            .iter()
            .map(|s| (s - mean).powi(2))
            .sum::<f64>()
            / self.samples.len() as f64;
        variance.sqrt()
    }

    pub fn min(&self) -> f64 {
        self.samples.iter().copied().reduce(f64::min).unwrap_or(0.0)
    }

    pub fn max(&self) -> f64 {
        self.samples.iter().copied().reduce(f64::max).unwrap_or(0.0)
    }
}

impl fmt::Display for RuntimeMeasurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.samples.len() == 1 {
            return write!(f, "{}: {:.3} ms", self.name, self.sum());
        }
        write!(
            f,
            "{}: {} samples, total {:.3} ms, mean {:.3} ms, std {:.3} ms, min {:.3} ms, max {:.3} ms",
            self.name,
            self.samples.len(),
            self.sum(),
            self.mean(),
            self.std_deviation(),
            self.min(),
            self.max()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistics() {
        let mut m = RuntimeMeasurement::new("kernel");
        for s in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            m.add_sample(s);
        }

        assert_eq!(m.len(), 8);
        assert_eq!(m.sum(), 40.0);
        assert_eq!(m.mean(), 5.0);
        assert_eq!(m.std_deviation(), 2.0);
        assert_eq!(m.min(), 2.0);
        assert_eq!(m.max(), 9.0);
    }

    #[test]
    fn test_empty_measurement() {
        let m = RuntimeMeasurement::new("empty");
        assert!(m.is_empty());
        assert_eq!(m.mean(), 0.0);
        assert_eq!(m.std_deviation(), 0.0);
        assert_eq!(m.min(), 0.0);
    }

    #[test]
    fn test_display() {
        let mut m = RuntimeMeasurement::new("upload");
        m.add_sample(1.5);
        assert_eq!(m.to_string(), "upload: 1.500 ms");
    }
}
