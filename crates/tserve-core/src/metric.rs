//! Metric records written through the named logger channels

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A single name/value dimension attached to a metric
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Dimension {
    pub name: String,
    pub value: String,
}

impl Dimension {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Structured metric record
///
/// Dimensions keep insertion order; the rendered line lists them in the order
/// they were added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Metric {
    pub metric_name: String,
    pub value: String,
    pub unit: String,
    pub dimensions: Vec<Dimension>,
    pub timestamp: String,
    pub request_id: Option<String>,
    pub host_name: Option<String>,
}

impl Metric {
    /// Create a metric stamped with the current epoch second
    pub fn new(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            metric_name: name.into(),
            value: "0".to_string(),
            unit: unit.into(),
            dimensions: Vec::new(),
            timestamp: Utc::now().timestamp().to_string(),
            request_id: None,
            host_name: None,
        }
    }

    pub fn with_value(mut self, value: impl ToString) -> Self {
        self.value = value.to_string();
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    pub fn with_host_name(mut self, host_name: impl Into<String>) -> Self {
        self.host_name = Some(host_name.into());
        self
    }

    pub fn with_dimension(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.dimensions.push(Dimension::new(name, value));
        self
    }

    /// Render as a single JSON line
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl fmt::Display for Metric {
    /// `name.Unit:value|#Dim:val,...|#hostname:h,requestID:id,timestamp:ts`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}:{}|#", self.metric_name, self.unit, self.value)?;
        for (i, dimension) in self.dimensions.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}:{}", dimension.name, dimension.value)?;
        }
        write!(
            f,
            "|#hostname:{}",
            self.host_name.as_deref().unwrap_or_default()
        )?;
        if let Some(request_id) = &self.request_id {
            write!(f, ",requestID:{request_id}")?;
        }
        write!(f, ",timestamp:{}", self.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_line_format() {
        let metric = Metric::new("TestMetric1", "Milliseconds")
            .with_value(12.5)
            .with_request_id("12345")
            .with_timestamp("1542157988")
            .with_host_name("worker-0")
            .with_dimension("Level", "Model")
            .with_dimension("ModelName", "noop");

        assert_eq!(
            metric.to_string(),
            "TestMetric1.Milliseconds:12.5|#Level:Model,ModelName:noop|#hostname:worker-0,requestID:12345,timestamp:1542157988"
        );
    }

    #[test]
    fn test_metric_without_request_id() {
        let metric = Metric::new("Requests2XX", "Count").with_timestamp("1");
        assert_eq!(metric.to_string(), "Requests2XX.Count:0|#|#hostname:,timestamp:1");
    }

    #[test]
    fn test_metric_json_keys() {
        let metric = Metric::new("TestMetric2", "Milliseconds")
            .with_request_id("23478")
            .with_dimension("Level", "Model");
        let json: serde_json::Value = serde_json::from_str(&metric.to_json().unwrap()).unwrap();

        assert_eq!(json["MetricName"], "TestMetric2");
        assert_eq!(json["RequestId"], "23478");
        assert_eq!(json["Dimensions"][0]["Name"], "Level");
        assert_eq!(json["Dimensions"][0]["Value"], "Model");
    }
}
