//! Utility functions and types.
use serde::{Deserialize, Serialize};

/// The value of a variable at a given time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time: f64,
    pub value: f64,
}

/// The recorded time series of a single named variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub name: String,
    pub samples: Vec<Sample>,
}

impl Trace {
    pub fn new(name: &str) -> Self {
        Trace {
            name: name.to_string(),
            samples: vec![],
        }
    }

    /// Returns the recorded samples as ordered (time, value) pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.samples.iter().map(|s| (s.time, s.value))
    }

    /// Returns the recorded values, without their times.
    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the last recorded value, if any.
    pub fn last(&self) -> Option<f64> {
        self.samples.last().map(|s| s.value)
    }
}

/// A collection of traces, one per recorded variable, in recording order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Traces {
    traces: Vec<Trace>,
}

impl Traces {
    pub fn new() -> Self {
        Traces { traces: vec![] }
    }

    /// Append one sample per variable. Unknown variables get a new trace.
    pub fn record(&mut self, time: f64, variables: &[(&'static str, f64)]) {
        for &(name, value) in variables {
            let pos = match self.traces.iter().position(|trace| trace.name == name) {
                Some(pos) => pos,
                None => {
                    self.traces.push(Trace::new(name));
                    self.traces.len() - 1
                }
            };
            self.traces[pos].samples.push(Sample { time, value });
        }
    }

    /// Returns the trace of the variable with the given name, if recorded.
    pub fn get(&self, name: &str) -> Option<&Trace> {
        self.traces.iter().find(|trace| trace.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Trace> {
        self.traces.iter()
    }

    /// Returns the names of the recorded variables.
    pub fn names(&self) -> Vec<&str> {
        self.traces.iter().map(|trace| trace.name.as_str()).collect()
    }

    pub fn clear(&mut self) {
        self.traces.clear();
    }
}

/// Round a time to the closest multiple of the resolution.
pub fn snap(time: f64, resolution: f64) -> f64 {
    (time / resolution).round() * resolution
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_traces_record() {
        let mut traces = Traces::new();
        traces.record(0.0, &[("v", -65.0), ("i", 0.0)]);
        traces.record(0.1, &[("v", -64.0), ("i", 1.0)]);

        assert_eq!(traces.names(), vec!["v", "i"]);
        let v = traces.get("v").unwrap();
        assert_eq!(v.pairs().collect::<Vec<_>>(), vec![(0.0, -65.0), (0.1, -64.0)]);
        assert_eq!(traces.get("i").unwrap().last(), Some(1.0));
        assert!(traces.get("u").is_none());
    }

    #[test]
    fn test_trace_serialization() {
        let mut traces = Traces::new();
        traces.record(0.25, &[("weight", 1.0)]);
        let json = serde_json::to_string(traces.get("weight").unwrap()).unwrap();
        assert_eq!(
            json,
            r#"{"name":"weight","samples":[{"time":0.25,"value":1.0}]}"#
        );
    }

    #[test]
    fn test_snap() {
        assert_relative_eq!(snap(0.0104, 0.001), 0.01, epsilon = 1e-12);
        assert_eq!(snap(2.6, 1.0), 3.0);
    }
}
