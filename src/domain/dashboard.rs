// Dashboard domain model

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dashboard {
    pub name: String,
    pub dataset_name: String,
    /// Serialized chart specification, stored and returned untouched.
    pub chart_spec: String,
    pub is_multiple: bool,
}

impl Dashboard {
    pub fn new(name: String, dataset_name: String, chart_spec: String, is_multiple: bool) -> Self {
        Self {
            name,
            dataset_name,
            chart_spec,
            is_multiple,
        }
    }

    /// True when the blob is a JSON array holding more than one chart.
    pub fn spec_is_list(chart_spec: &str) -> bool {
        match serde_json::from_str::<serde_json::Value>(chart_spec) {
            Ok(serde_json::Value::Array(items)) => items.len() > 1,
            _ => false,
        }
    }
}
