// Wire types; field names match what the chart front end sends and expects
use crate::domain::dashboard::Dashboard;
use crate::domain::dataset::Dataset;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DatasetDto {
    pub dataset_name: String,
    pub sp: String,
    pub excel_path: String,
    pub is_it_from_excel: bool,
}

impl From<Dataset> for DatasetDto {
    fn from(dataset: Dataset) -> Self {
        Self {
            dataset_name: dataset.name,
            sp: dataset.stored_procedure_name.unwrap_or_default(),
            excel_path: dataset.excel_path.unwrap_or_default(),
            is_it_from_excel: dataset.is_from_excel,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterProcedureRequest {
    pub dataset_name: String,
    #[serde(alias = "sp")]
    pub stored_procedure_name: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardDto {
    pub dashboard_name: String,
    pub dataset_name: String,
    pub json_format: String,
    pub is_multiple: bool,
}

impl From<Dashboard> for DashboardDto {
    fn from(dashboard: Dashboard) -> Self {
        Self {
            dashboard_name: dashboard.name,
            dataset_name: dashboard.dataset_name,
            json_format: dashboard.chart_spec,
            is_multiple: dashboard.is_multiple,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDashboardRequest {
    pub dashboard_name: String,
    pub dataset_name: String,
    pub json_format: String,
    /// Derived from `json_format` when the client leaves it out
    pub is_multiple: Option<bool>,
}

impl From<SaveDashboardRequest> for Dashboard {
    fn from(req: SaveDashboardRequest) -> Self {
        let is_multiple = req
            .is_multiple
            .unwrap_or_else(|| Dashboard::spec_is_list(&req.json_format));
        Dashboard::new(req.dashboard_name, req.dataset_name, req.json_format, is_multiple)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExcelReadQuery {
    pub excel_path: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcedureQuery {
    pub stored_procedure_name: String,
}
