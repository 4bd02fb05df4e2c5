// Dataset domain model

/// Where a dataset's rows come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource<'a> {
    Excel(&'a str),
    StoredProcedure(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pub name: String,
    pub stored_procedure_name: Option<String>,
    pub excel_path: Option<String>,
    pub is_from_excel: bool,
}

impl Dataset {
    pub fn from_excel(name: impl Into<String>, excel_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stored_procedure_name: None,
            excel_path: Some(excel_path.into()),
            is_from_excel: true,
        }
    }

    pub fn from_stored_procedure(name: impl Into<String>, procedure: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stored_procedure_name: Some(procedure.into()),
            excel_path: None,
            is_from_excel: false,
        }
    }

    /// Resolve the backing source from the `is_from_excel` discriminator.
    /// The field that does not match the flag is ignored; a missing one reads as "".
    pub fn source(&self) -> DatasetSource<'_> {
        if self.is_from_excel {
            DatasetSource::Excel(self.excel_path.as_deref().unwrap_or_default())
        } else {
            DatasetSource::StoredProcedure(self.stored_procedure_name.as_deref().unwrap_or_default())
        }
    }

    /// Stored procedure column as written: always NULL for spreadsheet datasets.
    pub fn persisted_procedure(&self) -> Option<&str> {
        if self.is_from_excel {
            None
        } else {
            self.stored_procedure_name.as_deref()
        }
    }
}
