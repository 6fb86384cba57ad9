pub mod functional_model;
pub mod grouping;
pub mod knx;

pub use functional_model::{
    FunctionalModel, FunctionalModelList, FunctionalModelSink, FunctionalModelStructure,
    ModelElement,
};
pub use grouping::{extract_group_address, ImportReport, ImportSource, SourceKind, StructureDepth};
pub use knx::{
    load_project_data_bytes,
    GroupAddressRecord,
    InvalidPasswordError,
    PasswordRequiredError,
};

use serde::Serialize;

/// Result of importing one source into a fresh model list
#[derive(Debug, Clone, Serialize)]
pub struct ImportOutcome {
    pub report: ImportReport,
    pub models: FunctionalModelList,
}

pub fn import_functional_models(source: &ImportSource) -> ImportOutcome {
    let mut models = FunctionalModelList::new();
    let report = extract_group_address(source, &mut models);
    ImportOutcome { report, models }
}
