use serde::{Deserialize, Serialize};

use crate::grouping::normalize::{address_role, AddressRole};
use crate::grouping::structure::StructureDepth;
use crate::knx::model::GroupAddressRecord;

/// One group address inside a functional model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelElement {
    pub role: AddressRole,
    pub record: GroupAddressRecord,
}

/// Layout of a functional model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionalModelStructure {
    /// Hierarchy depth of the installation the model was built from
    pub depth: StructureDepth,
    /// Member addresses in grouping order
    pub elements: Vec<ModelElement>,
}

impl FunctionalModelStructure {
    pub fn count_role(&self, role: AddressRole) -> usize {
        self.elements.iter().filter(|element| element.role == role).count()
    }
}

/// Test template built from one group of related addresses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionalModel {
    /// Display name, unique inside its list
    pub name: String,
    /// Grouping key the model was built from
    pub key: String,
    pub structure: FunctionalModelStructure,
}

impl FunctionalModel {
    pub fn from_records(
        name: impl Into<String>,
        key: impl Into<String>,
        depth: StructureDepth,
        records: Vec<GroupAddressRecord>,
    ) -> Self {
        let elements = records
            .into_iter()
            .map(|record| ModelElement {
                role: address_role(&record.name),
                record,
            })
            .collect();
        Self {
            name: name.into(),
            key: key.into(),
            structure: FunctionalModelStructure { depth, elements },
        }
    }

    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        self.structure
            .elements
            .iter()
            .map(|element| element.record.address.as_str())
    }

    pub fn len(&self) -> usize {
        self.structure.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structure.elements.is_empty()
    }
}

/// Receiver of the models produced by an import.
pub trait FunctionalModelSink {
    fn contains_model(&self, name: &str) -> bool;
    fn add_functional_model(&mut self, model: FunctionalModel);
}

/// Ordered collection of functional models
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionalModelList {
    models: Vec<FunctionalModel>,
}

impl FunctionalModelList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn models(&self) -> &[FunctionalModel] {
        &self.models
    }

    pub fn get(&self, name: &str) -> Option<&FunctionalModel> {
        self.models.iter().find(|model| model.name == name)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl FunctionalModelSink for FunctionalModelList {
    fn contains_model(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    fn add_functional_model(&mut self, model: FunctionalModel) {
        self.models.push(model);
    }
}
