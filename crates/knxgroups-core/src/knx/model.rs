use serde::{Deserialize, Serialize};

/// One group address read from an ETS export or project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupAddressRecord {
    /// Short ETS identifier (e.g. "GA-12"), when the source carries one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// User-defined name
    pub name: String,
    /// Group address in display form ("M/M/S", "M/S" or raw)
    pub address: String,
    /// Datapoint type (e.g., "DPST-1-1")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datapoint_type: Option<String>,
    /// Name of the outermost enclosing range (if available)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_group: Option<String>,
    /// Name of the second enclosing range (if available)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_group: Option<String>,
    /// First address of the innermost enclosing range (if available)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range_start: Option<u16>,
    /// Last address of the innermost enclosing range (if available)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range_end: Option<u16>,
}

impl GroupAddressRecord {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            address: address.into(),
            datapoint_type: None,
            main_group: None,
            middle_group: None,
            range_start: None,
            range_end: None,
        }
    }
}

/// A `GroupRange` with inclusive bounds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRange {
    pub name: Option<String>,
    pub start: u16,
    pub end: u16,
}

impl AddressRange {
    pub fn overlaps(&self, other: &AddressRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// Group addresses linked by the communication objects of one device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceLink {
    /// DeviceInstance Id
    pub instance_id: String,
    /// Device name (if available)
    pub name: Option<String>,
    /// Short ids of the linked group addresses, in document order
    pub group_address_ids: Vec<String>,
}

/// Documents extracted from a `.knxproj` archive
#[derive(Debug, Clone)]
pub struct ProjectDocuments {
    pub project_name: String,
    /// Contents of the project data file (`0.xml`)
    pub data_xml: String,
}
