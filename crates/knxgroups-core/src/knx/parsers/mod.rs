pub mod device_links;
pub mod group_addresses;
pub mod project;
pub mod ranges;
