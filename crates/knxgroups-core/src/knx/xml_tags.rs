pub const GROUP_ADDRESS_EXPORT: &str = "GroupAddress-Export";
pub const GROUP_ADDRESSES: &str = "GroupAddresses";
pub const GROUP_RANGE: &str = "GroupRange";
pub const GROUP_ADDRESS: &str = "GroupAddress";

pub const PROJECT_INFORMATION: &str = "ProjectInformation";
pub const INSTALLATIONS: &str = "Installations";
pub const TOPOLOGY: &str = "Topology";

pub const DEVICE_INSTANCE: &str = "DeviceInstance";
pub const COM_OBJECT_INSTANCE_REF: &str = "ComObjectInstanceRef";
pub const CONNECTORS: &str = "Connectors";
pub const SEND: &str = "Send";
pub const RECEIVE: &str = "Receive";
