use roxmltree::{Document, Node};

use crate::knx::model::DeviceLink;
use crate::knx::namespace::NamespaceContext;
use crate::knx::xml_tags;
use crate::knx::xml_utils::{attr_value, required_attribute, short_id};

/// Group addresses reachable from each `DeviceInstance` of a project data file.
///
/// Devices without any linked group address are still returned so callers can
/// tell "no links" apart from "unknown device".
pub fn extract_device_links(doc: &Document, ns: &NamespaceContext) -> Vec<DeviceLink> {
    let mut devices = Vec::new();
    for device_node in ns.descendants(doc.root(), xml_tags::DEVICE_INSTANCE) {
        let instance_id = match required_attribute(&device_node, "Id") {
            Ok(value) => value,
            Err(error) => {
                log::warn!("Skipping DeviceInstance without Id: {}", error);
                continue;
            }
        };

        let mut group_address_ids: Vec<String> = Vec::new();
        for com_ref in ns.descendants(device_node, xml_tags::COM_OBJECT_INSTANCE_REF) {
            let links = com_ref
                .attribute("Links")
                .map(parse_links_attribute)
                .unwrap_or_default();
            for id in links
                .iter()
                .map(|link| short_id(link))
                .chain(extract_connector_links(com_ref, ns))
            {
                if !group_address_ids.contains(&id) {
                    group_address_ids.push(id);
                }
            }
        }

        devices.push(DeviceLink {
            instance_id,
            name: attr_value(&device_node, "Name"),
            group_address_ids,
        });
    }
    log::debug!("Read links of {} devices", devices.len());
    devices
}

fn parse_links_attribute(link_attr: &str) -> Vec<String> {
    // `Links` is a whitespace-separated list of GroupAddressRefId values.
    // Commas are accepted as well.
    link_attr
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|value| !value.is_empty())
        .map(|value| value.to_string())
        .collect()
}

fn extract_connector_links(com_ref: Node<'_, '_>, ns: &NamespaceContext) -> Vec<String> {
    let mut ids = Vec::new();
    for connectors in ns.children(com_ref, xml_tags::CONNECTORS) {
        for node in connectors
            .children()
            .filter(|n| ns.matches(n, xml_tags::SEND) || ns.matches(n, xml_tags::RECEIVE))
        {
            if let Some(ref_id) = attr_value(&node, "GroupAddressRefId") {
                ids.push(short_id(&ref_id));
            }
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_links_attribute_preserves_order_and_splits_whitespace() {
        let input = " G-1\nG-2\tG-3  G-4 ";
        let out = parse_links_attribute(input);
        assert_eq!(out, vec!["G-1", "G-2", "G-3", "G-4"]);
    }

    #[test]
    fn parse_links_attribute_accepts_commas_without_reordering() {
        let input = "G-1,G-2, G-3";
        let out = parse_links_attribute(input);
        assert_eq!(out, vec!["G-1", "G-2", "G-3"]);
    }

    #[test]
    fn collects_links_and_connectors_once_per_device() -> anyhow::Result<()> {
        let xml = r#"
        <KNX xmlns="http://knx.org/xml/project/21">
          <Topology>
            <DeviceInstance Id="P-1_DI-1" Name="Actuator">
              <ComObjectInstanceRefs>
                <ComObjectInstanceRef RefId="O-1" Links="P-1_GA-1 GA-2" />
                <ComObjectInstanceRef RefId="O-2">
                  <Connectors>
                    <Send GroupAddressRefId="P-1_GA-3" />
                    <Receive GroupAddressRefId="P-1_GA-1" />
                  </Connectors>
                </ComObjectInstanceRef>
              </ComObjectInstanceRefs>
            </DeviceInstance>
            <DeviceInstance Id="P-1_DI-2" />
            <DeviceInstance Name="Broken" />
          </Topology>
        </KNX>
        "#;
        let doc = roxmltree::Document::parse(xml)?;
        let ns = NamespaceContext::resolve(&doc);
        let devices = extract_device_links(&doc, &ns);
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].instance_id, "P-1_DI-1");
        assert_eq!(devices[0].name.as_deref(), Some("Actuator"));
        assert_eq!(devices[0].group_address_ids, vec!["GA-1", "GA-2", "GA-3"]);
        assert!(devices[1].group_address_ids.is_empty());
        Ok(())
    }
}
