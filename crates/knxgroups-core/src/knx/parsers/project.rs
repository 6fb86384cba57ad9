use roxmltree::Document;

use crate::knx::namespace::NamespaceContext;
use crate::knx::xml_tags;

pub const DEFAULT_PROJECT_NAME: &str = "KNX Project";

pub fn extract_project_name(doc: &Document, ns: &NamespaceContext) -> String {
    ns.descendants(doc.root(), xml_tags::PROJECT_INFORMATION)
        .next()
        .and_then(|node| node.attribute("Name"))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_PROJECT_NAME)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_default_name() -> anyhow::Result<()> {
        let doc = roxmltree::Document::parse(r#"<KNX><Project><ProjectInformation Name=" " /></Project></KNX>"#)?;
        let ns = NamespaceContext::resolve(&doc);
        assert_eq!(extract_project_name(&doc, &ns), DEFAULT_PROJECT_NAME);

        let doc = roxmltree::Document::parse(r#"<KNX><ProjectInformation Name="Villa" /></KNX>"#)?;
        let ns = NamespaceContext::resolve(&doc);
        assert_eq!(extract_project_name(&doc, &ns), "Villa");
        Ok(())
    }
}
