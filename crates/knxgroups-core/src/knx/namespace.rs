use roxmltree::{Document, Node};

/// KNX namespace of one parsed document.
///
/// ETS writes every element of `0.xml` and of the group-address export under a
/// versioned namespace (`http://knx.org/xml/project/21`,
/// `http://knx.org/xml/ga-export/01`, ...). The namespace is read once from the
/// document root and handed to every traversal of that document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceContext {
    uri: Option<String>,
}

impl NamespaceContext {
    pub fn resolve(doc: &Document) -> Self {
        let uri = doc
            .root_element()
            .tag_name()
            .namespace()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| value.to_string());
        match &uri {
            Some(value) => log::debug!("Resolved KNX namespace {}", value),
            None => log::debug!("Document has no default namespace"),
        }
        Self { uri }
    }

    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    /// Whether `node` is the element `tag` inside this namespace.
    pub fn matches(&self, node: &Node<'_, '_>, tag: &str) -> bool {
        if !node.is_element() || node.tag_name().name() != tag {
            return false;
        }
        match (&self.uri, node.tag_name().namespace()) {
            (Some(expected), Some(actual)) => expected == actual,
            (Some(_), None) => false,
            (None, _) => true,
        }
    }

    pub fn descendants<'a, 'input>(
        &'a self,
        node: Node<'a, 'input>,
        tag: &'a str,
    ) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
        node.descendants().filter(move |item| self.matches(item, tag))
    }

    pub fn children<'a, 'input>(
        &'a self,
        node: Node<'a, 'input>,
        tag: &'a str,
    ) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
        node.children().filter(move |item| self.matches(item, tag))
    }

    pub fn ancestors<'a, 'input>(
        &'a self,
        node: Node<'a, 'input>,
        tag: &'a str,
    ) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
        node.ancestors().skip(1).filter(move |item| self.matches(item, tag))
    }
}
