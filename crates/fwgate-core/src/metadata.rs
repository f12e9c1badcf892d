//! Read-only component metadata access.
//!
//! Components are described by a metadata document (an element tree with
//! attributes and text). The document store and its query engine live
//! outside this crate; the pipeline only needs a handful of lookups, so
//! the tree is abstracted behind the minimal [`MetadataNode`] trait plus
//! a tiny path language:
//!
//! - `a/b` descends through child elements,
//! - `*` matches any child element,
//! - `a[@key='value']` filters children on an attribute.
//!
//! [`MemoryNode`] is an owned in-memory implementation for callers that
//! do not have a real document store, and for tests. [`Component`] and
//! [`Release`] are typed views layering the domain vocabulary over the
//! raw tree.

/// Custom metadata key naming the update protocol a component requires.
pub const CUSTOM_KEY_UPDATE_PROTOCOL: &str = "UpdateProtocol";

/// Custom metadata key declaring a version format the component supports.
pub const CUSTOM_KEY_VERSION_FORMAT: &str = "VersionFormat";

/// Minimal read-only view of one element in a metadata document.
///
/// Implementations may be backed by any tree; the pipeline only ever
/// walks downward from the component root.
pub trait MetadataNode {
    /// The element name, e.g. `firmware`.
    fn element(&self) -> &str;

    /// The element's text content, if any. Whitespace-only content counts
    /// as absent.
    fn text(&self) -> Option<&str>;

    /// An attribute value by name.
    fn attr(&self, name: &str) -> Option<&str>;

    /// Child elements in document order.
    fn children(&self) -> Vec<&dyn MetadataNode>;
}

/// One parsed segment of a query path.
struct PathSegment<'p> {
    element: &'p str,
    attr: Option<(&'p str, &'p str)>,
}

impl<'p> PathSegment<'p> {
    /// Parses `name` or `name[@key='value']`. A malformed predicate is
    /// treated as matching nothing rather than panicking.
    fn parse(raw: &'p str) -> Self {
        let Some((element, rest)) = raw.split_once("[@") else {
            return Self {
                element: raw,
                attr: None,
            };
        };
        let attr = rest
            .strip_suffix("']")
            .and_then(|inner| inner.split_once("='"));
        Self { element, attr }
    }

    fn matches(&self, node: &dyn MetadataNode) -> bool {
        if self.element != "*" && node.element() != self.element {
            return false;
        }
        match self.attr {
            Some((key, value)) => node.attr(key) == Some(value),
            None => true,
        }
    }
}

/// Returns every node reached by `path` from `node`, in document order.
#[must_use]
pub fn find_all<'a>(node: &'a dyn MetadataNode, path: &str) -> Vec<&'a dyn MetadataNode> {
    let mut frontier = vec![node];
    for raw in path.split('/') {
        let segment = PathSegment::parse(raw);
        frontier = frontier
            .into_iter()
            .flat_map(MetadataNode::children)
            .filter(|child| segment.matches(*child))
            .collect();
        if frontier.is_empty() {
            break;
        }
    }
    frontier
}

/// Returns the first node reached by `path`, in document order.
#[must_use]
pub fn find_first<'a>(node: &'a dyn MetadataNode, path: &str) -> Option<&'a dyn MetadataNode> {
    find_all(node, path).into_iter().next()
}

/// Returns the text of the first node reached by `path`.
#[must_use]
pub fn query_text<'a>(node: &'a dyn MetadataNode, path: &str) -> Option<&'a str> {
    find_first(node, path).and_then(MetadataNode::text)
}

/// Owned in-memory metadata tree.
///
/// Construction is by chaining:
///
/// ```
/// use fwgate_core::metadata::MemoryNode;
///
/// let component = MemoryNode::new("component").with_child(
///     MemoryNode::new("releases")
///         .with_child(MemoryNode::new("release").with_attr("version", "1.2.3")),
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryNode {
    element: String,
    text: Option<String>,
    attrs: Vec<(String, String)>,
    children: Vec<MemoryNode>,
}

impl MemoryNode {
    /// Creates an element with no text, attributes, or children.
    #[must_use]
    pub fn new(element: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            text: None,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Sets the text content.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Adds an attribute.
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Appends a child element.
    #[must_use]
    pub fn with_child(mut self, child: MemoryNode) -> Self {
        self.children.push(child);
        self
    }
}

impl MetadataNode for MemoryNode {
    fn element(&self) -> &str {
        &self.element
    }

    fn text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn children(&self) -> Vec<&dyn MetadataNode> {
        self.children
            .iter()
            .map(|c| c as &dyn MetadataNode)
            .collect()
    }
}

/// Typed view over a component's metadata root.
#[derive(Clone, Copy)]
pub struct Component<'a> {
    root: &'a dyn MetadataNode,
}

impl<'a> Component<'a> {
    /// Wraps a metadata root element.
    #[must_use]
    pub fn new(root: &'a dyn MetadataNode) -> Self {
        Self { root }
    }

    /// The underlying metadata root.
    #[must_use]
    pub fn root(&self) -> &'a dyn MetadataNode {
        self.root
    }

    /// GUIDs of every `provides/firmware[@type='flashed']` entry.
    #[must_use]
    pub fn flashed_firmware_guids(&self) -> Vec<&'a str> {
        find_all(self.root, "provides/firmware[@type='flashed']")
            .into_iter()
            .filter_map(MetadataNode::text)
            .collect()
    }

    /// Returns `true` if the component carries a `firmware` requirement
    /// with no version predicate, i.e. the marker that the firmware
    /// supports pre-flash version verification.
    #[must_use]
    pub fn has_bare_firmware_requirement(&self) -> bool {
        find_all(self.root, "requires/*")
            .into_iter()
            .any(|req| req.element() == "firmware" && req.text().is_none())
    }

    /// The update protocol the component requires, if declared.
    #[must_use]
    pub fn update_protocol(&self) -> Option<&'a str> {
        self.custom_value(CUSTOM_KEY_UPDATE_PROTOCOL)
    }

    /// All version formats the component declares support for.
    #[must_use]
    pub fn declared_version_formats(&self) -> Vec<&'a str> {
        find_all(
            self.root,
            &format!("custom/value[@key='{CUSTOM_KEY_VERSION_FORMAT}']"),
        )
        .into_iter()
        .filter_map(MetadataNode::text)
        .collect()
    }

    /// The firmware branch this component belongs to. Absent means the
    /// default branch.
    #[must_use]
    pub fn branch(&self) -> Option<&'a str> {
        query_text(self.root, "branch")
    }

    /// The first release in document order, which by convention is the
    /// newest one.
    #[must_use]
    pub fn first_release(&self) -> Option<Release<'a>> {
        find_first(self.root, "releases/release").map(Release::new)
    }

    fn custom_value(&self, key: &str) -> Option<&'a str> {
        query_text(self.root, &format!("custom/value[@key='{key}']"))
    }
}

impl std::fmt::Debug for Component<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("element", &self.root.element())
            .finish_non_exhaustive()
    }
}

/// Typed view over one release element.
#[derive(Clone, Copy)]
pub struct Release<'a> {
    node: &'a dyn MetadataNode,
}

impl<'a> Release<'a> {
    /// Wraps a release element.
    #[must_use]
    pub fn new(node: &'a dyn MetadataNode) -> Self {
        Self { node }
    }

    /// The raw declared version, straight from the `version` attribute.
    #[must_use]
    pub fn version(&self) -> Option<&'a str> {
        self.node.attr("version")
    }

    /// The underlying release element, e.g. for signature evaluation.
    #[must_use]
    pub fn node(&self) -> &'a dyn MetadataNode {
        self.node
    }
}

impl std::fmt::Debug for Release<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Release")
            .field("version", &self.version())
            .finish_non_exhaustive()
    }
}
