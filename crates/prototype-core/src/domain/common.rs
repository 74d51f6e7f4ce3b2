use std::fmt;

/// One step from a parent operand to a child operand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A struct field, by label.
    Field(String),
    /// A sequence element.
    Index(usize),
    /// A mapping entry, by stringified key.
    Key(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => write!(f, ".{name}"),
            Self::Index(i) => write!(f, "[{i}]"),
            Self::Key(key) => write!(f, "[{key:?}]"),
        }
    }
}

/// The ordered sequence of labels from the root operand to the current node.
///
/// Only used for diagnostics: every engine error carries the full path of
/// the node that failed. Displayed as `$`, `$.Code.Error.Msg`,
/// `$.Items[2]`, `$.Tags["env"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FullPath(Vec<PathSegment>);

impl FullPath {
    /// The empty path of the root operand.
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }

    pub fn pop(&mut self) -> Option<PathSegment> {
        self.0.pop()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// A new path with `segment` appended.
    pub fn join(&self, segment: PathSegment) -> Self {
        let mut next = self.clone();
        next.push(segment);
        next
    }

    /// Builder-style field step.
    pub fn field(self, name: impl Into<String>) -> Self {
        self.join(PathSegment::Field(name.into()))
    }

    /// Builder-style index step.
    pub fn index(self, i: usize) -> Self {
        self.join(PathSegment::Index(i))
    }

    /// Builder-style key step.
    pub fn key(self, key: impl Into<String>) -> Self {
        self.join(PathSegment::Key(key.into()))
    }
}

impl fmt::Display for FullPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in &self.0 {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_displays_as_dollar() {
        assert_eq!(FullPath::root().to_string(), "$");
        assert!(FullPath::root().is_root());
    }

    #[test]
    fn mixed_segments_display() {
        let path = FullPath::root().field("Code").field("Items").index(2).key("env");
        assert_eq!(path.to_string(), r#"$.Code.Items[2]["env"]"#);
        assert_eq!(path.depth(), 4);
    }

    #[test]
    fn push_and_pop_are_symmetric() {
        let mut path = FullPath::root();
        path.push(PathSegment::Field("A".into()));
        path.push(PathSegment::Index(0));
        assert_eq!(path.pop(), Some(PathSegment::Index(0)));
        assert_eq!(path.to_string(), "$.A");
    }
}
