//! Parsing of complete documentation URLs into module, top-level symbol and
//! remaining path components.

use std::fmt;

use crate::link::component::{DisambiguationSuffix, LinkComponent};

/// A parsed `scheme://bundle-id/documentation/Module/Type/member` link.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AbsoluteSymbolLink {
    pub bundle_id: String,
    /// Module name. Never carries a disambiguation suffix.
    pub module: String,
    /// The first symbol below the module, or the module itself when the link
    /// represents the module.
    pub top_level_symbol: LinkComponent,
    pub base_path_components: Vec<LinkComponent>,
    pub represents_module: bool,
}

impl AbsoluteSymbolLink {
    /// Parse an absolute documentation link.
    ///
    /// Returns `None` for links without a scheme and host, for paths outside
    /// `/documentation`, for a module component with a suffix, or when any
    /// path component fails to parse.
    pub fn parse(link: &str) -> Option<Self> {
        let (scheme, rest) = link.split_once("://")?;
        if scheme.is_empty() {
            return None;
        }

        let rest = rest.split(['#', '?']).next().unwrap_or(rest);
        let (bundle_id, path) = rest.split_once('/')?;
        if bundle_id.is_empty() {
            return None;
        }

        let mut segments = path.split('/').filter(|s| !s.is_empty());
        if segments.next()? != "documentation" {
            return None;
        }

        let module = LinkComponent::parse(segments.next()?)?;
        if module.disambiguation_suffix != DisambiguationSuffix::None {
            return None;
        }

        let Some(top_level) = segments.next() else {
            return Some(Self {
                bundle_id: bundle_id.to_string(),
                top_level_symbol: module.clone(),
                module: module.name,
                base_path_components: Vec::new(),
                represents_module: true,
            });
        };

        let top_level_symbol = LinkComponent::parse(top_level)?;
        let base_path_components = segments
            .map(LinkComponent::parse)
            .collect::<Option<Vec<_>>>()?;

        Some(Self {
            bundle_id: bundle_id.to_string(),
            module: module.name,
            top_level_symbol,
            base_path_components,
            represents_module: false,
        })
    }

    /// All symbol components below the module, top-level symbol first.
    pub fn symbol_components(&self) -> impl Iterator<Item = &LinkComponent> {
        let top = (!self.represents_module).then_some(&self.top_level_symbol);
        top.into_iter().chain(self.base_path_components.iter())
    }
}

impl fmt::Display for AbsoluteSymbolLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc://{}/documentation/{}", self.bundle_id, self.module)?;
        for component in self.symbol_components() {
            write!(f, "/{component}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn module_link() {
        let link = AbsoluteSymbolLink::parse("doc://org.example.MyKit/documentation/MyKit").unwrap();
        assert_eq!(link.bundle_id, "org.example.MyKit");
        assert_eq!(link.module, "MyKit");
        assert!(link.represents_module);
        assert_eq!(link.top_level_symbol.name, "MyKit");
        assert!(link.base_path_components.is_empty());
        assert_eq!(link.symbol_components().count(), 0);
    }

    #[test]
    fn member_link_with_suffixes() {
        let link = AbsoluteSymbolLink::parse(
            "doc://org.example.MyKit/documentation/MyKit/Foo-swift.class/bar-abc123",
        )
        .unwrap();
        assert!(!link.represents_module);
        assert_eq!(link.top_level_symbol.name, "Foo");
        assert_eq!(
            link.top_level_symbol.disambiguation_suffix,
            DisambiguationSuffix::KindIdentifier("swift.class".into())
        );
        assert_eq!(link.base_path_components.len(), 1);
        assert_eq!(link.base_path_components[0].name, "bar");
        assert_eq!(
            link.to_string(),
            "doc://org.example.MyKit/documentation/MyKit/Foo-swift.class/bar-abc123"
        );
    }

    #[test]
    fn fragment_is_ignored() {
        let link =
            AbsoluteSymbolLink::parse("doc://org.example.MyKit/documentation/MyKit/Foo#overview")
                .unwrap();
        assert_eq!(link.top_level_symbol.name, "Foo");
        assert!(link.base_path_components.is_empty());
    }

    #[test]
    fn rejects_malformed_links() {
        assert!(AbsoluteSymbolLink::parse("documentation/MyKit").is_none());
        assert!(AbsoluteSymbolLink::parse("doc://org.example.MyKit/tutorials/MyKit").is_none());
        assert!(AbsoluteSymbolLink::parse("doc://org.example.MyKit/documentation").is_none());
        assert!(
            AbsoluteSymbolLink::parse("doc://org.example.MyKit/documentation/MyKit-swift.class")
                .is_none()
        );
        assert!(
            AbsoluteSymbolLink::parse("doc://org.example.MyKit/documentation/MyKit/Foo/bar-")
                .is_none()
        );
        assert!(AbsoluteSymbolLink::parse("doc:///documentation/MyKit").is_none());
    }
}
