//! `docweave-core`: documentation compiler core for symbol-graph bundles.
//!
//! Turns markup articles, tutorials and symbol graphs into linked HTML and
//! markdown pages. Symbol links are disambiguated with the shortest suffix
//! that keeps them unique, pages are curated into a topic graph, and every
//! page gets a canonical breadcrumb path.
//!
//! # Quick start
//!
//! ```
//! let result = docweave_core::markup::parse("# Hello\n\nSee ``Foo``.\n");
//! assert!(result.diagnostics.is_empty());
//! assert_eq!(result.document.title().as_deref(), Some("Hello"));
//! ```

pub mod context;
pub mod convert;
pub mod directive;
pub mod error;
pub mod graph;
pub mod hierarchy;
pub mod link;
pub mod manifest;
pub mod markup;
pub mod render;
pub mod symbol_graph;

pub use context::{BundleInfo, BundleInput, DocumentationContext, Page, SourceDiagnostic, SourceFile};
pub use convert::{ConvertOptions, ConvertOutput, ConvertedPage, OutputFormat, convert_bundle};
pub use error::{Diagnostic, Error, Severity, Span};
pub use manifest::{Relationship, RelationshipManifest, RelationshipType};
pub use symbol_graph::SymbolGraph;
