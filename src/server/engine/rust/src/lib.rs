/* src/server/engine/rust/src/lib.rs */

pub mod boundary;
pub mod compose;
pub mod diagnostics;
pub mod escape;
pub mod manifest;
pub mod markup;
pub mod registry;
pub mod resolver;
pub mod suggest;

// Public API re-exports
pub use boundary::{is_render_conflict, BoundaryState, Fault, FaultBoundary, RENDER_CONFLICT_FALLBACK};
pub use compose::{
  BlockSummary, ComposeOptions, ComposedPage, PageComposer, SlotFill, StreamedPage, SuspenseScope,
  WrappedBlock,
};
pub use diagnostics::{Diagnostic, DiagnosticSink, Diagnostics, MemorySink, RuntimeMode};
pub use escape::{escape_html, script_safe_json};
pub use manifest::{is_valid_route, ManifestError, ManifestIssue, PageEntry, PageManifest};
pub use markup::{
  BlockRenderer, Markup, NoopRenderer, Props, RenderError, SharedRenderer, Spinner, StaticRenderer,
  SPINNER_HTML,
};
pub use registry::{BoxFuture, LoadError, LoaderFn, VariantEntry, VariantRegistry};
pub use resolver::{
  cache_key, ComponentResolver, LoadState, RendererHandle, ResolutionCache, ResolveOverrides,
  ResolvedComponent,
};
pub use suggest::{closest, levenshtein, SUGGESTION_LIMIT};
