pub mod assets;
pub mod descriptor;
pub mod directive;
pub mod display;
pub mod realizer;
pub mod speech;
pub mod tokens;
pub mod variant;

pub use descriptor::ContentDescriptor;
pub use realizer::{ContentResolver, ResolvedResponse};
pub use tokens::{ReplaceTokens, TokenMap};
pub use variant::Variant;
