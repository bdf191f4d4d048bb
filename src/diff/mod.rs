mod collection;
mod patch;
mod text;

pub use collection::{build as build_collection, Change, Collection};
pub use patch::{diff, patch_key, Cell, DiffJob, DiffMap, Patch, Row, RowType};
pub use text::is_text_path;

#[cfg(test)]
pub use collection::Entry;
#[cfg(test)]
pub use patch::diff_text;
