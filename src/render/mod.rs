//! HTML output: the document shell and one renderer per page.

pub mod html;
pub mod pages;

pub use pages::{latex_source, render_page};
