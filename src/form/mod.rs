//! Resource forms
//!
//! - [`controller`] - Submission lifecycle of a single form
//! - [`page`] - Fetch-before-render wrapper for update forms

pub mod controller;
pub mod page;

pub use controller::{FormController, FormMode, Phase, SubmitError};
pub use page::{RenderState, UpdatePage};
