mod extract;
mod render;
mod types;
pub mod variables;

pub use extract::extract_variables;
pub use render::{render_template, RenderedTemplate};
pub use types::{Template, TemplateDraft};
pub use variables::{prompt_variables, system_variables, VariableValues};
