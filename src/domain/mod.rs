//! Domain value types

mod message;

pub use message::{Message, Recipient, RenderedTemplate, Sender, TemplateModel};
