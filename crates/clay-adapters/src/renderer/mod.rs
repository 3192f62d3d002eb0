//! Template renderer adapters.

mod case;
mod hbs;

pub use hbs::HandlebarsRenderer;
