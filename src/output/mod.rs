mod json;
mod markdown;

pub use json::JsonOutput;
pub use markdown::MarkdownOutput;

use crate::model::Verification;
use std::io::Write;

pub trait OutputFormatter {
    fn format<W: Write>(&self, verification: &Verification, writer: &mut W)
    -> std::io::Result<()>;
}
