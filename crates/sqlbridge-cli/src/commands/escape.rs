//! Escape command - double single quotes for a SQL literal.

use anyhow::Result;
use clap::Args;
use sqlbridge_vm::Value;

use crate::session::Session;

#[derive(Args)]
pub struct EscapeCommand {
    /// Text to escape
    pub text: String,
}

impl EscapeCommand {
    pub fn run(&self, session: &Session) -> Result<()> {
        let escaped = session
            .vm()
            .call_global("escape", vec![Value::from(self.text.as_str())])?;
        println!("{}", escaped.to_display_string());
        Ok(())
    }
}
