//! Exec command - run SQL for its side effects.

use anyhow::Result;
use clap::Args;

use crate::session::{DbArgs, Session};

#[derive(Args)]
pub struct ExecCommand {
    #[command(flatten)]
    pub db: DbArgs,

    /// SQL to run; several `;`-separated statements run in order
    pub sql: String,
}

impl ExecCommand {
    pub fn run(&self, session: &Session) -> Result<()> {
        let db = session.open(&self.db)?;
        let result = session.call(&db, "exec", &self.sql)?;
        session.close(&db)?;

        println!("{}", result.to_display_string());
        Ok(())
    }
}
