//! Query commands - print rows as JSON.

use anyhow::Result;
use clap::Args;
use sqlbridge_vm::Value;

use crate::session::{DbArgs, Session};

#[derive(Args)]
pub struct QueryCommand {
    #[command(flatten)]
    pub db: DbArgs,

    /// Query to run
    pub sql: String,

    /// Print compact JSON
    #[arg(long)]
    pub compact: bool,
}

impl QueryCommand {
    pub fn run(&self, session: &Session) -> Result<()> {
        let result = query(session, &self.db, "query", &self.sql)?;
        print_json(&result, self.compact)
    }
}

#[derive(Args)]
pub struct QueryOneCommand {
    #[command(flatten)]
    pub db: DbArgs,

    /// Query to run; only the first row is printed
    pub sql: String,

    /// Print compact JSON
    #[arg(long)]
    pub compact: bool,
}

impl QueryOneCommand {
    pub fn run(&self, session: &Session) -> Result<()> {
        let row = query(session, &self.db, "queryOne", &self.sql)?;
        print_json(&row, self.compact)
    }
}

fn query(session: &Session, args: &DbArgs, method: &str, sql: &str) -> Result<Value> {
    let db = session.open(args)?;
    let result = session.call(&db, method, sql)?;
    session.close(&db)?;
    Ok(result)
}

fn print_json(value: &Value, compact: bool) -> Result<()> {
    let json = value.to_json();
    if compact {
        println!("{}", serde_json::to_string(&json)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&json)?);
    }
    Ok(())
}
