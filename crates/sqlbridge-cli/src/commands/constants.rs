//! Constants command - list the open-mode flags published to scripts.

use anyhow::Result;
use clap::Args;
use sqlbridge_sqlite::flags::OPEN_FLAGS;

use crate::session::Session;

#[derive(Args)]
pub struct ConstantsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ConstantsCommand {
    pub fn run(&self, session: &Session) -> Result<()> {
        let vm = session.vm();
        let constants: Vec<(&str, i64)> = OPEN_FLAGS
            .iter()
            .filter_map(|(name, _)| vm.get_global(name).as_i64().map(|v| (*name, v)))
            .collect();

        if self.json {
            let map: serde_json::Map<String, serde_json::Value> = constants
                .iter()
                .map(|(name, value)| (name.to_string(), (*value).into()))
                .collect();
            println!("{}", serde_json::to_string_pretty(&map)?);
        } else {
            for (name, value) in constants {
                println!("{:<28} 0x{:08x}", name, value);
            }
        }
        Ok(())
    }
}
