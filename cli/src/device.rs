use std::time::Duration;

use dialoguer::Select;
use mensacard::pcsc::{Context, Device};

use crate::{Error, Result};

/// Lists names of the readers attached to PC/SC.
pub fn readers() -> Result<Vec<String>> {
    Ok(Context::try_new()?.readers()?)
}

/// Opens the reader with the name, or the only one attached.
/// Asks the user to choose when several readers are attached.
pub fn open(name: Option<&str>, timeout: Option<Duration>) -> Result<Device> {
    let ctx = Context::try_new()?;
    let device = match name {
        Some(name) => ctx.open_by_name(name)?,
        None => {
            let readers = ctx.readers()?;
            match readers.len() {
                0 => return Err(Error::NoReader(t!("reader.none"))),
                1 => ctx.open()?,
                _ => {
                    let index = Select::new()
                        .with_prompt(t!("reader.select"))
                        .items(&readers)
                        .default(0)
                        .interact()?;

                    ctx.open_by_name(&readers[index])?
                }
            }
        }
    };

    Ok(match timeout {
        Some(timeout) => device.with_timeout(timeout),
        None => device,
    })
}
