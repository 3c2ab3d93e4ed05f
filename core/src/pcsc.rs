//! PC/SC support for mensacard library.
//! Can be enabled by turning `pcsc` feature on.
//!
//! ## What is PC/SC?
//! PC/SC (Personal Computer/Smart Card) is an abstraction layer for communicating with Smart Cards
//! from Windows. Using this layer, applications can connect to any devices that supports PC/SC,
//! without depending on their driver implementation. Windows and macOS supports PC/SC by themselves,
//! Linux also supports by installing pcsc-lite shared library.
//!
//! Most contactless desk readers expose ISO-DEP cards through PC/SC, so a Mensa card can be read
//! from a PC the same way a phone reads it.
//!
//! ## Usage
//! ```rust,no_run
//! use mensacard::pcsc::Context;
//! use mensacard::{read_card_information, Config};
//!
//! let ctx = Context::try_new().unwrap();
//! let device = ctx.open().unwrap();
//!
//! let reading = read_card_information((), &device, &Config::default());
//! ```

use std::ffi::{CStr, CString};
use std::thread::sleep;
use std::time::{Duration, Instant};

use pcsc::{Card, Disposition, Protocols, Scope, ShareMode, MAX_BUFFER_SIZE};

use crate::nfc::{self, LinkProvider, RequestOptions, Technology};
use crate::{debug, info};

const POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Error occurred while communicating with PC/SC: {0}")]
    PcscError(#[from] pcsc::Error),

    #[error("Reader not found on PC/SC service")]
    ReaderNotFound,
}

impl From<Error> for nfc::Error {
    fn from(e: Error) -> Self {
        nfc::Error::other(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// PC/SC context.
pub struct Context {
    ctx: pcsc::Context,
}

impl Context {
    /// Creates a PC/SC context in user scope.
    pub fn try_new() -> Result<Self> {
        Ok(Self {
            ctx: pcsc::Context::establish(Scope::User)?,
        })
    }

    /// Lists names of the readers attached to the PC/SC service.
    pub fn readers(&self) -> Result<Vec<String>> {
        let mut buf = [0u8; 2048];

        Ok(self
            .ctx
            .list_readers(&mut buf)?
            .map(|r| r.to_string_lossy().into_owned())
            .collect())
    }

    /// Finds the first PC/SC device, then opens a connection to them.
    pub fn open(self) -> Result<Device> {
        let mut buf = [0u8; 2048];
        let reader = self
            .ctx
            .list_readers(&mut buf)?
            .next()
            .ok_or(Error::ReaderNotFound)?
            .to_owned();

        Ok(Device::new(self, reader))
    }

    /// Opens a connection to the PC/SC device with the name.
    pub fn open_by_name(self, name: &str) -> Result<Device> {
        let mut buf = [0u8; 2048];
        let reader = self
            .ctx
            .list_readers(&mut buf)?
            .find(|r| r.to_string_lossy() == name)
            .ok_or(Error::ReaderNotFound)?
            .to_owned();

        Ok(Device::new(self, reader))
    }
}

/// PC/SC device handle, acting as the link provider.
pub struct Device {
    ctx: Context,
    reader: CString,
    timeout: Option<Duration>,
}

impl Device {
    fn new(ctx: Context, reader: CString) -> Self {
        debug!("Using device: {}", reader.to_str().unwrap_or_default());

        Self {
            ctx,
            reader,
            timeout: None,
        }
    }

    /// Gives up waiting for a card after the duration.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn name(&self) -> &CStr {
        &self.reader
    }

    /// Connects to the card put on the device after waiting them.
    fn connect(&self) -> nfc::Result<Card> {
        let started = Instant::now();

        // Waits for touching card, polling for each seconds.
        debug!("Waiting for a card");

        loop {
            match self
                .ctx
                .ctx
                .connect(&self.reader, ShareMode::Shared, Protocols::ANY)
            {
                Ok(card) => {
                    debug!("Connected to your card");

                    return Ok(card);
                }
                Err(pcsc::Error::NoSmartcard) | Err(pcsc::Error::RemovedCard) => {
                    if matches!(self.timeout, Some(t) if started.elapsed() >= t) {
                        return Err(nfc::Error::Timeout);
                    }

                    info!("Still waiting for your card...");
                    sleep(POLL_INTERVAL);
                }
                Err(pcsc::Error::Cancelled) => return Err(nfc::Error::Cancelled),
                Err(e) => return Err(Error::PcscError(e).into()),
            }
        }
    }
}

type Ctx = ();

impl LinkProvider<Ctx> for Device {
    type Link = Card;
    type Tag = Vec<u8>;

    fn request_technology(
        &self,
        _: Ctx,
        kind: Technology,
        options: &RequestOptions,
    ) -> nfc::Result<Option<Card>> {
        // Readers negotiate the protocol themselves, so every kind maps to the same connection.
        debug!(?kind, "Requesting technology through PC/SC");
        info!("{}", options.alert_message);

        self.connect().map(Some)
    }

    fn get_tag(&self, _: Ctx, link: &Card) -> nfc::Result<Vec<u8>> {
        let status = link.status2_owned().map_err(Error::PcscError)?;
        let atr = status.atr().to_vec();

        debug!("ATR: {}", hex::encode(&atr));

        Ok(atr)
    }

    /// Transmits an APDU command to the card, then receives a response from them.
    fn transceive(&self, _: Ctx, link: &Card, tx: &[u8]) -> nfc::Result<Vec<u8>> {
        debug!("TX: {}", hex::encode(tx));

        let mut rx = [0u8; MAX_BUFFER_SIZE];
        let rx = link.transmit(tx, &mut rx).map_err(Error::PcscError)?;

        debug!("RX: {}", hex::encode(rx));

        Ok(Vec::from(rx))
    }

    fn release(&self, _: Ctx, link: Option<Card>) -> nfc::Result<()> {
        match link {
            Some(card) => card
                .disconnect(Disposition::LeaveCard)
                .map_err(|(_, e)| Error::PcscError(e).into()),
            None => Ok(()),
        }
    }
}
