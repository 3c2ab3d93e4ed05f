//! Communicating with the card using NFC technology

/// Localisation key of the prompt shown while waiting for the card.
pub const DEFAULT_ALERT_MESSAGE: &str = "cardInformation.iosPlaceCard";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("The technology request was cancelled")]
    Cancelled,

    #[error("Timed out waiting for a card")]
    Timeout,

    #[error("Response does not fit into the buffer ({0} octets required)")]
    NotEnoughBuffer(usize),

    #[error("Error occurred on communicating with NFC device: {0}")]
    Other(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wraps any error raised by the underlying NFC stack.
    pub fn other<E>(e: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Other(e.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Technology used to talk to the card.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Technology {
    /// ISO 14443-4 (ISO-DEP) transceive.
    IsoDep,

    /// MIFARE native commands, as exposed on iOS.
    MifareIos,
}

/// Mechanism used to send a single command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Exchange {
    Transceive,
    MifareCommand,
}

/// Platform the provider is running on.
/// Selects the technology to request and the mechanism to exchange commands with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Platform {
    #[default]
    Android,
    Ios,
}

impl Platform {
    pub fn technology(self) -> Technology {
        match self {
            Platform::Android => Technology::IsoDep,
            Platform::Ios => Technology::MifareIos,
        }
    }

    pub fn exchange(self) -> Exchange {
        match self {
            Platform::Android => Exchange::Transceive,
            Platform::Ios => Exchange::MifareCommand,
        }
    }
}

/// Options passed along with a technology request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestOptions {
    /// Text shown to the user while the platform waits for a card.
    /// Only meaningful on iOS, where the system presents its own sheet.
    pub alert_message: String,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            alert_message: DEFAULT_ALERT_MESSAGE.to_owned(),
        }
    }
}

/// A delegate to communicate with the card outside.
///
/// Implementations wrap the NFC stack of a platform. All calls may block until the card
/// answers; cancelling a pending technology request is up to the implementation.
pub trait LinkProvider<Ctx>
where
    Ctx: Copy,
{
    /// Handle of an acquired technology session.
    type Link;

    /// Whatever the NFC stack reports about the active tag.
    type Tag;

    /// Requests the technology, waiting for a card to be presented.
    /// `Ok(None)` means the request completed without yielding a session.
    fn request_technology(
        &self,
        ctx: Ctx,
        kind: Technology,
        options: &RequestOptions,
    ) -> Result<Option<Self::Link>>;

    /// Reads the active tag. Must be called once after acquisition, before any command.
    fn get_tag(&self, ctx: Ctx, link: &Self::Link) -> Result<Self::Tag>;

    /// Transmits the command through ISO-DEP, then receives the raw response.
    fn transceive(&self, ctx: Ctx, link: &Self::Link, command: &[u8]) -> Result<Vec<u8>>;

    /// Transmits the command as a MIFARE command, then receives the raw response.
    fn send_mifare_command(&self, ctx: Ctx, link: &Self::Link, command: &[u8]) -> Result<Vec<u8>> {
        self.transceive(ctx, link, command)
    }

    /// Cancels the technology request and unregisters any pending tag event.
    /// Called once per session whether or not a link was acquired.
    fn release(&self, ctx: Ctx, link: Option<Self::Link>) -> Result<()>;
}
