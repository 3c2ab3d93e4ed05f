use crate::apdu::{self, ApduCommand};
use crate::nfc::{self, Exchange, LinkProvider, Platform, RequestOptions};
use crate::reading::CardReading;
use crate::value::{self, Value};
use crate::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Request NFC technology failed: {0}")]
    Acquisition(#[source] nfc::Error),

    #[error("The technology request yielded no link")]
    NoLink,

    #[error("Reading the active tag failed: {0}")]
    Tag(#[source] nfc::Error),

    #[error("{0} response was not valid")]
    InvalidResponse(&'static str),
}

/// Progress of a session through the protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Idle,
    TechnologyRequested,
    ApplicationSelected,
    BalanceRead,
    TransactionRead,
    Failed,
}

/// Configuration injected into a session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Config {
    pub platform: Platform,
    pub options: RequestOptions,
}

impl Config {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            options: RequestOptions::default(),
        }
    }

    /// Replaces the prompt shown while waiting for the card.
    pub fn with_alert_message(mut self, alert_message: impl Into<String>) -> Self {
        self.options.alert_message = alert_message.into();
        self
    }
}

/// A single read of the card through the provider, owning the link while it lasts.
///
/// Once the technology has been requested, the provider is asked to release it exactly once:
/// by [`Self::release`], or when the session is dropped without it, e.g. while unwinding.
pub struct CardSession<'a, P, Ctx>
where
    P: LinkProvider<Ctx>,
    Ctx: Copy,
{
    provider: &'a P,
    config: &'a Config,
    link: Option<P::Link>,
    state: State,
    // Context to release with, set once the technology was requested.
    pending_release: Option<Ctx>,
}

impl<'a, P, Ctx> CardSession<'a, P, Ctx>
where
    P: LinkProvider<Ctx>,
    Ctx: Copy,
{
    pub fn new(provider: &'a P, config: &'a Config) -> Self {
        Self {
            provider,
            config,
            link: None,
            state: State::Idle,
            pending_release: None,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Runs the whole protocol, stopping at the first failure.
    /// The link stays acquired; call [`Self::release`] afterwards.
    pub fn run(&mut self, ctx: Ctx) -> Result<CardReading, Error> {
        self.request_technology(ctx)?;
        self.select_application(ctx)?;
        let balance = self.read_balance(ctx)?;

        Ok(self.read_last_transaction(ctx, &balance))
    }

    /// Requests the platform technology, then reads the active tag.
    pub fn request_technology(&mut self, ctx: Ctx) -> Result<(), Error> {
        let kind = self.config.platform.technology();
        debug!(?kind, "Requesting NFC technology");
        self.pending_release = Some(ctx);

        let link = match self
            .provider
            .request_technology(ctx, kind, &self.config.options)
        {
            Ok(Some(link)) => link,
            Ok(None) => return Err(self.fail(Error::NoLink)),
            Err(e) => return Err(self.fail(Error::Acquisition(e))),
        };

        // The link is unusable for commands until the tag has been read once.
        if let Err(e) = self.provider.get_tag(ctx, &link) {
            self.link = Some(link);
            return Err(self.fail(Error::Tag(e)));
        }

        self.link = Some(link);
        self.state = State::TechnologyRequested;

        Ok(())
    }

    /// Selects the application containing the balance and the last transaction.
    pub fn select_application(&mut self, ctx: Ctx) -> Result<(), Error> {
        self.send_valid(ctx, ApduCommand::SelectApplication)?;
        self.state = State::ApplicationSelected;

        Ok(())
    }

    /// Reads the current balance.
    pub fn read_balance(&mut self, ctx: Ctx) -> Result<Value, Error> {
        let response = self.send_valid(ctx, ApduCommand::ReadBalance)?;
        let balance = value::decode(&apdu::field(&response, apdu::BALANCE_FIELD));
        self.state = State::BalanceRead;

        debug!(%balance, "Read the current balance");

        Ok(balance)
    }

    /// Reads the last transaction and completes the reading.
    /// Falls back to a reading with the balance only, as the balance is already known.
    pub fn read_last_transaction(&mut self, ctx: Ctx, balance: &Value) -> CardReading {
        match self.send_valid(ctx, ApduCommand::ReadLastTransaction) {
            Ok(response) => {
                let last_transaction =
                    value::decode(&apdu::field(&response, apdu::TRANSACTION_FIELD));
                self.state = State::TransactionRead;

                CardReading::new(balance, &last_transaction)
            }
            Err(_) => {
                warn!("LastTransactionResponse was not valid");
                self.state = State::TransactionRead;

                CardReading::balance_only(balance)
            }
        }
    }

    /// Hands the link back to the provider. Consumes the session so this happens exactly once.
    pub fn release(mut self, ctx: Ctx) -> nfc::Result<()> {
        info!("Clean up");
        self.pending_release = None;

        self.provider.release(ctx, self.link.take())
    }

    fn send_valid(&mut self, ctx: Ctx, command: ApduCommand) -> Result<Vec<u8>, Error> {
        match self.send(ctx, command) {
            Some(response) if apdu::is_valid_response(Some(&response)) => Ok(response),
            _ => Err(self.fail(Error::InvalidResponse(command.name()))),
        }
    }

    /// Sends the command through the mechanism of the platform.
    /// Transport errors are reported as an absent response.
    fn send(&self, ctx: Ctx, command: ApduCommand) -> Option<Vec<u8>> {
        let link = self.link.as_ref()?;
        let tx = command.to_bytes();
        let result = match self.config.platform.exchange() {
            Exchange::Transceive => self.provider.transceive(ctx, link, &tx),
            Exchange::MifareCommand => self.provider.send_mifare_command(ctx, link, &tx),
        };

        match result {
            Ok(response) => Some(response),
            Err(e) => {
                warn!(command = command.name(), error = %e, "Sending the command failed");
                None
            }
        }
    }

    fn fail(&mut self, e: Error) -> Error {
        self.state = State::Failed;
        e
    }
}

impl<'a, P, Ctx> Drop for CardSession<'a, P, Ctx>
where
    P: LinkProvider<Ctx>,
    Ctx: Copy,
{
    fn drop(&mut self) {
        if let Some(ctx) = self.pending_release.take() {
            warn!(state = ?self.state, "Session dropped before release, cleaning up");

            if let Err(e) = self.provider.release(ctx, self.link.take()) {
                warn!(error = %e, "Clean up failed");
            }
        }
    }
}
