use crate::card::{CardSession, Config};
use crate::nfc::LinkProvider;
use crate::reading::CardReading;
use crate::{debug, warn};

/// Reads the balance and the last transaction from the card.
///
/// Runs one session through the provider and releases the link afterwards in any case,
/// even if the technology request itself failed or the provider panicked. Never fails: returns `None` if nothing
/// could be read, or a reading with [`CardReading::error`] set if only the balance could.
///
/// Callers must not start another read until this one returned.
///
/// ```rust,ignore
/// use mensacard::nfc::Platform;
/// use mensacard::{read_card_information, Config};
///
/// let config = Config::new(Platform::Ios).with_alert_message("Hold your card near the phone");
/// if let Some(reading) = read_card_information((), &provider, &config) {
///     println!("{}", reading.current_balance);
/// }
/// ```
pub fn read_card_information<P, Ctx>(ctx: Ctx, provider: &P, config: &Config) -> Option<CardReading>
where
    P: LinkProvider<Ctx>,
    Ctx: Copy,
{
    let mut session = CardSession::new(provider, config);
    let reading = match session.run(ctx) {
        Ok(reading) => Some(reading),
        Err(e) => {
            warn!(error = %e, state = ?session.state(), "get card information failed");
            None
        }
    };

    match session.release(ctx) {
        Ok(()) => debug!("Released the NFC technology"),
        Err(e) => warn!(error = %e, "Clean up failed"),
    }

    reading
}
